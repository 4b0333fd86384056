use serde::Deserialize;

/// Gameplay tuning for what the player can reach and what serving pays.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    /// Reach for picking up, placing and pressing.
    pub ray_distance: f32,

    /// Reach for serving a held cup to a customer.
    pub throw_distance: f32,

    /// Distance in front of the camera a held object floats at.
    pub hold_distance: f32,

    /// Earnings credited per served cup.
    pub serve_reward: u32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            ray_distance: 2.0,
            throw_distance: 4.0,
            hold_distance: 0.5,
            serve_reward: 100,
        }
    }
}
