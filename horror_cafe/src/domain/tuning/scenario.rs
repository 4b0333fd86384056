use crate::domain::math::Vec3;
use serde::Deserialize;

/// Gameplay tuning for the horror scenarios and their arbiter.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScenarioTuning {
    /// Seconds between scenario selections.
    pub interval: f32,

    /// Which scenarios take part in selection.
    pub guest_replacement: bool,
    pub behind_the_back: bool,
    pub thing_from_the_back: bool,

    /// Seconds the monsters stay before the guests come back.
    pub guest_revert_delay: f32,

    /// Seconds the thing stays visible.
    pub thing_hide_delay: f32,

    /// The thing shows up on a 1-in-`thing_odds` roll.
    pub thing_odds: i32,

    /// Yaw, in degrees, the player must turn before the lurker appears.
    pub rotation_threshold: f32,

    /// Distance in front of the camera the lurker appears at.
    pub front_distance: f32,

    /// Offset added to the apparition's spawn point.
    pub spawn_offset: Vec3,

    /// Damping rate of the apparition's return to its rest pose.
    pub return_speed: f32,

    /// Distance under which the apparition counts as returned.
    pub return_epsilon: f32,

    /// Seconds to wait for the player to turn around before giving up.
    pub watch_timeout: f32,
}

impl Default for ScenarioTuning {
    fn default() -> Self {
        Self {
            interval: 60.0,
            guest_replacement: true,
            behind_the_back: true,
            thing_from_the_back: true,
            guest_revert_delay: 3.0,
            thing_hide_delay: 3.0,
            thing_odds: 4,
            rotation_threshold: 90.0,
            front_distance: 3.0,
            spawn_offset: Vec3::new(0.6, -1.0, 0.0),
            return_speed: 5.0,
            return_epsilon: 0.1,
            watch_timeout: 30.0,
        }
    }
}
