use crate::domain::math::Vec3;
use serde::Deserialize;

/// Gameplay tuning for the coffee machine and the cup fill animation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CoffeeTuning {
    /// Seconds the machine stays in `Working` before dropping back to `Idle`.
    pub working_time: f32,

    /// Seconds for a cup to fill completely.
    pub brew_duration: f32,

    /// Local scale of the coffee surface when brewing starts and ends.
    pub coffee_start_scale: Vec3,
    pub coffee_end_scale: Vec3,

    /// Local position of the coffee surface when brewing starts and ends.
    pub coffee_start_position: Vec3,
    pub coffee_end_position: Vec3,
}

impl Default for CoffeeTuning {
    fn default() -> Self {
        Self {
            working_time: 10.0,
            brew_duration: 10.0,
            coffee_start_scale: Vec3::new(0.015_507_59, 0.002_295_122, 0.015_507_58),
            coffee_end_scale: Vec3::new(0.0185, 0.002_922_148, 0.0185),
            coffee_start_position: Vec3::new(0.0, 0.0, -0.009_62),
            coffee_end_position: Vec3::new(0.0, 0.0, 0.0155),
        }
    }
}
