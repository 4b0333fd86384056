use serde::Deserialize;

/// Gameplay tuning for the ceiling lights and their flicker loop.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LightTuning {
    /// Bounds, in seconds, of the random wait between flickers.
    pub min_flicker_interval: f32,
    pub max_flicker_interval: f32,

    /// How long flickered lights stay toggled before being restored.
    pub flicker_blink: f32,

    /// Lowest number of lights toggled by one flicker.
    pub min_lights_to_switch: usize,

    /// Tilt of the wall switch, in degrees, while the lights are off.
    pub switch_off_tilt: f32,
}

impl Default for LightTuning {
    fn default() -> Self {
        Self {
            min_flicker_interval: 10.0,
            max_flicker_interval: 50.0,
            flicker_blink: 0.1,
            min_lights_to_switch: 1,
            switch_off_tilt: 13.0,
        }
    }
}
