use serde::Deserialize;

/// Track volumes for the calm and tense moods.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AudioTuning {
    pub main_calm: f32,
    pub main_tense: f32,
    pub relax_on: f32,
    pub relax_off: f32,
    pub cafe_noise_up: f32,
    pub cafe_noise_down: f32,
}

impl Default for AudioTuning {
    fn default() -> Self {
        Self {
            main_calm: 0.1,
            main_tense: 0.5,
            relax_on: 0.1,
            relax_off: 0.0,
            cafe_noise_up: 0.6,
            cafe_noise_down: 0.15,
        }
    }
}
