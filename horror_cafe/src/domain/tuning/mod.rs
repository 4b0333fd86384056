// Gameplay tuning. Keep this separate from runtime configuration (tick rate, seeds).

pub mod attachment;
pub mod audio;
pub mod coffee;
pub mod interaction;
pub mod lights;
pub mod scenario;

pub use attachment::AttachmentTuning;
pub use audio::AudioTuning;
pub use coffee::CoffeeTuning;
pub use interaction::InteractionTuning;
pub use lights::LightTuning;
pub use scenario::ScenarioTuning;

use serde::Deserialize;

/// Every tuning section the cafe is built from.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CafeTuning {
    pub scenarios: ScenarioTuning,
    pub coffee: CoffeeTuning,
    pub lights: LightTuning,
    pub attachment: AttachmentTuning,
    pub interaction: InteractionTuning,
    pub audio: AudioTuning,
}
