use super::{Precondition, RevertPolicy, Scenario, ScenarioDescriptor, ScenarioId};
use crate::domain::ports::{ObjectId, SoundId, Stage};
use crate::domain::signal::Signal;
use tracing::debug;

/// Swaps the dining guests for monsters once the player flips the light
/// switch back on, and swaps them back after a short delay.
pub struct GuestReplacement {
    normal: Vec<ObjectId>,
    scary: Vec<ObjectId>,
    revert_delay: f32,
}

impl GuestReplacement {
    pub fn new(normal: Vec<ObjectId>, scary: Vec<ObjectId>, revert_delay: f32) -> Self {
        Self {
            normal,
            scary,
            revert_delay,
        }
    }

    // Both sets always change together.
    fn show_monsters(&self, stage: &Stage, monsters: bool) {
        stage.set_all_visible(&self.normal, !monsters);
        stage.set_all_visible(&self.scary, monsters);
    }
}

impl Scenario for GuestReplacement {
    fn descriptor(&self) -> ScenarioDescriptor {
        ScenarioDescriptor {
            id: ScenarioId::GuestReplacement,
            precondition: Precondition::Signal(Signal::PlayerSwitchingLight),
            cooldown: 0.0,
            exclusivity_group: "horror",
        }
    }

    fn reset(&mut self, stage: &Stage) {
        self.show_monsters(stage, false);
    }

    fn arming_intents(&self) -> &'static [Signal] {
        &[Signal::TurnOffLight]
    }

    fn activation_intents(&self) -> &'static [Signal] {
        &[
            Signal::TurnAllLightsRed,
            Signal::MusicValueUp,
            Signal::CafeNoiseVolumeDown,
            Signal::TurnOffRelaxMusic,
        ]
    }

    fn revert_intents(&self) -> &'static [Signal] {
        &[
            Signal::TurnAllLightsWhite,
            Signal::MusicValueDown,
            Signal::CafeNoiseVolumeUp,
            Signal::TurnOnRelaxMusic,
        ]
    }

    fn enter(&mut self, stage: &Stage) {
        debug!(guests = self.normal.len(), "guests replaced");
        self.show_monsters(stage, true);
        stage.play_sound(SoundId::GuestScream);
    }

    fn revert_policy(&self) -> RevertPolicy {
        RevertPolicy::AfterDelay(self.revert_delay)
    }

    fn exit(&mut self, stage: &Stage) {
        debug!("guests restored");
        self.show_monsters(stage, false);
    }
}
