use super::{Precondition, RevertPolicy, Scenario, ScenarioDescriptor, ScenarioId};
use crate::domain::ports::{ObjectId, SoundId, Stage};
use crate::domain::signal::Signal;
use tracing::debug;

/// Sometimes shows something in the back room when the coffee machine starts.
pub struct ThingFromTheBack {
    thing: ObjectId,
    odds: i32,
    hide_delay: f32,
}

impl ThingFromTheBack {
    /// The thing appears on a 1-in-`odds` roll.
    pub fn new(thing: ObjectId, odds: i32, hide_delay: f32) -> Self {
        Self {
            thing,
            odds: odds.max(1),
            hide_delay,
        }
    }
}

impl Scenario for ThingFromTheBack {
    fn descriptor(&self) -> ScenarioDescriptor {
        ScenarioDescriptor {
            id: ScenarioId::ThingFromTheBack,
            precondition: Precondition::Signal(Signal::CoffeeMachineActivated),
            cooldown: 0.0,
            exclusivity_group: "horror",
        }
    }

    fn reset(&mut self, stage: &Stage) {
        stage.scene.set_visible(self.thing, false);
    }

    fn should_activate(&mut self, stage: &Stage) -> bool {
        let roll = stage.random.range_int(0, self.odds);
        debug!(roll, odds = self.odds, "thing roll");
        roll == 0
    }

    fn activation_intents(&self) -> &'static [Signal] {
        &[]
    }

    fn revert_intents(&self) -> &'static [Signal] {
        &[]
    }

    fn enter(&mut self, stage: &Stage) {
        stage.scene.set_visible(self.thing, true);
        stage.play_sound(SoundId::ThingFromTheBack);
    }

    fn revert_policy(&self) -> RevertPolicy {
        RevertPolicy::AfterDelay(self.hide_delay)
    }

    fn exit(&mut self, stage: &Stage) {
        stage.scene.set_visible(self.thing, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::StageFixture;

    #[test]
    fn only_a_zero_roll_lets_the_thing_out() {
        let fixture = StageFixture::new();
        let mut scenario = ThingFromTheBack::new(fixture.layout.thing, 4, 3.0);
        fixture.random.push_ints([3, 1, 2, 0]);

        let rolls: Vec<bool> = (0..4).map(|_| scenario.should_activate(&fixture.stage)).collect();

        assert_eq!(rolls, vec![false, false, false, true]);
    }

    #[test]
    fn enter_shows_and_exit_hides() {
        let fixture = StageFixture::new();
        let mut scenario = ThingFromTheBack::new(fixture.layout.thing, 4, 3.0);

        scenario.enter(&fixture.stage);
        assert!(fixture.world.is_visible(fixture.layout.thing));
        assert_eq!(fixture.audio.play_count(SoundId::ThingFromTheBack), 1);

        scenario.exit(&fixture.stage);
        assert!(!fixture.world.is_visible(fixture.layout.thing));
    }
}
