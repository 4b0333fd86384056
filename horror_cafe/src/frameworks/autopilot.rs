// Scripted player for the headless host. Points the camera and presses "use"
// the way a player working a shift would.

use crate::domain::ports::ObjectId;
use crate::domain::tuning::CoffeeTuning;
use crate::interface_adapters::headless::{HeadlessWorld, ScriptedCamera};
use crate::use_cases::types::{CafeLayout, InputEvent};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    LookAt(ObjectId),
    /// Turns the camera by this many degrees of yaw.
    Turn(f32),
    Interact,
    Wait(f32),
}

pub struct Autopilot {
    script: VecDeque<Step>,
    /// Replayed forever once the script runs out.
    idle: Vec<Step>,
    wait: f32,
}

impl Autopilot {
    pub fn new(script: impl IntoIterator<Item = Step>, idle: Vec<Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            idle,
            wait: 0.0,
        }
    }

    /// Brews, caps and serves each cup, plays with the lights, then idles
    /// behind the counter glancing over their shoulder now and then.
    pub fn coffee_shift(layout: &CafeLayout, coffee: &CoffeeTuning) -> Self {
        let mut script = Vec::new();
        for (i, cup) in layout.cups.iter().enumerate() {
            script.extend([
                Step::LookAt(cup.cup),
                Step::Interact,
                Step::LookAt(layout.cup_slot),
                Step::Interact,
                Step::LookAt(layout.coffee_button),
                Step::Interact,
                Step::Wait(coffee.working_time.max(coffee.brew_duration) + 0.5),
            ]);
            if let Some(cap) = layout.caps.get(i) {
                script.extend([
                    Step::LookAt(*cap),
                    Step::Interact,
                    Step::LookAt(cup.cup),
                    Step::Interact,
                    Step::Wait(1.0),
                ]);
            }
            script.extend([
                Step::LookAt(cup.cup),
                Step::Interact,
                Step::LookAt(layout.client),
                Step::Interact,
                Step::Wait(2.0),
            ]);
        }
        script.extend([
            Step::LookAt(layout.light_switch),
            Step::Interact,
            Step::Wait(3.0),
            Step::Interact,
            Step::Wait(1.0),
        ]);

        let idle = vec![
            Step::LookAt(layout.client),
            Step::Wait(20.0),
            Step::Turn(180.0),
            Step::Wait(2.0),
            Step::Turn(180.0),
            Step::Wait(10.0),
            Step::LookAt(layout.light_switch),
            Step::Interact,
            Step::Wait(2.0),
            Step::Interact,
        ];
        Self::new(script, idle)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Advances the script by `dt` and returns this tick's inputs. Camera
    /// moves apply immediately; at most one interaction happens per tick.
    pub fn next_inputs(
        &mut self,
        dt: f32,
        world: &HeadlessWorld,
        camera: &ScriptedCamera,
    ) -> Vec<InputEvent> {
        self.wait -= dt;
        if self.wait > 0.0 {
            return Vec::new();
        }
        self.wait = 0.0;

        // Bounded so an idle loop without waits cannot spin.
        for _ in 0..=self.idle.len().max(self.script.len()) {
            if self.script.is_empty() {
                if self.idle.is_empty() {
                    return Vec::new();
                }
                self.script.extend(self.idle.iter().copied());
            }
            let Some(step) = self.script.pop_front() else {
                break;
            };
            match step {
                Step::LookAt(target) => match world.position(target) {
                    Some(position) => camera.look_at(position),
                    None => tracing::warn!(%target, "autopilot target missing"),
                },
                Step::Turn(degrees) => camera.turn(degrees),
                Step::Interact => return vec![InputEvent::Interact],
                Step::Wait(seconds) => {
                    self.wait = seconds;
                    return Vec::new();
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CameraRig;
    use crate::interface_adapters::headless::{EYE_POSITION, furnish_standard_cafe};

    #[test]
    fn steps_run_until_the_next_interaction_or_wait() {
        let world = HeadlessWorld::new();
        let layout = furnish_standard_cafe(&world);
        let camera = ScriptedCamera::new(EYE_POSITION);
        let mut pilot = Autopilot::new(
            [
                Step::LookAt(layout.coffee_button),
                Step::Interact,
                Step::Wait(1.0),
                Step::Turn(90.0),
                Step::Interact,
            ],
            Vec::new(),
        );

        assert_eq!(pilot.next_inputs(0.1, &world, &camera), vec![InputEvent::Interact]);
        assert!(camera.yaw_degrees() > 0.0 && camera.yaw_degrees() < 90.0);

        assert!(pilot.next_inputs(0.1, &world, &camera).is_empty());
        assert!(pilot.next_inputs(0.5, &world, &camera).is_empty());
        let yaw = camera.yaw_degrees();
        assert_eq!(pilot.next_inputs(0.5, &world, &camera), vec![InputEvent::Interact]);
        assert!((camera.yaw_degrees() - (yaw + 90.0)).abs() < 1e-3);
        assert_eq!(pilot.remaining(), 0);
        assert!(pilot.next_inputs(1.0, &world, &camera).is_empty());
    }

    #[test]
    fn idle_loop_replays_after_the_script() {
        let world = HeadlessWorld::new();
        let camera = ScriptedCamera::new(EYE_POSITION);
        let mut pilot = Autopilot::new([Step::Interact], vec![Step::Turn(180.0), Step::Interact]);

        assert_eq!(pilot.next_inputs(0.1, &world, &camera), vec![InputEvent::Interact]);
        assert_eq!(pilot.next_inputs(0.1, &world, &camera), vec![InputEvent::Interact]);
        assert!((camera.yaw_degrees() - 180.0).abs() < 1e-3);
        assert_eq!(pilot.next_inputs(0.1, &world, &camera), vec![InputEvent::Interact]);
        assert!(camera.yaw_degrees().abs() < 1e-3);
    }
}
