use super::{Precondition, RevertPolicy, Scenario, ScenarioDescriptor, ScenarioId, ScenarioProgress};
use crate::domain::math::{Quat, Transform, Vec3, delta_angle};
use crate::domain::ports::{ObjectId, Stage};
use crate::domain::signal::Signal;
use crate::domain::tuning::ScenarioTuning;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stalk {
    Idle,
    /// Lurker is standing behind the player; waiting for them to turn.
    Watching { baseline_yaw: f32 },
    /// Apparition is gliding from in front of the camera back to the lurker's spot.
    Returning { position: Vec3 },
    Done,
}

/// A figure waits behind the player. Once the player turns far enough it
/// jumps in front of the camera, then drifts back to where it stood.
pub struct BehindTheBack {
    lurker: ObjectId,
    apparition: ObjectId,
    tuning: ScenarioTuning,
    rest: Transform,
    stalk: Stalk,
}

impl BehindTheBack {
    pub fn new(lurker: ObjectId, apparition: ObjectId, tuning: ScenarioTuning) -> Self {
        Self {
            lurker,
            apparition,
            tuning,
            rest: Transform::default(),
            stalk: Stalk::Idle,
        }
    }

    fn jump_in_front(&mut self, stage: &Stage) {
        let eye = stage.camera.position();
        let spawn =
            eye + stage.camera.forward() * self.tuning.front_distance + self.tuning.spawn_offset;
        let facing = Quat::look_rotation(eye - spawn);

        stage.scene.set_visible(self.lurker, false);
        stage.scene.set_transform(
            self.apparition,
            Transform {
                position: spawn,
                rotation: facing,
                scale: self.rest.scale,
            },
        );
        stage.scene.set_visible(self.apparition, true);
        self.stalk = Stalk::Returning { position: spawn };
        info!(x = spawn.x, y = spawn.y, z = spawn.z, "apparition in front of the player");
    }

    fn glide_back(&mut self, position: Vec3, dt: f32, stage: &Stage) -> ScenarioProgress {
        let next = position.lerp(self.rest.position, self.tuning.return_speed * dt);
        if let Some(current) = stage.scene.transform(self.apparition) {
            stage.scene.set_transform(
                self.apparition,
                Transform {
                    position: next,
                    ..current
                },
            );
        }

        if next.distance(self.rest.position) < self.tuning.return_epsilon {
            debug!("apparition back in place");
            self.stalk = Stalk::Done;
            return ScenarioProgress::Finished;
        }
        self.stalk = Stalk::Returning { position: next };
        ScenarioProgress::Running
    }
}

impl Scenario for BehindTheBack {
    fn descriptor(&self) -> ScenarioDescriptor {
        ScenarioDescriptor {
            id: ScenarioId::BehindTheBack,
            precondition: Precondition::None,
            cooldown: 0.0,
            exclusivity_group: "horror",
        }
    }

    fn reset(&mut self, stage: &Stage) {
        stage.scene.set_visible(self.lurker, false);
        stage.scene.set_visible(self.apparition, false);
        self.stalk = Stalk::Idle;
    }

    fn activation_intents(&self) -> &'static [Signal] {
        &[
            Signal::MusicValueUp,
            Signal::TurnOffRelaxMusic,
            Signal::CafeNoiseVolumeDown,
        ]
    }

    fn revert_intents(&self) -> &'static [Signal] {
        &[
            Signal::TurnOnRelaxMusic,
            Signal::MusicValueDown,
            Signal::CafeNoiseVolumeUp,
        ]
    }

    fn enter(&mut self, stage: &Stage) {
        self.rest = stage.scene.transform(self.lurker).unwrap_or_default();
        stage.scene.set_visible(self.lurker, true);
        let baseline_yaw = stage.camera.yaw_degrees();
        self.stalk = Stalk::Watching { baseline_yaw };
        debug!(baseline_yaw, "lurker behind the player");
    }

    fn revert_policy(&self) -> RevertPolicy {
        RevertPolicy::OnCompletion {
            timeout: self.tuning.watch_timeout,
        }
    }

    fn tick(&mut self, dt: f32, stage: &Stage) -> ScenarioProgress {
        match self.stalk {
            Stalk::Idle => ScenarioProgress::Waiting,
            Stalk::Watching { baseline_yaw } => {
                let turned = delta_angle(baseline_yaw, stage.camera.yaw_degrees()).abs();
                if turned > self.tuning.rotation_threshold {
                    self.jump_in_front(stage);
                    ScenarioProgress::Running
                } else {
                    ScenarioProgress::Waiting
                }
            }
            Stalk::Returning { position } => self.glide_back(position, dt, stage),
            Stalk::Done => ScenarioProgress::Finished,
        }
    }

    fn exit(&mut self, stage: &Stage) {
        stage.scene.set_visible(self.lurker, false);
        stage.scene.set_visible(self.apparition, false);
        stage.scene.set_transform(self.apparition, self.rest);
        self.stalk = Stalk::Idle;
    }
}
