// Two-phase attachment animation and the cap that uses it to seat on a cup.
//
// The cap rises a little from where it was picked up, then damps towards the
// cup's snap anchor until it is close enough to snap exactly onto it.

use crate::domain::math::{Quat, Transform, Vec3};
use crate::domain::ports::{ObjectId, SoundId, Stage, Tag};
use crate::domain::shared::Shared;
use crate::domain::tuning::AttachmentTuning;
use crate::use_cases::paper_cup::PaperCup;
use crate::use_cases::types::Hands;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachPhase {
    Rising,
    Approaching,
    Done,
}

#[derive(Debug, Clone)]
pub struct AttachmentTask {
    source: ObjectId,
    start: Vec3,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    target: Transform,
    phase: AttachPhase,
    progress: f32,
    approach_distance: f32,
    speed: f32,
    rise_height: f32,
    epsilon: f32,
}

impl AttachmentTask {
    /// Starts an attachment of `source`, currently at `pose`, onto `target`.
    pub fn begin(
        source: ObjectId,
        pose: Transform,
        target: Transform,
        tuning: &AttachmentTuning,
    ) -> Self {
        Self {
            source,
            start: pose.position,
            position: pose.position,
            rotation: pose.rotation,
            scale: pose.scale,
            target,
            phase: AttachPhase::Rising,
            progress: 0.0,
            approach_distance: 0.0,
            speed: tuning.attach_speed,
            rise_height: tuning.rise_height,
            epsilon: tuning.snap_epsilon,
        }
    }

    pub fn source(&self) -> ObjectId {
        self.source
    }

    pub fn phase(&self) -> AttachPhase {
        self.phase
    }

    /// Progress through the current phase, `0.0..=1.0`. Never decreases within a phase.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> Transform {
        self.target
    }

    pub fn pose(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Advances the animation by `dt` seconds. A finished task no longer moves.
    pub fn step(&mut self, dt: f32) -> AttachPhase {
        match self.phase {
            AttachPhase::Rising => self.rise(dt),
            AttachPhase::Approaching => self.approach(dt),
            AttachPhase::Done => {}
        }
        self.phase
    }

    fn rise(&mut self, dt: f32) {
        self.progress = (self.progress + dt * self.speed).min(1.0);
        let raised = self.start + Vec3::UP * self.rise_height;
        self.position = self.start.lerp(raised, self.progress);

        if self.progress >= 1.0 {
            self.phase = AttachPhase::Approaching;
            self.progress = 0.0;
            self.approach_distance = self.position.distance(self.target.position);
            debug!(source = %self.source, distance = self.approach_distance, "attachment approaching");
        }
    }

    fn approach(&mut self, dt: f32) {
        let t = dt * self.speed;
        self.position = self.position.lerp(self.target.position, t);
        self.rotation = self.rotation.nlerp(self.target.rotation, t);

        let remaining = self.position.distance(self.target.position);
        if remaining < self.epsilon {
            self.position = self.target.position;
            self.rotation = self.target.rotation;
            self.progress = 1.0;
            self.phase = AttachPhase::Done;
            return;
        }

        if self.approach_distance > 0.0 {
            let covered = (1.0 - remaining / self.approach_distance).clamp(0.0, 1.0);
            self.progress = self.progress.max(covered);
        }
    }
}

/// A cup lid. Seats itself on a nearby cup once that cup is full.
pub struct Cap {
    object: ObjectId,
    stage: Stage,
    tuning: AttachmentTuning,
    task: Option<AttachmentTask>,
    cup: Option<Shared<PaperCup>>,
    seated: bool,
}

impl Cap {
    pub fn new(object: ObjectId, stage: Stage, tuning: AttachmentTuning) -> Self {
        Self {
            object,
            stage,
            tuning,
            task: None,
            cup: None,
            seated: false,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn task(&self) -> Option<&AttachmentTask> {
        self.task.as_ref()
    }

    pub fn is_attaching(&self) -> bool {
        self.task.as_ref().is_some_and(|t| t.phase() != AttachPhase::Done)
    }

    pub fn is_seated(&self) -> bool {
        self.seated
    }

    fn seated_rotation(&self) -> Quat {
        let [pitch, yaw, roll] = self.tuning.seated_rotation;
        Quat::from_euler_degrees(pitch, yaw, roll)
    }

    /// Runs one frame: either advances an attachment in flight, keeps a seated
    /// cap on its cup, or looks for a full cup within reach.
    pub fn tick(&mut self, dt: f32, hands: &mut Hands, cups: &[Shared<PaperCup>]) {
        if self.seated {
            self.follow_cup();
            return;
        }
        if self.task.is_some() {
            self.advance(dt);
            return;
        }
        self.look_for_cup(hands, cups);
    }

    fn advance(&mut self, dt: f32) {
        let Some(task) = self.task.as_mut() else {
            return;
        };
        let phase = task.step(dt);
        self.stage.scene.set_transform(self.object, task.pose());

        if phase == AttachPhase::Done {
            self.seated = true;
            self.stage.scene.set_interactable(self.object, false);
            info!(cap = %self.object, "cap seated");
        }
    }

    fn follow_cup(&self) {
        let Some(cup) = &self.cup else {
            return;
        };
        let Ok(cup) = cup.try_borrow() else {
            return;
        };
        self.stage
            .scene
            .set_transform(self.object, cup.snap_anchor(self.seated_rotation()));
    }

    fn look_for_cup(&mut self, hands: &mut Hands, cups: &[Shared<PaperCup>]) {
        let Some(pose) = self.stage.scene.transform(self.object) else {
            return;
        };
        let nearby = self
            .stage
            .physics
            .overlap_sphere(pose.position, self.tuning.overlap_radius);

        for collider in nearby.iter().filter(|c| c.tag == Tag::Glass) {
            let Some(cup) = cups
                .iter()
                .find(|cup| cup.try_borrow().is_ok_and(|c| c.object() == collider.object))
            else {
                continue;
            };
            let anchor = {
                let cup = cup.borrow();
                if !cup.is_fill_complete() {
                    // Only a full cup takes a lid.
                    continue;
                }
                cup.snap_anchor(self.seated_rotation())
            };

            // The cap leaves the player's hands in the same step it starts
            // moving, so it is never both held and attaching.
            hands.release_if(self.object);
            self.stage.scene.set_interactable(self.object, false);
            self.stage.play_sound(SoundId::CapAttach);
            self.task = Some(AttachmentTask::begin(self.object, pose, anchor, &self.tuning));
            self.cup = Some(cup.clone());
            info!(cap = %self.object, cup = %collider.object, "cap attaching");
            return;
        }
    }
}
