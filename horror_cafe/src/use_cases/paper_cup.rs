// Paper cups, their fill animation and the slot under the coffee machine.

use crate::domain::math::{Quat, Transform, Vec3};
use crate::domain::ports::{ObjectId, SoundId, Stage};
use crate::domain::shared::Shared;
use crate::domain::tuning::CoffeeTuning;
use crate::use_cases::types::CupLayout;
use tracing::{debug, info};

/// Progress of one cup filling up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoffeeBrewTask {
    pub elapsed: f32,
    pub duration: f32,
    pub done: bool,
}

impl CoffeeBrewTask {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            done: false,
        }
    }

    /// Fraction filled, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Advances the fill and returns the new progress.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.done {
            return 1.0;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.done = true;
        }
        self.progress()
    }
}

pub struct PaperCup {
    layout: CupLayout,
    tuning: CoffeeTuning,
    stage: Stage,
    brew: Option<CoffeeBrewTask>,
}

impl PaperCup {
    pub fn new(layout: CupLayout, tuning: CoffeeTuning, stage: Stage) -> Self {
        stage.scene.set_visible(layout.coffee, false);
        Self {
            layout,
            tuning,
            stage,
            brew: None,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.layout.cup
    }

    pub fn is_brewing(&self) -> bool {
        self.brew.is_some_and(|b| !b.done)
    }

    pub fn is_fill_complete(&self) -> bool {
        self.brew.is_some_and(|b| b.done)
    }

    pub fn brew(&self) -> Option<CoffeeBrewTask> {
        self.brew
    }

    /// Where a cap seats on this cup right now.
    pub fn snap_anchor(&self, seated_rotation: Quat) -> Transform {
        let position = self
            .stage
            .scene
            .transform(self.layout.cup)
            .map_or(Vec3::ZERO, |t| t.position);
        Transform::at(position + self.layout.snap_offset).with_rotation(seated_rotation)
    }

    /// Starts filling the cup. A cup fills at most once; later calls are ignored.
    pub fn start_brew(&mut self) -> bool {
        if self.brew.is_some() {
            debug!(cup = %self.layout.cup, "brew already started; ignored");
            return false;
        }
        self.brew = Some(CoffeeBrewTask::new(self.tuning.brew_duration));
        self.apply_fill(0.0);
        self.stage.scene.set_visible(self.layout.coffee, true);
        self.stage.play_sound(SoundId::CoffeeDrip);
        info!(cup = %self.layout.cup, "brewing started");
        true
    }

    pub fn tick(&mut self, dt: f32) {
        let Some(brew) = self.brew.as_mut() else {
            return;
        };
        let was_done = brew.done;
        let t = brew.advance(dt);
        let finished = brew.done;
        // Applied after completion too, so the coffee follows a carried cup.
        self.apply_fill(t);
        if finished && !was_done {
            info!(cup = %self.layout.cup, "coffee ready");
        }
    }

    fn apply_fill(&self, t: f32) {
        let cup_position = self
            .stage
            .scene
            .transform(self.layout.cup)
            .map_or(Vec3::ZERO, |c| c.position);
        let local = self
            .tuning
            .coffee_start_position
            .lerp(self.tuning.coffee_end_position, t);
        let scale = self.tuning.coffee_start_scale.lerp(self.tuning.coffee_end_scale, t);
        self.stage.scene.set_transform(
            self.layout.coffee,
            Transform {
                position: cup_position + local,
                rotation: Quat::IDENTITY,
                scale,
            },
        );
    }
}

/// Stand-in for the trigger volume under the spout: remembers which cup sits there.
pub struct CupSlot {
    anchor: ObjectId,
    cup: Option<Shared<PaperCup>>,
}

impl CupSlot {
    pub fn new(anchor: ObjectId) -> Self {
        Self { anchor, cup: None }
    }

    pub fn anchor(&self) -> ObjectId {
        self.anchor
    }

    pub fn cup(&self) -> Option<&Shared<PaperCup>> {
        self.cup.as_ref()
    }

    pub fn is_cup_in_place(&self) -> bool {
        self.cup.is_some()
    }

    pub fn cup_entered(&mut self, cup: Shared<PaperCup>) {
        debug!(cup = %cup.borrow().object(), "cup in place");
        self.cup = Some(cup);
    }

    /// Forgets the cup if it is the one in the slot.
    pub fn cup_exited(&mut self, cup: ObjectId) {
        if self.cup.as_ref().is_some_and(|c| c.borrow().object() == cup) {
            debug!(%cup, "cup left the slot");
            self.cup = None;
        }
    }
}
