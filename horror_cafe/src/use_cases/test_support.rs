use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::domain::ports::{RandomSource, Stage};
use crate::domain::signal::SignalBus;
use crate::domain::timer::Scheduler;
use crate::domain::tuning::CoffeeTuning;
use crate::interface_adapters::headless::{
    EYE_POSITION, HeadlessWorld, RecordingAudio, ScriptedCamera, furnish_standard_cafe,
};
use crate::use_cases::paper_cup::PaperCup;
use crate::use_cases::types::CafeLayout;

// Random source that replays queued answers, then falls back to the range minimum.
#[derive(Default)]
pub(crate) struct ScriptedRandom {
    floats: RefCell<VecDeque<f32>>,
    ints: RefCell<VecDeque<i32>>,
}

impl ScriptedRandom {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_floats(values: impl IntoIterator<Item = f32>) -> Self {
        let random = Self::new();
        random.push_floats(values);
        random
    }

    pub(crate) fn with_ints(values: impl IntoIterator<Item = i32>) -> Self {
        let random = Self::new();
        random.push_ints(values);
        random
    }

    pub(crate) fn push_floats(&self, values: impl IntoIterator<Item = f32>) {
        self.floats.borrow_mut().extend(values);
    }

    pub(crate) fn push_ints(&self, values: impl IntoIterator<Item = i32>) {
        self.ints.borrow_mut().extend(values);
    }
}

impl RandomSource for ScriptedRandom {
    fn range_f32(&self, min: f32, max: f32) -> f32 {
        self.floats
            .borrow_mut()
            .pop_front()
            .map_or(min, |v| v.clamp(min, max.max(min)))
    }

    fn range_int(&self, min: i32, max_exclusive: i32) -> i32 {
        match self.ints.borrow_mut().pop_front() {
            Some(v) if v >= min && v < max_exclusive => v,
            _ => min,
        }
    }
}

// Standard cafe over the headless adapters, with handles kept for assertions.
pub(crate) struct StageFixture {
    pub world: Rc<HeadlessWorld>,
    pub camera: Rc<ScriptedCamera>,
    pub audio: Rc<RecordingAudio>,
    pub random: Rc<ScriptedRandom>,
    pub stage: Stage,
    pub layout: CafeLayout,
    pub bus: SignalBus,
    pub scheduler: Scheduler,
}

impl StageFixture {
    pub(crate) fn new() -> Self {
        let world = Rc::new(HeadlessWorld::new());
        let layout = furnish_standard_cafe(&world);
        let camera = Rc::new(ScriptedCamera::new(EYE_POSITION));
        let audio = Rc::new(RecordingAudio::new());
        let random = Rc::new(ScriptedRandom::new());
        let stage = Stage {
            scene: world.clone(),
            physics: world.clone(),
            camera: camera.clone(),
            random: random.clone(),
            audio: Some(audio.clone()),
        };

        Self {
            world,
            camera,
            audio,
            random,
            stage,
            layout,
            bus: SignalBus::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Same cafe with no audio sink attached.
    pub(crate) fn without_audio() -> Self {
        let mut fixture = Self::new();
        fixture.stage.audio = None;
        fixture
    }

    pub(crate) fn cup(&self, index: usize) -> PaperCup {
        PaperCup::new(
            self.layout.cups[index].clone(),
            CoffeeTuning::default(),
            self.stage.clone(),
        )
    }
}
