// Shared fixtures for the integration tests: a standard headless cafe plus
// handles to the adapters behind it.
#![allow(dead_code)]

use horror_cafe::domain::ports::{ObjectId, Stage};
use horror_cafe::domain::signal::{Signal, SignalBus};
use horror_cafe::domain::tuning::CafeTuning;
use horror_cafe::interface_adapters::headless::{
    EYE_POSITION, HeadlessWorld, RecordingAudio, ScriptedCamera, furnish_standard_cafe,
};
use horror_cafe::interface_adapters::utils::rng::SeededRandom;
use horror_cafe::use_cases::{Cafe, InputEvent};
use std::cell::Cell;
use std::rc::Rc;

pub struct TestCafe {
    pub world: Rc<HeadlessWorld>,
    pub camera: Rc<ScriptedCamera>,
    pub audio: Rc<RecordingAudio>,
    pub cafe: Cafe,
}

impl TestCafe {
    pub fn new(tuning: CafeTuning, seed: u64) -> Self {
        let world = Rc::new(HeadlessWorld::new());
        let layout = furnish_standard_cafe(&world);
        let camera = Rc::new(ScriptedCamera::new(EYE_POSITION));
        let audio = Rc::new(RecordingAudio::new());
        let stage = Stage {
            scene: world.clone(),
            physics: world.clone(),
            camera: camera.clone(),
            random: Rc::new(SeededRandom::new(seed)),
            audio: Some(audio.clone()),
        };
        let cafe = Cafe::new(stage, layout, tuning);
        Self {
            world,
            camera,
            audio,
            cafe,
        }
    }

    pub fn look_at(&self, object: ObjectId) {
        let target = self.world.position(object).expect("object exists");
        self.camera.look_at(target);
    }

    /// Looks at `object` and presses "use" within one tick.
    pub fn interact_with(&mut self, object: ObjectId, dt: f32) {
        self.look_at(object);
        self.cafe.tick(dt, &[InputEvent::Interact]);
    }

    /// Ticks `count` times with no input.
    pub fn idle(&mut self, dt: f32, count: usize) {
        for _ in 0..count {
            self.cafe.tick(dt, &[]);
        }
    }
}

/// Counts deliveries of `signal`.
pub fn count(bus: &SignalBus, signal: Signal) -> Rc<Cell<u32>> {
    let hits = Rc::new(Cell::new(0));
    let hits_in = hits.clone();
    bus.subscribe(signal, move || hits_in.set(hits_in.get() + 1));
    hits
}

/// Tuning with only the scenarios named enabled and a custom interval.
pub fn only_scenarios(interval: f32, guest: bool, behind: bool, thing: bool) -> CafeTuning {
    let mut tuning = CafeTuning::default();
    tuning.scenarios.interval = interval;
    tuning.scenarios.guest_replacement = guest;
    tuning.scenarios.behind_the_back = behind;
    tuning.scenarios.thing_from_the_back = thing;
    tuning
}
