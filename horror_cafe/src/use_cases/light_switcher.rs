// Ceiling lights, the wall switch, and the flicker loop that runs while the
// lights are on.

use crate::domain::math::Quat;
use crate::domain::ports::{Color, ObjectId, SoundId, Stage};
use crate::domain::shared::{Shared, with_weak};
use crate::domain::signal::{Signal, SignalBus};
use crate::domain::timer::{Scheduler, TimerSlot};
use crate::domain::tuning::LightTuning;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

pub struct LightSwitcher {
    myself: Weak<RefCell<LightSwitcher>>,
    lights: Vec<ObjectId>,
    lit: Vec<bool>,
    switch: ObjectId,
    stage: Stage,
    bus: SignalBus,
    scheduler: Scheduler,
    tuning: LightTuning,
    on: bool,
    color: Color,
    flicker: TimerSlot,
    flickers: u32,
}

impl LightSwitcher {
    /// Builds the switcher with every light on and the flicker loop running.
    pub fn new(
        lights: Vec<ObjectId>,
        switch: ObjectId,
        stage: Stage,
        bus: SignalBus,
        scheduler: Scheduler,
        tuning: LightTuning,
    ) -> Shared<LightSwitcher> {
        let switcher = Rc::new_cyclic(|weak: &Weak<RefCell<LightSwitcher>>| {
            RefCell::new(LightSwitcher {
                myself: weak.clone(),
                lit: vec![true; lights.len()],
                lights,
                switch,
                stage,
                bus: bus.clone(),
                scheduler,
                tuning,
                on: true,
                color: Color::WHITE,
                flicker: TimerSlot::default(),
                flickers: 0,
            })
        });

        {
            let mut s = switcher.borrow_mut();
            s.apply_all(true);
            s.set_all_white();
            s.schedule_flicker();
        }

        let routes: [(Signal, fn(&mut LightSwitcher)); 4] = [
            (Signal::TurnOffLight, LightSwitcher::switch_off),
            (Signal::TurnAllLightsRed, LightSwitcher::set_all_red),
            (Signal::TurnAllLightsWhite, LightSwitcher::set_all_white),
            (Signal::PlayerSwitchingLight, LightSwitcher::toggle),
        ];
        for (signal, action) in routes {
            let weak = Rc::downgrade(&switcher);
            bus.subscribe(signal, move || {
                with_weak(&weak, "light-switcher", action);
            });
        }

        switcher
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// How many lights are currently lit.
    pub fn lit_count(&self) -> usize {
        self.lit.iter().filter(|l| **l).count()
    }

    /// How many flickers have run so far.
    pub fn flickers(&self) -> u32 {
        self.flickers
    }

    pub fn switch_on(&mut self) {
        self.apply_all(true);
        self.tilt_switch(0.0);
        self.on = true;
        self.stage.play_sound(SoundId::LightSwitchOn);
        self.schedule_flicker();
        info!("lights on");
        self.bus.publish(Signal::LightsChanged);
    }

    pub fn switch_off(&mut self) {
        self.apply_all(false);
        self.tilt_switch(self.tuning.switch_off_tilt);
        self.on = false;
        self.flicker.cancel(&self.scheduler);
        self.stage.play_sound(SoundId::LightSwitchOff);
        info!("lights off");
        self.bus.publish(Signal::LightsChanged);
    }

    pub fn toggle(&mut self) {
        if self.on {
            self.switch_off();
        } else {
            self.switch_on();
        }
    }

    pub fn set_all_red(&mut self) {
        self.paint(Color::RED);
    }

    pub fn set_all_white(&mut self) {
        self.paint(Color::WHITE);
    }

    fn paint(&mut self, color: Color) {
        self.color = color;
        for light in &self.lights {
            self.stage.scene.set_color(*light, color);
        }
    }

    fn apply_all(&mut self, lit: bool) {
        for (light, state) in self.lights.iter().zip(self.lit.iter_mut()) {
            self.stage.scene.set_visible(*light, lit);
            *state = lit;
        }
    }

    fn tilt_switch(&self, pitch: f32) {
        if let Some(transform) = self.stage.scene.transform(self.switch) {
            let tilted = transform.with_rotation(Quat::from_euler_degrees(pitch, 0.0, 0.0));
            self.stage.scene.set_transform(self.switch, tilted);
        }
    }

    fn schedule_flicker(&mut self) {
        let weak = self.myself.clone();
        let random = self.stage.random.clone();
        self.flicker.rearm_random(
            &self.scheduler,
            self.tuning.min_flicker_interval,
            self.tuning.max_flicker_interval,
            random.as_ref(),
            "light-flicker",
            move || {
                with_weak(&weak, "light-flicker", LightSwitcher::flicker_once);
            },
        );
    }

    fn flicker_once(&mut self) {
        if !self.on || self.lights.is_empty() {
            return;
        }
        let random = &self.stage.random;
        let count = random
            .range_int(self.tuning.min_lights_to_switch as i32, self.lights.len() as i32)
            .max(0) as usize;
        for _ in 0..count {
            let index = random.range_int(0, self.lights.len() as i32) as usize;
            if let (Some(light), Some(state)) = (self.lights.get(index), self.lit.get_mut(index)) {
                *state = !*state;
                self.stage.scene.set_visible(*light, *state);
            }
        }
        self.flickers += 1;
        debug!(count, "lights flicker");

        let weak = self.myself.clone();
        self.flicker.rearm(
            &self.scheduler,
            self.tuning.flicker_blink,
            "light-flicker-restore",
            move || {
                with_weak(&weak, "light-flicker", LightSwitcher::end_flicker);
            },
        );
    }

    fn end_flicker(&mut self) {
        if !self.on {
            return;
        }
        self.apply_all(true);
        self.schedule_flicker();
    }
}
