// The cafe root. Builds every component around one signal bus and one
// scheduler, then drives them from a single `tick(dt, inputs)`.

use crate::domain::ports::Stage;
use crate::domain::shared::{Shared, shared};
use crate::domain::signal::SignalBus;
use crate::domain::timer::Scheduler;
use crate::domain::tuning::CafeTuning;
use crate::use_cases::attachment::Cap;
use crate::use_cases::audio::{Music, Sfx};
use crate::use_cases::coffee_machine::CoffeeMachine;
use crate::use_cases::interaction::{InteractionAction, InteractionDispatcher};
use crate::use_cases::light_switcher::LightSwitcher;
use crate::use_cases::paper_cup::{CupSlot, PaperCup};
use crate::use_cases::scenarios::{
    BehindTheBack, GuestReplacement, ScenarioArbiter, ThingFromTheBack,
};
use crate::use_cases::types::{CafeLayout, CafeSnapshot, InputEvent};
use std::rc::Rc;
use tracing::{debug, info};

pub struct Cafe {
    bus: SignalBus,
    scheduler: Scheduler,
    stage: Stage,
    layout: CafeLayout,
    lights: Shared<LightSwitcher>,
    _music: Rc<Music>,
    _sfx: Rc<Sfx>,
    slot: Shared<CupSlot>,
    cups: Vec<Shared<PaperCup>>,
    caps: Vec<Cap>,
    coffee_machine: Shared<CoffeeMachine>,
    dispatcher: InteractionDispatcher,
    arbiter: Shared<ScenarioArbiter>,
    tick: u64,
}

impl Cafe {
    pub fn new(stage: Stage, layout: CafeLayout, tuning: CafeTuning) -> Self {
        let bus = SignalBus::new();
        let scheduler = Scheduler::new();

        // Lights subscribe before the arbiter so a light-switch press turns
        // the lights back on before a scare paints them red.
        let lights = LightSwitcher::new(
            layout.lights.clone(),
            layout.light_switch,
            stage.clone(),
            bus.clone(),
            scheduler.clone(),
            tuning.lights,
        );
        let music = Music::new(&bus, stage.clone(), tuning.audio);
        let sfx = Sfx::new(&bus, stage.clone(), tuning.audio);

        let slot = shared(CupSlot::new(layout.cup_slot));
        let cups: Vec<Shared<PaperCup>> = layout
            .cups
            .iter()
            .map(|cup| shared(PaperCup::new(cup.clone(), tuning.coffee, stage.clone())))
            .collect();
        let caps = layout
            .caps
            .iter()
            .map(|cap| Cap::new(*cap, stage.clone(), tuning.attachment))
            .collect();

        let coffee_machine = CoffeeMachine::new(
            bus.clone(),
            scheduler.clone(),
            stage.clone(),
            layout.machine_lamp,
            slot.clone(),
            tuning.coffee,
        );
        let dispatcher = InteractionDispatcher::new(
            bus.clone(),
            stage.clone(),
            slot.clone(),
            cups.clone(),
            tuning.interaction,
        );

        let arbiter = ScenarioArbiter::new(
            bus.clone(),
            scheduler.clone(),
            stage.clone(),
            tuning.scenarios.interval,
        );
        {
            let scenarios = &tuning.scenarios;
            let mut arbiter = arbiter.borrow_mut();
            if scenarios.guest_replacement {
                arbiter.register(Box::new(GuestReplacement::new(
                    layout.normal_guests.clone(),
                    layout.scary_guests.clone(),
                    scenarios.guest_revert_delay,
                )));
            }
            if scenarios.behind_the_back {
                arbiter.register(Box::new(BehindTheBack::new(
                    layout.lurker,
                    layout.apparition,
                    *scenarios,
                )));
            }
            if scenarios.thing_from_the_back {
                arbiter.register(Box::new(ThingFromTheBack::new(
                    layout.thing,
                    scenarios.thing_odds,
                    scenarios.thing_hide_delay,
                )));
            }
            info!(scenarios = ?arbiter.registered(), "cafe open");
        }

        Self {
            bus,
            scheduler,
            stage,
            layout,
            lights,
            _music: music,
            _sfx: sfx,
            slot,
            cups,
            caps,
            coffee_machine,
            dispatcher,
            arbiter,
            tick: 0,
        }
    }

    /// Runs one frame. Due timers fire first, then the player's inputs, then
    /// the per-frame animations and the scenario arbiter.
    pub fn tick(&mut self, dt: f32, inputs: &[InputEvent]) -> Vec<InteractionAction> {
        let dt = dt.max(0.0);
        self.scheduler.advance(dt);

        let actions: Vec<InteractionAction> = inputs
            .iter()
            .filter_map(|input| self.dispatcher.handle(*input))
            .collect();
        self.dispatcher.carry();

        for cup in &self.cups {
            cup.borrow_mut().tick(dt);
        }
        for cap in &mut self.caps {
            cap.tick(dt, self.dispatcher.hands_mut(), &self.cups);
        }

        self.arbiter.borrow_mut().tick(dt);

        self.tick += 1;
        if !actions.is_empty() {
            debug!(tick = self.tick, ?actions, "player acted");
        }
        actions
    }

    pub fn snapshot(&self) -> CafeSnapshot {
        let machine = self.coffee_machine.borrow();
        let arbiter = self.arbiter.borrow();
        CafeSnapshot {
            tick: self.tick,
            elapsed: self.scheduler.now(),
            machine: machine.state(),
            lights_on: self.lights.borrow().is_on(),
            arbiter: arbiter.phase(),
            scenarios: arbiter.stats(),
            held: self.dispatcher.hands().held().map(|h| h.object),
            cups_filled: self
                .cups
                .iter()
                .filter(|c| c.borrow().is_fill_complete())
                .count(),
            caps_seated: self.caps.iter().filter(|c| c.is_seated()).count(),
            served: self.dispatcher.served(),
            earnings: self.dispatcher.earnings(),
            pending_timers: self.scheduler.pending_count(),
        }
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn layout(&self) -> &CafeLayout {
        &self.layout
    }

    pub fn lights(&self) -> &Shared<LightSwitcher> {
        &self.lights
    }

    pub fn coffee_machine(&self) -> &Shared<CoffeeMachine> {
        &self.coffee_machine
    }

    pub fn arbiter(&self) -> &Shared<ScenarioArbiter> {
        &self.arbiter
    }

    pub fn slot(&self) -> &Shared<CupSlot> {
        &self.slot
    }

    pub fn cups(&self) -> &[Shared<PaperCup>] {
        &self.cups
    }

    pub fn caps(&self) -> &[Cap] {
        &self.caps
    }

    pub fn dispatcher(&self) -> &InteractionDispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::coffee_machine::CoffeeMachineState;
    use crate::use_cases::scenarios::ArbiterPhase;
    use crate::use_cases::test_support::StageFixture;

    fn cafe_for(fixture: &StageFixture) -> Cafe {
        Cafe::new(
            fixture.stage.clone(),
            fixture.layout.clone(),
            CafeTuning::default(),
        )
    }

    #[test]
    fn fresh_cafe_is_calm() {
        let fixture = StageFixture::new();
        let cafe = cafe_for(&fixture);
        let snapshot = cafe.snapshot();

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.machine, CoffeeMachineState::Idle);
        assert!(snapshot.lights_on);
        assert_eq!(snapshot.arbiter, ArbiterPhase::Idle);
        assert_eq!(cafe.arbiter().borrow().registered().len(), 3);
        assert!(fixture
            .layout
            .scary_guests
            .iter()
            .all(|g| !fixture.world.is_visible(*g)));
    }

    #[test]
    fn disabled_scenarios_are_not_registered() {
        let fixture = StageFixture::new();
        let mut tuning = CafeTuning::default();
        tuning.scenarios.behind_the_back = false;
        tuning.scenarios.thing_from_the_back = false;
        let cafe = Cafe::new(fixture.stage.clone(), fixture.layout.clone(), tuning);

        assert_eq!(
            cafe.arbiter().borrow().registered(),
            vec![crate::use_cases::scenarios::ScenarioId::GuestReplacement]
        );
    }

    #[test]
    fn button_press_runs_the_machine_through_a_tick() {
        let fixture = StageFixture::new();
        let mut cafe = cafe_for(&fixture);
        fixture
            .camera
            .look_at(fixture.world.position(fixture.layout.coffee_button).unwrap_or_default());

        let actions = cafe.tick(0.016, &[InputEvent::Interact]);

        assert_eq!(actions, vec![InteractionAction::StartCoffee]);
        assert_eq!(cafe.snapshot().machine, CoffeeMachineState::Working);
        for _ in 0..11 {
            cafe.tick(1.0, &[]);
        }
        assert_eq!(cafe.snapshot().machine, CoffeeMachineState::Idle);
    }
}
