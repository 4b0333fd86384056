// Coffee machine: a two-state machine that runs for a fixed time once started.

use crate::domain::ports::{Color, ObjectId, SoundId, Stage};
use crate::domain::shared::{Shared, with_weak};
use crate::domain::signal::{Signal, SignalBus};
use crate::domain::state_machine::{StateHandler, StateMachine};
use crate::domain::timer::{Scheduler, TimerSlot};
use crate::domain::tuning::CoffeeTuning;
use crate::use_cases::paper_cup::CupSlot;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoffeeMachineState {
    Idle,
    Working,
}

/// Entry actions for the machine: lamp colour, motor sound, brewing and the
/// shutoff timer.
pub struct MachineRoom {
    machine: Weak<RefCell<CoffeeMachine>>,
    bus: SignalBus,
    scheduler: Scheduler,
    stage: Stage,
    lamp: ObjectId,
    slot: Shared<CupSlot>,
    tuning: CoffeeTuning,
    working: bool,
    shutoff: TimerSlot,
    activations: u32,
}

impl MachineRoom {
    fn enter_working(&mut self) {
        self.working = true;
        self.stage.scene.set_color(self.lamp, Color::GREEN);
        self.stage.play_sound(SoundId::CoffeeMachine);
        self.brew_cup_in_place();

        let machine = self.machine.clone();
        self.shutoff.rearm(
            &self.scheduler,
            self.tuning.working_time,
            "coffee-shutoff",
            move || {
                with_weak(&machine, "coffee-shutoff", CoffeeMachine::finish_work);
            },
        );

        self.activations += 1;
        info!(activations = self.activations, "coffee machine working");
        self.bus.publish(Signal::CoffeeMachineActivated);
    }

    fn enter_idle(&mut self) {
        self.working = false;
        self.shutoff.cancel(&self.scheduler);
        self.stage.scene.set_color(self.lamp, Color::RED);
        self.stage.stop_sound(SoundId::CoffeeMachine);
        info!("coffee machine idle");
    }

    fn brew_cup_in_place(&self) {
        let Ok(slot) = self.slot.try_borrow() else {
            debug!("cup slot busy; no brew this time");
            return;
        };
        match slot.cup() {
            Some(cup) => {
                if let Ok(mut cup) = cup.try_borrow_mut() {
                    cup.start_brew();
                }
            }
            None => debug!("no cup under the spout"),
        }
    }
}

impl StateHandler<CoffeeMachineState> for MachineRoom {
    fn handle_state_change(&mut self, new_state: CoffeeMachineState) {
        match new_state {
            CoffeeMachineState::Idle => self.enter_idle(),
            CoffeeMachineState::Working => self.enter_working(),
        }
    }
}

pub struct CoffeeMachine {
    fsm: StateMachine<CoffeeMachineState, MachineRoom>,
}

impl CoffeeMachine {
    /// Builds the machine in `Idle` with a red lamp and starts listening for
    /// the coffee button.
    pub fn new(
        bus: SignalBus,
        scheduler: Scheduler,
        stage: Stage,
        lamp: ObjectId,
        slot: Shared<CupSlot>,
        tuning: CoffeeTuning,
    ) -> Shared<CoffeeMachine> {
        stage.scene.set_color(lamp, Color::RED);

        let machine = Rc::new_cyclic(|weak: &Weak<RefCell<CoffeeMachine>>| {
            let room = MachineRoom {
                machine: weak.clone(),
                bus: bus.clone(),
                scheduler,
                stage,
                lamp,
                slot,
                tuning,
                working: false,
                shutoff: TimerSlot::default(),
                activations: 0,
            };
            RefCell::new(CoffeeMachine {
                fsm: StateMachine::new(|| CoffeeMachineState::Idle, room),
            })
        });

        let weak = Rc::downgrade(&machine);
        bus.subscribe(Signal::CoffeeButtonPressed, move || {
            with_weak(&weak, "coffee-button", |m| {
                m.start_coffee();
            });
        });

        machine
    }

    pub fn state(&self) -> CoffeeMachineState {
        self.fsm.current()
    }

    pub fn is_working(&self) -> bool {
        self.fsm.handler().working
    }

    /// Number of `Idle -> Working` transitions so far.
    pub fn activations(&self) -> u32 {
        self.fsm.handler().activations
    }

    /// Starts the machine unless it is already running.
    pub fn start_coffee(&mut self) -> bool {
        if self.is_working() {
            debug!("coffee machine already working; start ignored");
            return false;
        }
        self.fsm.set_state(CoffeeMachineState::Working)
    }

    /// Flips between the two states. Ignored while a run is in progress; the
    /// machine only leaves `Working` through its shutoff timer.
    pub fn toggle_state(&mut self) -> bool {
        if self.is_working() {
            debug!("coffee machine working; toggle ignored");
            return false;
        }
        let next = match self.fsm.current() {
            CoffeeMachineState::Idle => CoffeeMachineState::Working,
            CoffeeMachineState::Working => CoffeeMachineState::Idle,
        };
        self.fsm.set_state(next)
    }

    fn finish_work(&mut self) {
        self.fsm.handler_mut().working = false;
        self.fsm.set_state(CoffeeMachineState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::shared;
    use crate::use_cases::test_support::StageFixture;
    use std::cell::Cell;

    fn machine_for(fixture: &StageFixture, slot: Shared<CupSlot>) -> Shared<CoffeeMachine> {
        CoffeeMachine::new(
            fixture.bus.clone(),
            fixture.scheduler.clone(),
            fixture.stage.clone(),
            fixture.layout.machine_lamp,
            slot,
            CoffeeTuning::default(),
        )
    }

    fn count(bus: &SignalBus, signal: Signal) -> Rc<Cell<u32>> {
        let hits = Rc::new(Cell::new(0));
        let hits_in = hits.clone();
        bus.subscribe(signal, move || hits_in.set(hits_in.get() + 1));
        hits
    }

    #[test]
    fn toggle_runs_then_reverts_on_its_own() {
        let fixture = StageFixture::new();
        let slot = shared(CupSlot::new(fixture.layout.cup_slot));
        let machine = machine_for(&fixture, slot);
        let activated = count(&fixture.bus, Signal::CoffeeMachineActivated);
        let lamp = fixture.layout.machine_lamp;

        assert_eq!(fixture.world.color(lamp), Some(Color::RED));
        assert!(machine.borrow_mut().toggle_state());
        assert_eq!(machine.borrow().state(), CoffeeMachineState::Working);
        assert_eq!(fixture.world.color(lamp), Some(Color::GREEN));

        for _ in 0..9 {
            fixture.scheduler.advance(1.0);
        }
        assert_eq!(machine.borrow().state(), CoffeeMachineState::Working);

        fixture.scheduler.advance(1.0);
        assert_eq!(machine.borrow().state(), CoffeeMachineState::Idle);
        assert!(!machine.borrow().is_working());
        assert_eq!(fixture.world.color(lamp), Some(Color::RED));
        assert_eq!(activated.get(), 1);
        assert_eq!(fixture.scheduler.pending_count(), 0);
    }

    #[test]
    fn toggle_and_start_are_ignored_while_working() {
        let fixture = StageFixture::new();
        let slot = shared(CupSlot::new(fixture.layout.cup_slot));
        let machine = machine_for(&fixture, slot);
        let activated = count(&fixture.bus, Signal::CoffeeMachineActivated);

        assert!(machine.borrow_mut().start_coffee());
        assert!(!machine.borrow_mut().start_coffee());
        assert!(!machine.borrow_mut().toggle_state());
        fixture.scheduler.advance(5.0);
        assert!(!machine.borrow_mut().toggle_state());

        assert_eq!(activated.get(), 1);
        assert_eq!(fixture.scheduler.pending_count(), 1);
    }

    #[test]
    fn machine_can_run_again_after_shutoff() {
        let fixture = StageFixture::new();
        let slot = shared(CupSlot::new(fixture.layout.cup_slot));
        let machine = machine_for(&fixture, slot);

        machine.borrow_mut().toggle_state();
        fixture.scheduler.advance(10.0);
        assert!(machine.borrow_mut().toggle_state());

        assert_eq!(machine.borrow().activations(), 2);
        assert_eq!(fixture.audio.play_count(SoundId::CoffeeMachine), 2);
        assert_eq!(fixture.audio.stopped(), vec![SoundId::CoffeeMachine]);
    }

    #[test]
    fn button_signal_starts_the_machine_and_brews_the_cup_in_place() {
        let fixture = StageFixture::new();
        let slot = shared(CupSlot::new(fixture.layout.cup_slot));
        let cup = shared(fixture.cup(0));
        slot.borrow_mut().cup_entered(cup.clone());
        let machine = machine_for(&fixture, slot);

        fixture.bus.publish(Signal::CoffeeButtonPressed);

        assert!(machine.borrow().is_working());
        assert!(cup.borrow().is_brewing());
    }

    #[test]
    fn missing_audio_sink_does_not_stop_the_machine() {
        let fixture = StageFixture::without_audio();
        let slot = shared(CupSlot::new(fixture.layout.cup_slot));
        let machine = machine_for(&fixture, slot);

        assert!(machine.borrow_mut().toggle_state());
        fixture.scheduler.advance(10.0);

        assert_eq!(machine.borrow().state(), CoffeeMachineState::Idle);
    }
}
