use super::{Precondition, RevertPolicy, Scenario, ScenarioDescriptor, ScenarioId, ScenarioProgress};
use crate::domain::ports::Stage;
use crate::domain::shared::{Shared, with_weak};
use crate::domain::signal::{Signal, SignalBus};
use crate::domain::timer::{Scheduler, TimerSlot};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Lifecycle of the single scenario slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArbiterPhase {
    Idle,
    Armed(ScenarioId),
    Active(ScenarioId),
    Reverting(ScenarioId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another scenario is active or reverting.
    Busy,
    /// The scenario is not the one currently armed.
    NotArmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated,
    /// The scenario chose not to run this time and stays armed.
    Declined,
    Rejected(RejectReason),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArbiterStats {
    pub selections: u32,
    pub activations: u32,
    pub reverts: u32,
    pub rejected: u32,
    pub declined: u32,
}

struct Entry {
    descriptor: ScenarioDescriptor,
    scenario: Box<dyn Scenario>,
    last_finished: Option<f64>,
}

/// Picks a scenario every interval and makes sure only one runs at a time.
///
/// The phase guard is always updated before any signal is published, so a
/// listener that re-enters the arbiter sees the new phase.
pub struct ScenarioArbiter {
    myself: Weak<RefCell<ScenarioArbiter>>,
    bus: SignalBus,
    scheduler: Scheduler,
    stage: Stage,
    entries: Vec<Entry>,
    subscribed: Vec<Signal>,
    phase: ArbiterPhase,
    interval: f32,
    countdown: f32,
    active_for: f32,
    revert_timer: TimerSlot,
    stats: ArbiterStats,
}

impl ScenarioArbiter {
    pub fn new(
        bus: SignalBus,
        scheduler: Scheduler,
        stage: Stage,
        interval: f32,
    ) -> Shared<ScenarioArbiter> {
        Rc::new_cyclic(|weak: &Weak<RefCell<ScenarioArbiter>>| {
            RefCell::new(ScenarioArbiter {
                myself: weak.clone(),
                bus,
                scheduler,
                stage,
                entries: Vec::new(),
                subscribed: Vec::new(),
                phase: ArbiterPhase::Idle,
                interval,
                countdown: interval,
                active_for: 0.0,
                revert_timer: TimerSlot::default(),
                stats: ArbiterStats::default(),
            })
        })
    }

    pub fn phase(&self) -> ArbiterPhase {
        self.phase
    }

    pub fn stats(&self) -> ArbiterStats {
        self.stats
    }

    /// Seconds until the next selection.
    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    pub fn active(&self) -> Option<ScenarioId> {
        match self.phase {
            ArbiterPhase::Active(id) => Some(id),
            _ => None,
        }
    }

    pub fn registered(&self) -> Vec<ScenarioId> {
        self.entries.iter().map(|e| e.descriptor.id).collect()
    }

    /// Adds a scenario for the rest of the session and resets its visuals.
    pub fn register(&mut self, mut scenario: Box<dyn Scenario>) {
        let descriptor = scenario.descriptor();
        if self.entries.iter().any(|e| e.descriptor.id == descriptor.id) {
            warn!(scenario = %descriptor.id, "scenario already registered");
            return;
        }
        scenario.reset(&self.stage);

        if let Precondition::Signal(signal) = descriptor.precondition {
            if !self.subscribed.contains(&signal) {
                let weak = self.myself.clone();
                self.bus.subscribe(signal, move || {
                    with_weak(&weak, "scenario-precondition", |arbiter| {
                        arbiter.precondition_met(signal);
                    });
                });
                self.subscribed.push(signal);
            }
        }

        debug!(scenario = %descriptor.id, "scenario registered");
        self.entries.push(Entry {
            descriptor,
            scenario,
            last_finished: None,
        });
    }

    /// Advances the active scenario and the selection countdown.
    pub fn tick(&mut self, dt: f32) {
        if let ArbiterPhase::Active(id) = self.phase {
            self.active_for += dt;
            self.tick_active(id, dt);
        }

        self.countdown -= dt;
        if self.countdown <= 0.0 {
            self.countdown = self.interval;
            self.select_next();
        }
    }

    fn tick_active(&mut self, id: ScenarioId, dt: f32) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.descriptor.id == id) else {
            return;
        };
        let progress = entry.scenario.tick(dt, &self.stage);
        let RevertPolicy::OnCompletion { timeout } = entry.scenario.revert_policy() else {
            return;
        };
        match progress {
            ScenarioProgress::Finished => {
                self.revert();
            }
            ScenarioProgress::Waiting if self.active_for >= timeout => {
                info!(scenario = %id, timeout, "scenario timed out");
                self.revert();
            }
            _ => {}
        }
    }

    /// Uniformly picks one scenario whose cooldown has passed and arms it.
    /// Skipped while a scenario is running.
    pub fn select_next(&mut self) -> Option<ScenarioId> {
        if matches!(
            self.phase,
            ArbiterPhase::Active(_) | ArbiterPhase::Reverting(_)
        ) {
            debug!(phase = ?self.phase, "selection skipped; scenario running");
            return None;
        }

        let now = self.scheduler.now();
        let eligible: Vec<ScenarioId> = self
            .entries
            .iter()
            .filter(|e| {
                e.last_finished
                    .is_none_or(|t| now - t >= f64::from(e.descriptor.cooldown))
            })
            .map(|e| e.descriptor.id)
            .collect();
        if eligible.is_empty() {
            debug!("no scenario eligible");
            return None;
        }

        let pick = self.stage.random.range_int(0, eligible.len() as i32) as usize;
        let id = *eligible.get(pick)?;
        self.arm(id).then_some(id)
    }

    /// Arms `id`, replacing any scenario armed before it. A scenario without a
    /// precondition activates straight away.
    pub fn arm(&mut self, id: ScenarioId) -> bool {
        if matches!(
            self.phase,
            ArbiterPhase::Active(_) | ArbiterPhase::Reverting(_)
        ) {
            info!(scenario = %id, phase = ?self.phase, "arming rejected; scenario running");
            return false;
        }
        let Some(index) = self.index_of(id) else {
            warn!(scenario = %id, "arming unknown scenario");
            return false;
        };

        if let ArbiterPhase::Armed(previous) = self.phase {
            debug!(scenario = %previous, "armed scenario replaced");
        }
        self.phase = ArbiterPhase::Armed(id);
        self.stats.selections += 1;
        info!(scenario = %id, "scenario armed");

        for signal in self.entries[index].scenario.arming_intents() {
            self.bus.publish(*signal);
        }

        if self.entries[index].descriptor.precondition == Precondition::None {
            self.activate(id);
        }
        true
    }

    /// Starts the armed scenario `id`.
    pub fn activate(&mut self, id: ScenarioId) -> ActivationOutcome {
        match self.phase {
            ArbiterPhase::Active(running) | ArbiterPhase::Reverting(running) => {
                self.stats.rejected += 1;
                info!(scenario = %id, %running, "activation rejected; scenario running");
                return ActivationOutcome::Rejected(RejectReason::Busy);
            }
            ArbiterPhase::Armed(armed) if armed == id => {}
            _ => {
                self.stats.rejected += 1;
                debug!(scenario = %id, phase = ?self.phase, "activation rejected; not armed");
                return ActivationOutcome::Rejected(RejectReason::NotArmed);
            }
        }
        let Some(index) = self.index_of(id) else {
            return ActivationOutcome::Rejected(RejectReason::NotArmed);
        };

        if !self.entries[index].scenario.should_activate(&self.stage) {
            self.stats.declined += 1;
            debug!(scenario = %id, "scenario declined; stays armed");
            return ActivationOutcome::Declined;
        }

        self.phase = ArbiterPhase::Active(id);
        self.active_for = 0.0;
        self.stats.activations += 1;
        info!(scenario = %id, "scenario activated");

        // Armed before anything runs, so a failing `enter` still ends in a revert.
        if let RevertPolicy::AfterDelay(delay) = self.entries[index].scenario.revert_policy() {
            let weak = self.myself.clone();
            self.revert_timer
                .rearm(&self.scheduler, delay, "scenario-revert", move || {
                    with_weak(&weak, "scenario-revert", |arbiter| {
                        arbiter.revert();
                    });
                });
        }

        self.bus.publish(Signal::ScenarioActivated);
        for signal in self.entries[index].scenario.activation_intents() {
            self.bus.publish(*signal);
        }
        self.entries[index].scenario.enter(&self.stage);
        ActivationOutcome::Activated
    }

    /// Ends the active scenario and restores the baseline. Returns `false` if
    /// nothing was active.
    pub fn revert(&mut self) -> bool {
        let ArbiterPhase::Active(id) = self.phase else {
            debug!(phase = ?self.phase, "revert ignored; nothing active");
            return false;
        };
        let Some(index) = self.index_of(id) else {
            return false;
        };

        self.phase = ArbiterPhase::Reverting(id);
        self.revert_timer.cancel(&self.scheduler);

        for signal in self.entries[index].scenario.revert_intents() {
            self.bus.publish(*signal);
        }
        self.entries[index].scenario.exit(&self.stage);
        self.bus.publish(Signal::ScenarioReverted);

        self.entries[index].last_finished = Some(self.scheduler.now());
        self.stats.reverts += 1;
        self.phase = ArbiterPhase::Idle;
        info!(scenario = %id, "scenario reverted");
        true
    }

    // Runs for the armed scenario, and for the running one too so that a
    // repeated trigger is counted and logged as a rejected activation.
    fn precondition_met(&mut self, signal: Signal) {
        let id = match self.phase {
            ArbiterPhase::Idle => return,
            ArbiterPhase::Armed(id) | ArbiterPhase::Active(id) | ArbiterPhase::Reverting(id) => id,
        };
        let matches = self
            .index_of(id)
            .is_some_and(|i| self.entries[i].descriptor.precondition == Precondition::Signal(signal));
        if matches {
            self.activate(id);
        }
    }

    fn index_of(&self, id: ScenarioId) -> Option<usize> {
        self.entries.iter().position(|e| e.descriptor.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::StageFixture;
    use std::cell::Cell;

    // Scenario that records its lifecycle and can be told to finish.
    struct Probe {
        id: ScenarioId,
        precondition: Precondition,
        policy: RevertPolicy,
        cooldown: f32,
        finish: Rc<Cell<bool>>,
        visible: Rc<Cell<bool>>,
    }

    impl Probe {
        fn new(id: ScenarioId, precondition: Precondition, policy: RevertPolicy) -> Self {
            Self {
                id,
                precondition,
                policy,
                cooldown: 0.0,
                finish: Rc::new(Cell::new(false)),
                visible: Rc::new(Cell::new(false)),
            }
        }
    }

    impl Scenario for Probe {
        fn descriptor(&self) -> ScenarioDescriptor {
            ScenarioDescriptor {
                id: self.id,
                precondition: self.precondition,
                cooldown: self.cooldown,
                exclusivity_group: "horror",
            }
        }

        fn activation_intents(&self) -> &'static [Signal] {
            &[Signal::MusicValueUp]
        }

        fn revert_intents(&self) -> &'static [Signal] {
            &[Signal::MusicValueDown]
        }

        fn enter(&mut self, _stage: &Stage) {
            self.visible.set(true);
        }

        fn revert_policy(&self) -> RevertPolicy {
            self.policy
        }

        fn tick(&mut self, _dt: f32, _stage: &Stage) -> ScenarioProgress {
            if self.finish.get() {
                ScenarioProgress::Finished
            } else {
                ScenarioProgress::Waiting
            }
        }

        fn exit(&mut self, _stage: &Stage) {
            self.visible.set(false);
        }
    }

    // Scenario whose `enter` always fails.
    struct Faulty;

    impl Scenario for Faulty {
        fn descriptor(&self) -> ScenarioDescriptor {
            ScenarioDescriptor {
                id: ScenarioId::GuestReplacement,
                precondition: Precondition::Signal(Signal::PlayerSwitchingLight),
                cooldown: 0.0,
                exclusivity_group: "horror",
            }
        }

        fn activation_intents(&self) -> &'static [Signal] {
            &[]
        }

        fn revert_intents(&self) -> &'static [Signal] {
            &[]
        }

        fn enter(&mut self, _stage: &Stage) {
            panic!("scene object missing");
        }

        fn revert_policy(&self) -> RevertPolicy {
            RevertPolicy::AfterDelay(3.0)
        }

        fn exit(&mut self, _stage: &Stage) {}
    }

    fn arbiter_for(fixture: &StageFixture) -> Shared<ScenarioArbiter> {
        ScenarioArbiter::new(
            fixture.bus.clone(),
            fixture.scheduler.clone(),
            fixture.stage.clone(),
            60.0,
        )
    }

    fn counter(bus: &SignalBus, signal: Signal) -> Rc<Cell<u32>> {
        let hits = Rc::new(Cell::new(0));
        let hits_in = hits.clone();
        bus.subscribe(signal, move || hits_in.set(hits_in.get() + 1));
        hits
    }

    #[test]
    fn signal_precondition_activates_and_timer_reverts_once() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        let probe = Probe::new(
            ScenarioId::GuestReplacement,
            Precondition::Signal(Signal::PlayerSwitchingLight),
            RevertPolicy::AfterDelay(3.0),
        );
        let visible = probe.visible.clone();
        arbiter.borrow_mut().register(Box::new(probe));
        let activated = counter(&fixture.bus, Signal::ScenarioActivated);
        let reverted = counter(&fixture.bus, Signal::ScenarioReverted);

        assert!(arbiter.borrow_mut().arm(ScenarioId::GuestReplacement));
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Armed(ScenarioId::GuestReplacement));

        fixture.bus.publish(Signal::PlayerSwitchingLight);
        assert!(visible.get());
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        assert_eq!(activated.get(), 1);

        fixture.scheduler.advance(3.0);
        assert!(!visible.get());
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
        assert_eq!(reverted.get(), 1);
        assert_eq!(fixture.scheduler.pending_count(), 0);
    }

    #[test]
    fn second_activation_is_rejected_while_active() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        arbiter.borrow_mut().register(Box::new(Probe::new(
            ScenarioId::ThingFromTheBack,
            Precondition::None,
            RevertPolicy::AfterDelay(3.0),
        )));
        arbiter.borrow_mut().register(Box::new(Probe::new(
            ScenarioId::GuestReplacement,
            Precondition::Signal(Signal::PlayerSwitchingLight),
            RevertPolicy::AfterDelay(3.0),
        )));

        assert!(arbiter.borrow_mut().arm(ScenarioId::ThingFromTheBack));
        assert_eq!(arbiter.borrow().active(), Some(ScenarioId::ThingFromTheBack));

        assert!(!arbiter.borrow_mut().arm(ScenarioId::GuestReplacement));
        assert_eq!(
            arbiter.borrow_mut().activate(ScenarioId::ThingFromTheBack),
            ActivationOutcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(arbiter.borrow_mut().select_next(), None);

        let stats = arbiter.borrow().stats();
        assert_eq!(stats.activations, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn activating_an_unarmed_scenario_is_rejected() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        arbiter.borrow_mut().register(Box::new(Probe::new(
            ScenarioId::GuestReplacement,
            Precondition::Signal(Signal::PlayerSwitchingLight),
            RevertPolicy::AfterDelay(3.0),
        )));

        assert_eq!(
            arbiter.borrow_mut().activate(ScenarioId::GuestReplacement),
            ActivationOutcome::Rejected(RejectReason::NotArmed)
        );
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
    }

    #[test]
    fn completion_policy_reverts_when_finished_or_timed_out() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        let probe = Probe::new(
            ScenarioId::BehindTheBack,
            Precondition::None,
            RevertPolicy::OnCompletion { timeout: 30.0 },
        );
        let finish = probe.finish.clone();
        arbiter.borrow_mut().register(Box::new(probe));

        arbiter.borrow_mut().arm(ScenarioId::BehindTheBack);
        arbiter.borrow_mut().tick(1.0);
        assert_eq!(arbiter.borrow().active(), Some(ScenarioId::BehindTheBack));
        finish.set(true);
        arbiter.borrow_mut().tick(1.0);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);

        finish.set(false);
        arbiter.borrow_mut().arm(ScenarioId::BehindTheBack);
        for _ in 0..29 {
            arbiter.borrow_mut().tick(1.0);
        }
        assert!(arbiter.borrow().active().is_some());
        arbiter.borrow_mut().tick(1.0);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
        assert_eq!(arbiter.borrow().stats().reverts, 2);
    }

    #[test]
    fn interval_selects_and_cooldown_filters() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        let mut probe = Probe::new(
            ScenarioId::ThingFromTheBack,
            Precondition::None,
            RevertPolicy::AfterDelay(3.0),
        );
        probe.cooldown = 100.0;
        arbiter.borrow_mut().register(Box::new(probe));

        arbiter.borrow_mut().tick(59.0);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
        arbiter.borrow_mut().tick(1.0);
        assert_eq!(arbiter.borrow().active(), Some(ScenarioId::ThingFromTheBack));

        fixture.scheduler.advance(3.0);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
        assert_eq!(arbiter.borrow_mut().select_next(), None);

        fixture.scheduler.advance(100.0);
        assert_eq!(
            arbiter.borrow_mut().select_next(),
            Some(ScenarioId::ThingFromTheBack)
        );
    }

    #[test]
    fn reentrant_precondition_during_activation_is_rejected() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        arbiter.borrow_mut().register(Box::new(Probe::new(
            ScenarioId::GuestReplacement,
            Precondition::Signal(Signal::PlayerSwitchingLight),
            RevertPolicy::AfterDelay(3.0),
        )));
        // A listener that re-raises the precondition from inside the activation.
        let bus = fixture.bus.clone();
        fixture
            .bus
            .subscribe(Signal::MusicValueUp, move || bus.publish(Signal::PlayerSwitchingLight));
        let activated = counter(&fixture.bus, Signal::ScenarioActivated);

        arbiter.borrow_mut().arm(ScenarioId::GuestReplacement);
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        fixture.scheduler.advance(3.0);

        assert_eq!(activated.get(), 1);
        assert_eq!(arbiter.borrow().stats().reverts, 1);
    }

    #[test]
    fn repeated_trigger_while_active_is_counted_as_rejected() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        arbiter.borrow_mut().register(Box::new(Probe::new(
            ScenarioId::GuestReplacement,
            Precondition::Signal(Signal::PlayerSwitchingLight),
            RevertPolicy::AfterDelay(3.0),
        )));

        arbiter.borrow_mut().arm(ScenarioId::GuestReplacement);
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        fixture.bus.publish(Signal::PlayerSwitchingLight);

        let stats = arbiter.borrow().stats();
        assert_eq!(stats.activations, 1);
        assert_eq!(stats.rejected, 2);

        // Unrelated signals are not activation attempts.
        fixture.bus.publish(Signal::CoffeeButtonPressed);
        assert_eq!(arbiter.borrow().stats().rejected, 2);
    }

    #[test]
    fn failing_enter_still_reverts_on_schedule() {
        let fixture = StageFixture::new();
        let arbiter = arbiter_for(&fixture);
        arbiter.borrow_mut().register(Box::new(Faulty));
        let reverted = counter(&fixture.bus, Signal::ScenarioReverted);

        arbiter.borrow_mut().arm(ScenarioId::GuestReplacement);
        fixture.bus.publish(Signal::PlayerSwitchingLight);
        assert_eq!(arbiter.borrow().active(), Some(ScenarioId::GuestReplacement));
        assert_eq!(fixture.scheduler.pending_count(), 1);

        fixture.scheduler.advance(3.0);
        assert_eq!(arbiter.borrow().phase(), ArbiterPhase::Idle);
        assert_eq!(reverted.get(), 1);
    }
}
