// Horror scenarios and the arbiter that runs at most one of them at a time.

mod arbiter;
mod behind_the_back;
mod guest_replacement;
mod thing_from_the_back;

pub use arbiter::{ActivationOutcome, ArbiterPhase, ArbiterStats, RejectReason, ScenarioArbiter};
pub use behind_the_back::BehindTheBack;
pub use guest_replacement::GuestReplacement;
pub use thing_from_the_back::ThingFromTheBack;

use crate::domain::ports::Stage;
use crate::domain::signal::Signal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScenarioId {
    GuestReplacement,
    BehindTheBack,
    ThingFromTheBack,
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioId::GuestReplacement => "guest-replacement",
            ScenarioId::BehindTheBack => "behind-the-back",
            ScenarioId::ThingFromTheBack => "thing-from-the-back",
        };
        f.write_str(name)
    }
}

/// What an armed scenario waits for before it activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Activates as soon as it is armed.
    None,
    Signal(Signal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioDescriptor {
    pub id: ScenarioId,
    pub precondition: Precondition,
    /// Seconds after a revert before the scenario can be selected again.
    pub cooldown: f32,
    /// Scenarios sharing a group never overlap. The arbiter runs one scenario
    /// at a time, so today every group is exclusive with every other.
    pub exclusivity_group: &'static str,
}

/// How an active scenario comes to an end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevertPolicy {
    /// A single revert timer armed at activation.
    AfterDelay(f32),
    /// The scenario reports `Finished` from `tick`. If it is still `Waiting`
    /// after `timeout` seconds it is reverted anyway.
    OnCompletion { timeout: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioProgress {
    /// Nothing has happened yet.
    Waiting,
    /// An effect is in flight and must not be cut short.
    Running,
    Finished,
}

/// One kind of scare. The arbiter owns the lifecycle; implementations only
/// provide their intents and visuals.
pub trait Scenario {
    fn descriptor(&self) -> ScenarioDescriptor;

    /// Puts the scene into the scenario's baseline. Called on registration.
    fn reset(&mut self, _stage: &Stage) {}

    /// Published, in order, when the scenario is armed.
    fn arming_intents(&self) -> &'static [Signal] {
        &[]
    }

    /// Last say before activation. Declining leaves the scenario armed.
    fn should_activate(&mut self, _stage: &Stage) -> bool {
        true
    }

    /// Published, in order, before `enter`.
    fn activation_intents(&self) -> &'static [Signal];

    /// Published, in order, before `exit`.
    fn revert_intents(&self) -> &'static [Signal];

    fn enter(&mut self, stage: &Stage);

    fn revert_policy(&self) -> RevertPolicy;

    fn tick(&mut self, _dt: f32, _stage: &Stage) -> ScenarioProgress {
        ScenarioProgress::Running
    }

    /// Restores the baseline visuals.
    fn exit(&mut self, stage: &Stage);
}
