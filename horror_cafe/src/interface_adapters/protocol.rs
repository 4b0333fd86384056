// Wire DTOs for cafe snapshots. The host logs these as JSON; nothing in the
// simulation depends on this shape.

use crate::use_cases::CafeSnapshot;
use crate::use_cases::coffee_machine::CoffeeMachineState;
use crate::use_cases::scenarios::{ArbiterPhase, ArbiterStats};
use serde::Serialize;

/// Flattened snapshot of the cafe for a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct CafeSnapshotDto {
    pub tick: u64,
    pub elapsed: f64,
    pub machine: CoffeeMachineState,
    pub lights_on: bool,
    pub scenario: ScenarioSlotDto,
    pub stats: ArbiterStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held: Option<u32>,
    pub cups_filled: usize,
    pub caps_seated: usize,
    pub served: u32,
    pub earnings: u32,
    pub pending_timers: usize,
}

impl From<&CafeSnapshot> for CafeSnapshotDto {
    fn from(snapshot: &CafeSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            elapsed: snapshot.elapsed,
            machine: snapshot.machine,
            lights_on: snapshot.lights_on,
            scenario: ScenarioSlotDto::from(snapshot.arbiter),
            stats: snapshot.scenarios,
            held: snapshot.held.map(|id| id.0),
            cups_filled: snapshot.cups_filled,
            caps_seated: snapshot.caps_seated,
            served: snapshot.served,
            earnings: snapshot.earnings,
            pending_timers: snapshot.pending_timers,
        }
    }
}

/// The arbiter slot as a phase name plus the scenario occupying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSlotDto {
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<ArbiterPhase> for ScenarioSlotDto {
    fn from(phase: ArbiterPhase) -> Self {
        let (name, id) = match phase {
            ArbiterPhase::Idle => ("idle", None),
            ArbiterPhase::Armed(id) => ("armed", Some(id)),
            ArbiterPhase::Active(id) => ("active", Some(id)),
            ArbiterPhase::Reverting(id) => ("reverting", Some(id)),
        };
        Self {
            phase: name,
            id: id.map(|id| id.to_string()),
        }
    }
}

pub fn snapshot_json(snapshot: &CafeSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CafeSnapshotDto::from(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ObjectId;
    use crate::use_cases::scenarios::ScenarioId;

    fn snapshot(arbiter: ArbiterPhase, held: Option<ObjectId>) -> CafeSnapshot {
        CafeSnapshot {
            tick: 42,
            elapsed: 0.7,
            machine: CoffeeMachineState::Working,
            lights_on: false,
            arbiter,
            scenarios: ArbiterStats {
                activations: 2,
                reverts: 1,
                ..ArbiterStats::default()
            },
            held,
            cups_filled: 1,
            caps_seated: 0,
            served: 3,
            earnings: 300,
            pending_timers: 2,
        }
    }

    #[test]
    fn active_scenario_is_named_in_kebab_case() {
        let json = snapshot_json(&snapshot(
            ArbiterPhase::Active(ScenarioId::GuestReplacement),
            Some(ObjectId(7)),
        ))
        .expect("snapshot serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["tick"], 42);
        assert_eq!(value["machine"], "Working");
        assert_eq!(value["scenario"]["phase"], "active");
        assert_eq!(value["scenario"]["id"], "guest-replacement");
        assert_eq!(value["stats"]["activations"], 2);
        assert_eq!(value["held"], 7);
    }

    #[test]
    fn idle_slot_and_empty_hands_are_omitted() {
        let json = snapshot_json(&snapshot(ArbiterPhase::Idle, None)).expect("snapshot serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["scenario"]["phase"], "idle");
        assert!(value["scenario"].get("id").is_none());
        assert!(value.get("held").is_none());
    }
}
