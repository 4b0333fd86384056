// Use-case level inputs, layout and snapshot types for the cafe loop.

use crate::domain::math::Vec3;
use crate::domain::ports::{ObjectId, Tag};
use crate::use_cases::coffee_machine::CoffeeMachineState;
use crate::use_cases::scenarios::{ArbiterPhase, ArbiterStats};

/// Discrete player input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The "use" key.
    Interact,
}

/// Something the player is carrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldObject {
    pub object: ObjectId,
    pub tag: Tag,
}

/// What the player holds. At most one object at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hands {
    held: Option<HeldObject>,
}

impl Hands {
    pub fn held(&self) -> Option<HeldObject> {
        self.held
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn is_holding_tag(&self, tag: Tag) -> bool {
        self.held.is_some_and(|h| h.tag == tag)
    }

    /// Takes `object` if the hands are empty.
    pub fn grab(&mut self, object: ObjectId, tag: Tag) -> bool {
        if self.held.is_some() {
            return false;
        }
        self.held = Some(HeldObject { object, tag });
        true
    }

    pub fn release(&mut self) -> Option<HeldObject> {
        self.held.take()
    }

    /// Lets go of `object` if it is the one being held.
    pub fn release_if(&mut self, object: ObjectId) -> bool {
        if self.held.is_some_and(|h| h.object == object) {
            self.held = None;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct CupLayout {
    pub cup: ObjectId,
    /// Coffee surface inside the cup, hidden until brewing starts.
    pub coffee: ObjectId,
    /// Offset from the cup to the point a cap seats on.
    pub snap_offset: Vec3,
}

/// Scene objects the simulation drives, as registered by the host.
#[derive(Debug, Clone)]
pub struct CafeLayout {
    pub lights: Vec<ObjectId>,
    pub light_switch: ObjectId,
    pub machine_lamp: ObjectId,
    pub coffee_button: ObjectId,
    /// Place-tagged spot under the machine spout.
    pub cup_slot: ObjectId,
    pub counter_spots: Vec<ObjectId>,
    pub client: ObjectId,
    pub cups: Vec<CupLayout>,
    pub caps: Vec<ObjectId>,
    pub normal_guests: Vec<ObjectId>,
    pub scary_guests: Vec<ObjectId>,
    /// Figure standing behind the player while the behind-the-back scenario runs.
    pub lurker: ObjectId,
    /// Copy of the lurker that jumps in front of the camera.
    pub apparition: ObjectId,
    pub thing: ObjectId,
}

/// Summary of the cafe after a tick.
#[derive(Debug, Clone)]
pub struct CafeSnapshot {
    pub tick: u64,
    pub elapsed: f64,
    pub machine: CoffeeMachineState,
    pub lights_on: bool,
    pub arbiter: ArbiterPhase,
    pub scenarios: ArbiterStats,
    pub held: Option<ObjectId>,
    pub cups_filled: usize,
    pub caps_seated: usize,
    pub served: u32,
    pub earnings: u32,
    pub pending_timers: usize,
}
