// Turns the "use" key into an action on whatever the player is looking at.

use crate::domain::math::{Quat, Transform};
use crate::domain::ports::{ObjectId, RaycastHit, SoundId, Stage, Tag};
use crate::domain::shared::Shared;
use crate::domain::signal::{Signal, SignalBus};
use crate::domain::tuning::InteractionTuning;
use crate::use_cases::paper_cup::{CupSlot, PaperCup};
use crate::use_cases::types::{Hands, InputEvent};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionAction {
    PickUpCup,
    PlaceHeld,
    PickUpCap,
    /// Rests the held cap on a cup's rim; the cap seats itself once the cup is full.
    PutLidOn,
    StartCoffee,
    SwitchLight,
    ServeCustomer,
}

pub struct InteractionDispatcher {
    bus: SignalBus,
    stage: Stage,
    tuning: InteractionTuning,
    hold_rotation: Quat,
    hands: Hands,
    slot: Shared<CupSlot>,
    cups: Vec<Shared<PaperCup>>,
    served: u32,
    earnings: u32,
}

impl InteractionDispatcher {
    pub fn new(
        bus: SignalBus,
        stage: Stage,
        slot: Shared<CupSlot>,
        cups: Vec<Shared<PaperCup>>,
        tuning: InteractionTuning,
    ) -> Self {
        Self {
            bus,
            stage,
            tuning,
            hold_rotation: Quat::from_euler_degrees(-90.0, 0.0, 0.0),
            hands: Hands::default(),
            slot,
            cups,
            served: 0,
            earnings: 0,
        }
    }

    pub fn hands(&self) -> &Hands {
        &self.hands
    }

    pub fn hands_mut(&mut self) -> &mut Hands {
        &mut self.hands
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    pub fn earnings(&self) -> u32 {
        self.earnings
    }

    /// What pressing "use" would do right now, and what it would act on.
    pub fn resolve(&self) -> Option<(InteractionAction, RaycastHit)> {
        let origin = self.stage.camera.position();
        let direction = self.stage.camera.forward();
        let holding = self.hands.is_holding();

        let near = self
            .stage
            .physics
            .raycast(origin, direction, self.tuning.ray_distance)
            .and_then(|hit| {
                let action = match hit.tag {
                    Tag::Glass if !holding => InteractionAction::PickUpCup,
                    Tag::Glass if self.hands.is_holding_tag(Tag::Cap) => InteractionAction::PutLidOn,
                    Tag::Place if holding => InteractionAction::PlaceHeld,
                    Tag::Cap if !holding => InteractionAction::PickUpCap,
                    Tag::StartCoffeeButton if !holding => InteractionAction::StartCoffee,
                    Tag::LightSwitch => InteractionAction::SwitchLight,
                    _ => return None,
                };
                Some((action, hit))
            });
        if near.is_some() {
            return near;
        }

        if !self.hands.is_holding_tag(Tag::Glass) {
            return None;
        }
        self.stage
            .physics
            .raycast(origin, direction, self.tuning.throw_distance)
            .filter(|hit| hit.tag == Tag::Client)
            .map(|hit| (InteractionAction::ServeCustomer, hit))
    }

    /// Applies one input. Returns the action taken, if any.
    pub fn handle(&mut self, input: InputEvent) -> Option<InteractionAction> {
        match input {
            InputEvent::Interact => {}
        }
        let (action, hit) = self.resolve()?;
        let done = match action {
            InteractionAction::PickUpCup => self.pick_up_cup(hit.object),
            InteractionAction::PlaceHeld => self.place_held(hit.object),
            InteractionAction::PickUpCap => self.pick_up(hit.object, Tag::Cap),
            InteractionAction::PutLidOn => self.put_lid_on(&hit),
            InteractionAction::StartCoffee => {
                self.bus.publish(Signal::CoffeeButtonPressed);
                true
            }
            InteractionAction::SwitchLight => {
                self.bus.publish(Signal::PlayerSwitchingLight);
                true
            }
            InteractionAction::ServeCustomer => self.serve(hit.object),
        };
        if done {
            debug!(?action, target = %hit.object, "interaction");
        }
        done.then_some(action)
    }

    /// Keeps the held object floating in front of the camera.
    pub fn carry(&self) {
        let Some(held) = self.hands.held() else {
            return;
        };
        let position = self.stage.camera.position()
            + self.stage.camera.forward() * self.tuning.hold_distance;
        self.stage.scene.set_transform(
            held.object,
            Transform::at(position).with_rotation(self.hold_rotation),
        );
    }

    fn cup(&self, object: ObjectId) -> Option<&Shared<PaperCup>> {
        self.cups
            .iter()
            .find(|cup| cup.try_borrow().is_ok_and(|c| c.object() == object))
    }

    fn pick_up_cup(&mut self, object: ObjectId) -> bool {
        let brewing = self
            .cup(object)
            .is_some_and(|cup| cup.try_borrow().map_or(true, |c| c.is_brewing()));
        if brewing {
            debug!(cup = %object, "cup is still filling; pick-up ignored");
            return false;
        }
        if !self.pick_up(object, Tag::Glass) {
            return false;
        }
        if let Ok(mut slot) = self.slot.try_borrow_mut() {
            slot.cup_exited(object);
        }
        true
    }

    fn pick_up(&mut self, object: ObjectId, tag: Tag) -> bool {
        if !self.hands.grab(object, tag) {
            return false;
        }
        self.stage.scene.set_interactable(object, false);
        self.stage.play_sound(SoundId::PaperCollect);
        self.carry();
        true
    }

    fn place_held(&mut self, spot: ObjectId) -> bool {
        let Some(position) = self.stage.scene.transform(spot).map(|t| t.position) else {
            return false;
        };
        let Some(held) = self.hands.release() else {
            return false;
        };
        self.stage.scene.set_transform(
            held.object,
            Transform::at(position).with_rotation(self.hold_rotation),
        );
        self.stage.scene.set_interactable(held.object, true);

        let on_slot = self.slot.try_borrow().is_ok_and(|s| s.anchor() == spot);
        if held.tag == Tag::Glass && on_slot {
            if let Some(cup) = self.cup(held.object).cloned() {
                if let Ok(mut slot) = self.slot.try_borrow_mut() {
                    slot.cup_entered(cup);
                }
            }
        }
        true
    }

    fn put_lid_on(&mut self, hit: &RaycastHit) -> bool {
        let ready = self
            .cup(hit.object)
            .is_some_and(|cup| cup.try_borrow().is_ok_and(|c| !c.is_brewing()));
        if !ready {
            debug!(cup = %hit.object, "cup is still filling; lid not placed");
            return false;
        }
        let Some(cap) = self.hands.release() else {
            return false;
        };
        self.stage.scene.set_transform(
            cap.object,
            Transform::at(hit.point).with_rotation(self.hold_rotation),
        );
        self.stage.scene.set_interactable(cap.object, true);
        true
    }

    fn serve(&mut self, client: ObjectId) -> bool {
        let Some(client_position) = self.stage.scene.transform(client).map(|t| t.position) else {
            return false;
        };
        let Some(cup) = self.hands.release() else {
            return false;
        };
        self.stage
            .scene
            .set_transform(cup.object, Transform::at(client_position));
        self.served += 1;
        self.earnings += self.tuning.serve_reward;
        info!(cup = %cup.object, earnings = self.earnings, "customer served");
        self.bus.publish(Signal::CustomerServed);
        true
    }
}
