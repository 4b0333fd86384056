// Use cases layer: cafe components, horror scenarios and the cafe root.

pub mod attachment;
pub mod audio;
pub mod cafe;
pub mod coffee_machine;
pub mod interaction;
pub mod light_switcher;
pub mod paper_cup;
pub mod scenarios;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use cafe::Cafe;
pub use types::{CafeLayout, CafeSnapshot, CupLayout, Hands, HeldObject, InputEvent};
