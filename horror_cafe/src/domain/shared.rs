// Single-threaded shared ownership for components that are reached from
// signal listeners and timer callbacks.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;

pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Runs `f` against the component behind `weak` if it is still alive and not
/// already borrowed.
///
/// Returns `false` when the component was dropped or when the call would be
/// re-entrant (the component is in the middle of its own update); in both cases
/// nothing runs.
pub fn with_weak<T>(weak: &Weak<RefCell<T>>, context: &'static str, f: impl FnOnce(&mut T)) -> bool {
    let Some(strong) = weak.upgrade() else {
        return false;
    };
    match strong.try_borrow_mut() {
        Ok(mut component) => {
            f(&mut component);
            true
        }
        Err(_) => {
            warn!(context, "re-entrant delivery rejected");
            false
        }
    }
}
