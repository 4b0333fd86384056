// Generic finite-state machine with an owned entry-action handler.

use std::fmt::Debug;
use tracing::debug;

/// Entry actions for a [`StateMachine`]. Called once per real transition.
pub trait StateHandler<T> {
    fn handle_state_change(&mut self, new_state: T);
}

/// Holds the current state and the handler that reacts to transitions.
///
/// The state is always defined: it is supplied at construction and only ever
/// replaced by another value.
pub struct StateMachine<T, H> {
    current: T,
    handler: H,
    observers: Vec<Box<dyn FnMut(T)>>,
}

impl<T, H> StateMachine<T, H>
where
    T: Copy + PartialEq + Debug,
    H: StateHandler<T>,
{
    /// Builds the machine in the supplied initial state. The handler is not
    /// invoked for the initial state.
    pub fn new(initial: impl FnOnce() -> T, handler: H) -> Self {
        Self {
            current: initial(),
            handler,
            observers: Vec::new(),
        }
    }

    pub fn current(&self) -> T {
        self.current
    }

    /// Observers hear about every transition before the handler runs its entry actions.
    pub fn on_state_changed(&mut self, observer: impl FnMut(T) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Moves to `new_state`. Setting the current state again is ignored.
    ///
    /// Returns `true` if a transition happened.
    pub fn set_state(&mut self, new_state: T) -> bool {
        if self.current == new_state {
            return false;
        }
        debug!(from = ?self.current, to = ?new_state, "state change");
        self.current = new_state;
        for observer in &mut self.observers {
            observer(new_state);
        }
        self.handler.handle_state_change(new_state);
        true
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Door {
        Closed,
        Open,
    }

    #[derive(Default)]
    struct Recorder {
        entered: Vec<Door>,
    }

    impl StateHandler<Door> for Recorder {
        fn handle_state_change(&mut self, new_state: Door) {
            self.entered.push(new_state);
        }
    }

    #[test]
    fn same_state_twice_runs_handler_once() {
        let mut machine = StateMachine::new(|| Door::Closed, Recorder::default());

        assert!(machine.set_state(Door::Open));
        assert!(!machine.set_state(Door::Open));

        assert_eq!(machine.handler().entered, vec![Door::Open]);
        assert_eq!(machine.current(), Door::Open);
    }

    #[test]
    fn initial_state_does_not_invoke_handler() {
        let mut machine = StateMachine::new(|| Door::Closed, Recorder::default());
        assert!(!machine.set_state(Door::Closed));
        assert!(machine.handler().entered.is_empty());
    }

    #[test]
    fn observers_see_the_new_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new(|| Door::Closed, Recorder::default());
        let seen_in = seen.clone();
        machine.on_state_changed(move |state| seen_in.borrow_mut().push(state));

        machine.set_state(Door::Open);
        machine.set_state(Door::Closed);

        assert_eq!(*seen.borrow(), vec![Door::Open, Door::Closed]);
        assert_eq!(machine.handler().entered, vec![Door::Open, Door::Closed]);
    }
}
