// Named, payload-free broadcast signals shared by every component in the cafe.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use tracing::{error, trace, warn};

/// Identity of a broadcast. Signals carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    // Player intents raised by the interaction dispatcher.
    PlayerSwitchingLight,
    CoffeeButtonPressed,
    CustomerServed,

    // Lighting intents.
    TurnOffLight,
    TurnAllLightsRed,
    TurnAllLightsWhite,
    LightsChanged,

    // Music and ambience intents.
    TurnOnRelaxMusic,
    TurnOffRelaxMusic,
    MusicValueUp,
    MusicValueDown,
    CafeNoiseVolumeUp,
    CafeNoiseVolumeDown,

    // Device and scenario notifications.
    CoffeeMachineActivated,
    ScenarioActivated,
    ScenarioReverted,
}

/// Shared listener callback. Keeping the `Rc` lets a caller register the same
/// listener under several signals, and lets the bus recognise duplicates.
pub type Listener = Rc<RefCell<dyn FnMut()>>;

/// Wraps a closure into a [`Listener`].
pub fn listener(f: impl FnMut() + 'static) -> Listener {
    Rc::new(RefCell::new(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Subscription {
    id: ListenerId,
    callback: Listener,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: HashMap<Signal, Vec<Subscription>>,
}

/// Publish/subscribe registry.
///
/// Cloning the bus yields another handle onto the same registry; the cafe root
/// owns the original and hands clones to each component it builds.
#[derive(Clone, Default)]
pub struct SignalBus {
    inner: Rc<RefCell<BusInner>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh closure for `signal`.
    pub fn subscribe(&self, signal: Signal, f: impl FnMut() + 'static) -> ListenerId {
        self.subscribe_listener(signal, &listener(f))
    }

    /// Registers a shared listener. Registering the same listener twice under
    /// one signal returns the existing id and adds nothing.
    pub fn subscribe_listener(&self, signal: Signal, callback: &Listener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        if let Some(existing) = inner
            .listeners
            .get(&signal)
            .and_then(|subs| subs.iter().find(|s| Rc::ptr_eq(&s.callback, callback)))
        {
            return existing.id;
        }

        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.entry(signal).or_default().push(Subscription {
            id,
            callback: Rc::clone(callback),
        });
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, signal: Signal, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(subs) = inner.listeners.get_mut(&signal) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != id);
        before != subs.len()
    }

    pub fn listener_count(&self, signal: Signal) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&signal)
            .map_or(0, Vec::len)
    }

    /// Invokes every listener currently registered for `signal`, in
    /// registration order, on the caller's stack.
    ///
    /// Listeners added or removed while the publish is running take effect on
    /// the next publish. A panicking listener is logged and the remaining
    /// listeners still run.
    pub fn publish(&self, signal: Signal) {
        let snapshot: Vec<Listener> = {
            let inner = self.inner.borrow();
            match inner.listeners.get(&signal) {
                Some(subs) => subs.iter().map(|s| Rc::clone(&s.callback)).collect(),
                None => Vec::new(),
            }
        };
        trace!(?signal, listeners = snapshot.len(), "publish");

        for callback in snapshot {
            let Ok(mut f) = callback.try_borrow_mut() else {
                // The listener is already running further up the stack.
                warn!(?signal, "listener is already running; skipped");
                continue;
            };
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| (*f)())) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(?signal, %message, "listener panicked");
            }
        }
    }
}
