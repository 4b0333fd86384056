// Domain layer: engine-independent primitives, collaborator ports and tuning.

pub mod math;
pub mod ports;
pub mod shared;
pub mod signal;
pub mod state_machine;
pub mod timer;
pub mod tuning;

pub use math::{Quat, Transform, Vec3};
pub use ports::{
    AudioSink, AudioTrack, CameraRig, Collider, Color, ObjectId, Physics, RandomSource,
    RaycastHit, SceneGraph, SoundId, Stage, Tag,
};
pub use shared::{Shared, shared, with_weak};
pub use signal::{Listener, ListenerId, Signal, SignalBus, listener};
pub use state_machine::{StateHandler, StateMachine};
pub use timer::{Scheduler, TimerHandle, TimerSlot};
