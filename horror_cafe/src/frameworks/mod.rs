// Frameworks: configuration, runtime bootstrap and the headless host loop.

pub mod autopilot;
pub mod config;
pub mod runtime;
