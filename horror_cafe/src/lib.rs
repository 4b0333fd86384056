pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::config::CafeConfig;
pub use frameworks::runtime::{HeadlessCafe, run, run_with_config};
pub use use_cases::{Cafe, CafeSnapshot};
