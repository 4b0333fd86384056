// Interface adapters: headless port implementations, snapshot DTOs and helpers.

pub mod headless;
pub mod protocol;
pub mod utils;
