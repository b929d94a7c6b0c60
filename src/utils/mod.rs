//! Utils Module
pub mod preflight;
pub mod preview;
pub mod telemetry;

pub use preview::preview;
