//! Domain models for the care portal.

mod doctor;
mod health;
mod patient;

pub use doctor::*;
pub use health::*;
pub use patient::*;
