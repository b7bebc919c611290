//! Core data types for the FFPInvest trade alert watcher.

pub mod alert;
pub mod change;
pub mod display;
pub mod time;

pub use alert::*;
pub use change::*;
pub use display::*;
pub use time::*;
