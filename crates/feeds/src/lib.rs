//! Alert retrieval from the FFPInvest alert service.
//!
//! - `rest` - HTTP fetcher for the open/close alert endpoints
//! - `source` - `AlertSource` seam and the snapshot it returns
//! - `mock` - scripted source for tests (`test-util` feature)

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod rest;
pub mod source;

pub use error::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockAlertSource;
pub use rest::*;
pub use source::*;
