//! Service layer
//!
//! Business logic shared by the HTTP boundary and background tasks.

mod allocation_service;
mod expiry_sweeper;

pub use allocation_service::*;
pub use expiry_sweeper::ExpirySweeper;
