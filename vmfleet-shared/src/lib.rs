//! Types shared across vmfleet crates.

pub mod errors;

pub use errors::{VmfleetError, VmfleetResult};
