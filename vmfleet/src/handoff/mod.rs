//! Configuration-management handoff.
//!
//! Runs once provisioning is over, against the servers that reached
//! `Succeeded`. A handoff failure is reported on its own and never changes
//! any server's provisioning outcome.

mod ansible;
pub mod artifacts;

pub use ansible::AnsibleHandoff;

use crate::config::ServerDescriptor;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

/// Post-boot configuration of provisioned servers.
#[async_trait]
pub trait ConfigurationHandoff: Send + Sync {
    /// Configure `servers`. Failures are reported as `HandoffFailed`.
    async fn hand_off(&self, servers: &[ServerDescriptor]) -> VmfleetResult<()>;
}
