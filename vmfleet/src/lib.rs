//! vmfleet: provision a fleet of virtual machines from a YAML inventory and
//! hand the running servers to configuration management.
//!
//! Layers, leaf-first:
//! - [`config`]: typed server descriptors and the control-plane connection
//! - [`provider`]: the virtualization control-plane capability set
//! - [`pipeline`] / [`provision`]: per-server ordered step execution
//! - [`batch`]: bounded worker pool over the whole fleet
//! - [`handoff`]: post-boot configuration of the succeeded servers

pub mod batch;
pub mod config;
pub mod handoff;
pub mod pipeline;
pub mod provider;
pub mod provision;

pub use batch::{BatchCoordinator, BatchReport};
pub use config::{FleetConfig, ProviderConnection, ServerDescriptor};
pub use handoff::{AnsibleHandoff, ConfigurationHandoff};
pub use provider::{GovcProvider, VirtualizationProvider};
pub use provision::{ProvisionOptions, Provisioner, ProvisioningOutcome, ServerState};
pub use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `info`). With a
/// `log_dir`, they are also written to a daily-rolling `vmfleet.log` there
/// through a background writer. The returned guard must be held until
/// shutdown; dropping it flushes the lines still queued for the file.
pub fn init_logging(log_dir: Option<&Path>) -> VmfleetResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "vmfleet.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| VmfleetError::Internal(format!("failed to initialise logging: {}", e)))?;

    Ok(guard)
}
