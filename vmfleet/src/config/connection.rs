//! Control-plane endpoint settings.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

/// Process-wide virtualization endpoint.
///
/// Built once from configuration and shared read-only by every pipeline.
#[derive(Clone, Deserialize)]
pub struct ProviderConnection {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Template VM that every server is cloned from.
    pub template: String,
    pub datastore: String,
    pub network: String,
    #[serde(rename = "resourcepool")]
    pub resource_pool: String,
    /// Skip TLS certificate verification.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
    /// NIC model attached at clone time.
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Control-plane CLI used by the subprocess provider.
    #[serde(default = "default_govc")]
    pub govc: PathBuf,
}

fn default_insecure() -> bool {
    true
}

fn default_adapter() -> String {
    "vmxnet3".to_string()
}

fn default_govc() -> PathBuf {
    PathBuf::from("govc")
}

impl ProviderConnection {
    pub fn validate(&self) -> VmfleetResult<()> {
        for (field, value) in [
            ("url", &self.url),
            ("template", &self.template),
            ("network", &self.network),
        ] {
            if value.trim().is_empty() {
                return Err(VmfleetError::InvalidConfiguration(format!(
                    "vcenter.{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("template", &self.template)
            .field("datastore", &self.datastore)
            .field("network", &self.network)
            .field("resource_pool", &self.resource_pool)
            .field("insecure", &self.insecure)
            .field("adapter", &self.adapter)
            .field("govc", &self.govc)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> ProviderConnection {
    ProviderConnection {
        url: "https://vcenter.example.test/sdk".to_string(),
        username: "deployer".to_string(),
        password: "hunter2".to_string(),
        template: "rhel9-template".to_string(),
        datastore: "ds01".to_string(),
        network: "VM Network".to_string(),
        resource_pool: "/dc1/host/cluster1/Resources".to_string(),
        insecure: true,
        adapter: default_adapter(),
        govc: default_govc(),
    }
}
