//! Fleet configuration.
//!
//! One YAML document describes the control-plane endpoint, the servers to
//! provision and the settings of the configuration-management handoff:
//!
//! ```yaml
//! vcenter:
//!   url: https://vcenter.example.com/sdk
//!   username: deployer
//!   password: secret
//!   template: rhel9-template
//!   datastore: ds01
//!   network: VM Network
//!   resourcepool: /dc1/host/cluster1/Resources
//! servers:
//!   - name: web01
//!     cpu: 2
//!     memoryMB: 4096
//!     appDisk: 50
//!     ipaddress: 10.0.0.11
//!     netmask: 255.255.255.0
//!     gateway: 10.0.0.1
//! ```

mod connection;
mod descriptor;

pub use connection::ProviderConnection;
pub use descriptor::ServerDescriptor;

#[cfg(test)]
pub(crate) use connection::test_connection;
#[cfg(test)]
pub(crate) use descriptor::test_descriptor;

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 600;

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    pub vcenter: ProviderConnection,
    pub servers: Vec<ServerDescriptor>,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub ansible: AnsibleSettings,
    /// Free-form variables handed to the configuration-management stage.
    #[serde(default)]
    pub vars: serde_yaml::Mapping,
}

/// Batch execution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploySettings {
    pub workers: usize,
    pub call_timeout_secs: u64,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

/// Configuration-management handoff settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnsibleSettings {
    /// Directory receiving inventory, variables and playbook.
    pub output_dir: PathBuf,
    /// Inventory group the provisioned hosts are placed in.
    pub group: String,
    pub roles: Vec<String>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub username: Option<String>,
    pub playbook_bin: PathBuf,
}

impl Default for AnsibleSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("ansible"),
            group: "generated".to_string(),
            roles: [
                "common",
                "disclaimer",
                "crowdstrike",
                "qualys",
                "splunkforwarder",
                "domainjoin",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            http_proxy: None,
            https_proxy: None,
            ssh_key_path: None,
            username: None,
            playbook_bin: PathBuf::from("ansible-playbook"),
        }
    }
}

impl FleetConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> VmfleetResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VmfleetError::InvalidConfiguration(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_yaml_str(&raw).map_err(|e| match e {
            VmfleetError::InvalidConfiguration(msg) => {
                VmfleetError::InvalidConfiguration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::debug!(
            path = %path.display(),
            servers = config.servers.len(),
            "Loaded fleet configuration"
        );

        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> VmfleetResult<Self> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| VmfleetError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VmfleetResult<()> {
        self.vcenter.validate()?;

        if self.servers.is_empty() {
            return Err(VmfleetError::InvalidConfiguration(
                "no servers configured".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.servers.len());
        for server in &self.servers {
            server.validate()?;
            if !seen.insert(server.name.as_str()) {
                return Err(VmfleetError::InvalidConfiguration(format!(
                    "duplicate server name: {}",
                    server.name
                )));
            }
        }

        if self.deploy.workers == 0 {
            return Err(VmfleetError::InvalidConfiguration(
                "deploy.workers must be at least 1".into(),
            ));
        }
        if self.deploy.call_timeout_secs == 0 {
            return Err(VmfleetError::InvalidConfiguration(
                "deploy.callTimeoutSecs must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
vcenter:
  url: https://vcenter.example.test/sdk
  username: deployer
  password: secret
  template: rhel9-template
  datastore: ds01
  network: VM Network
  resourcepool: /dc1/host/cluster1/Resources
servers:
  - name: web01
    cpu: 2
    memoryMB: 4096
    appDisk: 50
    ipaddress: 10.0.0.11
    netmask: 255.255.255.0
    gateway: 10.0.0.1
  - name: web02
    cpu: 4
    memoryMB: 8192
    ipaddress: 10.0.0.12
    netmask: 255.255.255.0
    gateway: 10.0.0.1
ansible:
  httpsProxy: http://proxy.example.test:3128
  username: ansible
vars:
  ntpServers: [ntp1.example.test]
"#;

    #[test]
    fn test_parse_sample() {
        let config = FleetConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.vcenter.resource_pool, "/dc1/host/cluster1/Resources");
        assert!(config.vcenter.insecure);
        assert_eq!(config.vcenter.adapter, "vmxnet3");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].memory_mb, 4096);
        assert_eq!(config.servers[0].app_disk_gb, 50);
        // Missing appDisk loads; the disk step rejects it later.
        assert_eq!(config.servers[1].app_disk_gb, 0);
        assert_eq!(config.deploy.workers, DEFAULT_WORKERS);
        assert_eq!(config.ansible.group, "generated");
        assert_eq!(config.ansible.roles.len(), 6);
        assert_eq!(
            config.ansible.https_proxy.as_deref(),
            Some("http://proxy.example.test:3128")
        );
        assert!(config.ansible.http_proxy.is_none());
        assert_eq!(config.vars.len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let raw = SAMPLE.replace("name: web02", "name: web01");
        let err = FleetConfig::from_yaml_str(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate server name: web01"));
    }

    #[test]
    fn test_missing_vcenter_is_invalid_configuration() {
        let err = FleetConfig::from_yaml_str("servers: []").unwrap_err();
        assert!(matches!(err, VmfleetError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let raw = format!("{}deploy:\n  workers: 0\n", SAMPLE);
        assert!(FleetConfig::from_yaml_str(&raw).is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"vcenter: [").unwrap();

        let err = FleetConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
