//! Static artifacts consumed by the configuration-management stage.
//!
//! Three YAML documents are written into the output directory:
//! - `inv.yml`: inventory with one group holding the handed-off hosts
//! - `vars.yml`: free-form variables from the fleet configuration
//! - `site.yml`: a single play applying the configured roles

use crate::config::{AnsibleSettings, ServerDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

pub const INVENTORY_FILE: &str = "inv.yml";
pub const VARS_FILE: &str = "vars.yml";
pub const PLAYBOOK_FILE: &str = "site.yml";

#[derive(Serialize)]
struct Inventory {
    all: InventoryRoot,
}

#[derive(Serialize)]
struct InventoryRoot {
    children: BTreeMap<String, InventoryGroup>,
}

#[derive(Serialize)]
struct InventoryGroup {
    hosts: BTreeMap<String, HostVars>,
}

#[derive(Serialize)]
struct HostVars {
    ansible_host: String,
}

#[derive(Serialize)]
struct Play {
    hosts: String,
    gather_facts: bool,
    vars_files: Vec<String>,
    roles: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<&'static str, String>,
}

/// Locations of the written artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub inventory: PathBuf,
    pub vars: PathBuf,
    pub playbook: PathBuf,
}

pub fn render_inventory(group: &str, servers: &[ServerDescriptor]) -> VmfleetResult<String> {
    let hosts = servers
        .iter()
        .map(|server| {
            (
                server.name.clone(),
                HostVars {
                    ansible_host: server.ip_address.clone(),
                },
            )
        })
        .collect();

    let inventory = Inventory {
        all: InventoryRoot {
            children: BTreeMap::from([(group.to_string(), InventoryGroup { hosts })]),
        },
    };
    to_yaml(&inventory)
}

pub fn render_playbook(settings: &AnsibleSettings) -> VmfleetResult<String> {
    let mut environment = BTreeMap::new();
    if let Some(proxy) = &settings.http_proxy {
        environment.insert("http_proxy", proxy.clone());
    }
    if let Some(proxy) = &settings.https_proxy {
        environment.insert("https_proxy", proxy.clone());
    }

    let play = Play {
        hosts: settings.group.clone(),
        gather_facts: true,
        vars_files: vec![VARS_FILE.to_string()],
        roles: settings.roles.clone(),
        environment,
    };
    to_yaml(&vec![play])
}

pub fn render_vars(vars: &serde_yaml::Mapping) -> VmfleetResult<String> {
    to_yaml(vars)
}

/// Render and write all three artifacts, creating the output directory.
pub fn write_artifacts(
    settings: &AnsibleSettings,
    servers: &[ServerDescriptor],
    vars: &serde_yaml::Mapping,
) -> VmfleetResult<ArtifactPaths> {
    let dir = &settings.output_dir;
    std::fs::create_dir_all(dir).map_err(|e| {
        VmfleetError::Storage(format!("failed to create {}: {}", dir.display(), e))
    })?;

    let paths = ArtifactPaths {
        inventory: dir.join(INVENTORY_FILE),
        vars: dir.join(VARS_FILE),
        playbook: dir.join(PLAYBOOK_FILE),
    };

    write_file(&paths.vars, &render_vars(vars)?)?;
    write_file(&paths.inventory, &render_inventory(&settings.group, servers)?)?;
    write_file(&paths.playbook, &render_playbook(settings)?)?;

    tracing::info!(dir = %dir.display(), hosts = servers.len(), "Wrote configuration artifacts");
    Ok(paths)
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> VmfleetResult<String> {
    serde_yaml::to_string(value)
        .map_err(|e| VmfleetError::Internal(format!("failed to render YAML: {}", e)))
}

fn write_file(path: &Path, contents: &str) -> VmfleetResult<()> {
    std::fs::write(path, contents)
        .map_err(|e| VmfleetError::Storage(format!("failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_descriptor;
    use serde_yaml::Value;

    #[test]
    fn test_inventory_lists_exactly_given_hosts() {
        let servers = vec![test_descriptor("web01", 50), test_descriptor("db01", 100)];
        let rendered = render_inventory("generated", &servers).unwrap();
        let doc: Value = serde_yaml::from_str(&rendered).unwrap();

        let hosts = doc["all"]["children"]["generated"]["hosts"]
            .as_mapping()
            .unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts["web01"]["ansible_host"], "10.0.0.10");
        assert!(hosts.contains_key("db01"));
    }

    #[test]
    fn test_playbook_without_proxy_has_no_environment() {
        let rendered = render_playbook(&AnsibleSettings::default()).unwrap();
        let doc: Value = serde_yaml::from_str(&rendered).unwrap();

        let play = &doc[0];
        assert_eq!(play["hosts"], "generated");
        assert_eq!(play["gather_facts"], true);
        assert_eq!(play["vars_files"][0], "vars.yml");
        assert_eq!(play["roles"].as_sequence().unwrap().len(), 6);
        assert!(play.get("environment").is_none());
    }

    #[test]
    fn test_playbook_with_https_proxy_only() {
        let settings = AnsibleSettings {
            https_proxy: Some("http://proxy:3128".to_string()),
            ..Default::default()
        };
        let rendered = render_playbook(&settings).unwrap();
        let doc: Value = serde_yaml::from_str(&rendered).unwrap();

        let env = doc[0]["environment"].as_mapping().unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env["https_proxy"], "http://proxy:3128");
    }

    #[test]
    fn test_write_artifacts_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AnsibleSettings {
            output_dir: dir.path().join("ansible"),
            ..Default::default()
        };
        let mut vars = serde_yaml::Mapping::new();
        vars.insert("ntpServers".into(), vec!["ntp1"].into());

        let paths = write_artifacts(&settings, &[test_descriptor("web01", 50)], &vars).unwrap();

        assert!(paths.inventory.exists());
        assert!(paths.playbook.exists());
        let written = std::fs::read_to_string(&paths.vars).unwrap();
        assert!(written.contains("ntpServers"));
    }
}
