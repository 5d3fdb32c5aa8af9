//! Handoff that writes artifacts and runs `ansible-playbook`.

use super::ConfigurationHandoff;
use super::artifacts::{ArtifactPaths, write_artifacts};
use crate::config::{AnsibleSettings, ServerDescriptor};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

pub struct AnsibleHandoff {
    settings: AnsibleSettings,
    vars: serde_yaml::Mapping,
}

impl AnsibleHandoff {
    pub fn new(settings: AnsibleSettings, vars: serde_yaml::Mapping) -> Self {
        Self { settings, vars }
    }

    fn playbook_args(&self, paths: &ArtifactPaths) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            paths.inventory.clone().into(),
            paths.playbook.clone().into(),
        ];
        if let Some(key) = &self.settings.ssh_key_path {
            args.push("--private-key".into());
            args.push(key.clone().into());
        }
        if let Some(user) = &self.settings.username {
            args.push("-u".into());
            args.push(user.into());
        }
        args
    }
}

#[async_trait]
impl ConfigurationHandoff for AnsibleHandoff {
    async fn hand_off(&self, servers: &[ServerDescriptor]) -> VmfleetResult<()> {
        if servers.is_empty() {
            tracing::warn!("No provisioned servers to configure, skipping playbook");
            return Ok(());
        }

        let paths = write_artifacts(&self.settings, servers, &self.vars)
            .map_err(|e| VmfleetError::HandoffFailed(e.to_string()))?;

        let binary = &self.settings.playbook_bin;
        tracing::info!(hosts = servers.len(), playbook = %paths.playbook.display(), "Running playbook");

        let status = Command::new(binary)
            .args(self.playbook_args(&paths))
            .env("ANSIBLE_FORCE_COLOR", "true")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                VmfleetError::HandoffFailed(format!(
                    "failed to run {}: {}",
                    binary.display(),
                    e
                ))
            })?;

        if !status.success() {
            return Err(VmfleetError::HandoffFailed(format!(
                "{} exited with {}",
                binary.display(),
                status
            )));
        }

        tracing::info!(hosts = servers.len(), "Playbook completed");
        Ok(())
    }
}
