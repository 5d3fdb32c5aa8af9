//! Subprocess provider backed by the `govc` CLI.
//!
//! Endpoint settings and credentials are applied to each child process's
//! environment from the connection passed at construction; the parent
//! process environment is never touched.

use super::{
    AdapterRequest, CloneRequest, DiskRequest, NetworkRequest, Operation, PowerRequest,
    VirtualizationProvider,
};
use crate::config::ProviderConnection;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

pub struct GovcProvider {
    connection: Arc<ProviderConnection>,
}

impl GovcProvider {
    pub fn new(connection: Arc<ProviderConnection>) -> Self {
        Self { connection }
    }

    fn env(&self) -> Vec<(&'static str, String)> {
        let conn = &self.connection;
        vec![
            ("GOVC_URL", conn.url.clone()),
            ("GOVC_USERNAME", conn.username.clone()),
            ("GOVC_PASSWORD", conn.password.clone()),
            ("GOVC_DATASTORE", conn.datastore.clone()),
            ("GOVC_NETWORK", conn.network.clone()),
            ("GOVC_RESOURCE_POOL", conn.resource_pool.clone()),
            ("GOVC_INSECURE", conn.insecure.to_string()),
        ]
    }

    fn clone_args(&self, request: &CloneRequest) -> Vec<String> {
        vec![
            Operation::Clone.as_str().to_string(),
            "-vm".to_string(),
            self.connection.template.clone(),
            "-on=false".to_string(),
            format!("-c={}", request.cpus),
            format!("-m={}", request.memory_mb),
            format!("-net={}", self.connection.network),
            format!("-net.adapter={}", self.connection.adapter),
            request.vm.clone(),
        ]
    }

    fn disk_args(request: &DiskRequest) -> Vec<String> {
        vec![
            Operation::CreateDisk.as_str().to_string(),
            "-vm".to_string(),
            request.vm.clone(),
            "-name".to_string(),
            request.disk_name.clone(),
            "-size".to_string(),
            format!("{}G", request.size_gb),
            format!("-thick={}", request.thick),
        ]
    }

    fn adapter_args(request: &AdapterRequest) -> Vec<String> {
        vec![
            Operation::ConnectAdapter.as_str().to_string(),
            "-vm".to_string(),
            request.vm.clone(),
            request.device.clone(),
        ]
    }

    fn network_args(request: &NetworkRequest) -> Vec<String> {
        vec![
            Operation::CustomizeNetwork.as_str().to_string(),
            "-vm".to_string(),
            request.vm.clone(),
            "-ip".to_string(),
            request.ip_address.clone(),
            "-netmask".to_string(),
            request.netmask.clone(),
            "-gateway".to_string(),
            request.gateway.clone(),
        ]
    }

    fn power_args(request: &PowerRequest) -> Vec<String> {
        vec![
            Operation::PowerOn.as_str().to_string(),
            "-on".to_string(),
            request.vm.clone(),
        ]
    }

    /// Run one govc command and normalize its exit status.
    ///
    /// The child is killed if this future is dropped, which is how timeouts
    /// and cancellation abandon an in-flight call.
    async fn run(&self, vm: &str, operation: Operation, args: Vec<String>) -> VmfleetResult<()> {
        let binary = &self.connection.govc;
        tracing::debug!(server = %vm, operation = %operation, ?args, "Invoking govc");

        let output = Command::new(binary)
            .args(&args)
            .envs(self.env())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                VmfleetError::provider(
                    vm,
                    operation.as_str(),
                    format!("failed to run {}: {}", binary.display(), e),
                )
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("govc exited with {}", output.status),
            msg => msg.to_string(),
        };
        tracing::warn!(server = %vm, operation = %operation, %reason, "govc reported failure");
        Err(VmfleetError::provider(vm, operation.as_str(), reason))
    }
}

#[async_trait]
impl VirtualizationProvider for GovcProvider {
    async fn clone_vm(&self, request: &CloneRequest) -> VmfleetResult<()> {
        self.run(&request.vm, Operation::Clone, self.clone_args(request))
            .await
    }

    async fn create_disk(&self, request: &DiskRequest) -> VmfleetResult<()> {
        self.run(&request.vm, Operation::CreateDisk, Self::disk_args(request))
            .await
    }

    async fn connect_adapter(&self, request: &AdapterRequest) -> VmfleetResult<()> {
        self.run(
            &request.vm,
            Operation::ConnectAdapter,
            Self::adapter_args(request),
        )
        .await
    }

    async fn customize_network(&self, request: &NetworkRequest) -> VmfleetResult<()> {
        self.run(
            &request.vm,
            Operation::CustomizeNetwork,
            Self::network_args(request),
        )
        .await
    }

    async fn power_on(&self, request: &PowerRequest) -> VmfleetResult<()> {
        self.run(&request.vm, Operation::PowerOn, Self::power_args(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_connection, test_descriptor};
    use std::path::PathBuf;

    fn provider_with_binary(binary: &str) -> GovcProvider {
        let mut conn = test_connection();
        conn.govc = PathBuf::from(binary);
        GovcProvider::new(Arc::new(conn))
    }

    #[test]
    fn test_clone_args() {
        let provider = GovcProvider::new(Arc::new(test_connection()));
        let args = provider.clone_args(&CloneRequest::from(&test_descriptor("web01", 50)));

        assert_eq!(
            args,
            vec![
                "vm.clone",
                "-vm",
                "rhel9-template",
                "-on=false",
                "-c=2",
                "-m=4096",
                "-net=VM Network",
                "-net.adapter=vmxnet3",
                "web01",
            ]
        );
    }

    #[test]
    fn test_disk_args() {
        let request = DiskRequest::for_server(&test_descriptor("db01", 100)).unwrap();
        assert_eq!(
            GovcProvider::disk_args(&request),
            vec![
                "vm.disk.create",
                "-vm",
                "db01",
                "-name",
                "db01/db01_001",
                "-size",
                "100G",
                "-thick=true",
            ]
        );
    }

    #[test]
    fn test_adapter_network_and_power_args() {
        let server = test_descriptor("web01", 50);

        assert_eq!(
            GovcProvider::adapter_args(&AdapterRequest::from(&server)),
            vec!["device.connect", "-vm", "web01", "ethernet-0"]
        );
        assert_eq!(
            GovcProvider::network_args(&NetworkRequest::from(&server)),
            vec![
                "vm.customize",
                "-vm",
                "web01",
                "-ip",
                "10.0.0.10",
                "-netmask",
                "255.255.255.0",
                "-gateway",
                "10.0.0.1",
            ]
        );
        assert_eq!(
            GovcProvider::power_args(&PowerRequest::from(&server)),
            vec!["vm.power", "-on", "web01"]
        );
    }

    #[test]
    fn test_env_carries_connection() {
        let provider = GovcProvider::new(Arc::new(test_connection()));
        let env = provider.env();

        assert!(env.contains(&("GOVC_PASSWORD", "hunter2".to_string())));
        assert!(env.contains(&("GOVC_INSECURE", "true".to_string())));
        assert!(env.contains(&(
            "GOVC_RESOURCE_POOL",
            "/dc1/host/cluster1/Resources".to_string()
        )));
    }

    #[tokio::test]
    async fn test_missing_binary_is_provider_failure() {
        let provider = provider_with_binary("/nonexistent/govc");
        let err = provider
            .power_on(&PowerRequest::from(&test_descriptor("web01", 50)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VmfleetError::ProviderOperationFailed { ref operation, .. } if operation == "vm.power"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_provider_failure() {
        let provider = provider_with_binary("false");
        let err = provider
            .clone_vm(&CloneRequest::from(&test_descriptor("web01", 50)))
            .await
            .unwrap_err();

        match err {
            VmfleetError::ProviderOperationFailed { server, reason, .. } => {
                assert_eq!(server, "web01");
                assert!(reason.contains("exited with"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let provider = provider_with_binary("true");
        provider
            .connect_adapter(&AdapterRequest::from(&test_descriptor("web01", 50)))
            .await
            .unwrap();
    }
}
