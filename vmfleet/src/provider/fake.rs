//! Call-recording provider for tests.

use super::{
    AdapterRequest, CloneRequest, DiskRequest, NetworkRequest, Operation, PowerRequest,
    VirtualizationProvider,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

enum Behavior {
    Fail(String),
    Hang,
}

struct Rule {
    operation: Operation,
    vm: Option<String>,
    behavior: Behavior,
}

/// Provider that succeeds on every call unless a rule says otherwise.
///
/// Records every attempted call and, separately, every call that
/// completed successfully.
#[derive(Default)]
pub(crate) struct FakeProvider {
    rules: Vec<Rule>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    attempted: Mutex<Vec<(String, Operation)>>,
    completed: Mutex<Vec<(String, Operation)>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail `operation` for every VM.
    pub(crate) fn fail(mut self, operation: Operation, reason: &str) -> Self {
        self.rules.push(Rule {
            operation,
            vm: None,
            behavior: Behavior::Fail(reason.to_string()),
        });
        self
    }

    /// Fail `operation` for one VM only.
    pub(crate) fn fail_for(mut self, vm: &str, operation: Operation, reason: &str) -> Self {
        self.rules.push(Rule {
            operation,
            vm: Some(vm.to_string()),
            behavior: Behavior::Fail(reason.to_string()),
        });
        self
    }

    /// Never answer `operation` for any VM.
    pub(crate) fn hang(mut self, operation: Operation) -> Self {
        self.rules.push(Rule {
            operation,
            vm: None,
            behavior: Behavior::Hang,
        });
        self
    }

    /// Delay every call by `latency` before answering.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of calls that were in flight at the same time.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn attempts(&self, vm: &str, operation: Operation) -> usize {
        Self::count(&self.attempted, vm, operation)
    }

    pub(crate) fn completions(&self, vm: &str, operation: Operation) -> usize {
        Self::count(&self.completed, vm, operation)
    }

    /// Operations attempted for `vm`, in call order.
    pub(crate) fn attempted_for(&self, vm: &str) -> Vec<Operation> {
        self.attempted
            .lock()
            .iter()
            .filter(|(name, _)| name == vm)
            .map(|(_, op)| *op)
            .collect()
    }

    pub(crate) fn total_attempts(&self) -> usize {
        self.attempted.lock().len()
    }

    fn count(calls: &Mutex<Vec<(String, Operation)>>, vm: &str, operation: Operation) -> usize {
        calls
            .lock()
            .iter()
            .filter(|(name, op)| name == vm && *op == operation)
            .count()
    }

    async fn call(&self, vm: &str, operation: Operation) -> VmfleetResult<()> {
        self.attempted.lock().push((vm.to_string(), operation));

        let _in_flight = InFlight::enter(self);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let rule = self.rules.iter().find(|rule| {
            rule.operation == operation && rule.vm.as_deref().is_none_or(|name| name == vm)
        });

        match rule.map(|rule| &rule.behavior) {
            Some(Behavior::Fail(reason)) => {
                Err(VmfleetError::provider(vm, operation.as_str(), reason.clone()))
            }
            Some(Behavior::Hang) => std::future::pending().await,
            None => {
                self.completed.lock().push((vm.to_string(), operation));
                Ok(())
            }
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(fake: &'a FakeProvider) -> Self {
        let now = fake.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        fake.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(&fake.in_flight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VirtualizationProvider for FakeProvider {
    async fn clone_vm(&self, request: &CloneRequest) -> VmfleetResult<()> {
        self.call(&request.vm, Operation::Clone).await
    }

    async fn create_disk(&self, request: &DiskRequest) -> VmfleetResult<()> {
        self.call(&request.vm, Operation::CreateDisk).await
    }

    async fn connect_adapter(&self, request: &AdapterRequest) -> VmfleetResult<()> {
        self.call(&request.vm, Operation::ConnectAdapter).await
    }

    async fn customize_network(&self, request: &NetworkRequest) -> VmfleetResult<()> {
        self.call(&request.vm, Operation::CustomizeNetwork).await
    }

    async fn power_on(&self, request: &PowerRequest) -> VmfleetResult<()> {
        self.call(&request.vm, Operation::PowerOn).await
    }
}
