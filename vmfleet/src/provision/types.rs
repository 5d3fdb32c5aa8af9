//! Types for the per-server provisioning pipeline.

use crate::config::ServerDescriptor;
use crate::pipeline::PipelineMetrics;
use crate::provider::{Operation, VirtualizationProvider};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

/// One unit of provisioning work, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    Clone,
    CreateDisk,
    ConnectAdapter,
    AssignNetwork,
    PowerOn,
}

impl ProvisioningStep {
    /// Every step, in the only order they may run.
    pub const ALL: [ProvisioningStep; 5] = [
        ProvisioningStep::Clone,
        ProvisioningStep::CreateDisk,
        ProvisioningStep::ConnectAdapter,
        ProvisioningStep::AssignNetwork,
        ProvisioningStep::PowerOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::Clone => "clone",
            ProvisioningStep::CreateDisk => "create_disk",
            ProvisioningStep::ConnectAdapter => "connect_adapter",
            ProvisioningStep::AssignNetwork => "assign_network",
            ProvisioningStep::PowerOn => "power_on",
        }
    }

    /// Step whose task is named `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.as_str() == name)
    }

    /// Control-plane operation issued by this step.
    pub fn operation(&self) -> Operation {
        match self {
            ProvisioningStep::Clone => Operation::Clone,
            ProvisioningStep::CreateDisk => Operation::CreateDisk,
            ProvisioningStep::ConnectAdapter => Operation::ConnectAdapter,
            ProvisioningStep::AssignNetwork => Operation::CustomizeNetwork,
            ProvisioningStep::PowerOn => Operation::PowerOn,
        }
    }

    /// State a server is in while this step runs.
    pub fn running_state(&self) -> ServerState {
        match self {
            ProvisioningStep::Clone => ServerState::Cloning,
            ProvisioningStep::CreateDisk => ServerState::DiskAttaching,
            ProvisioningStep::ConnectAdapter => ServerState::AdapterConnecting,
            ProvisioningStep::AssignNetwork => ServerState::NetworkAssigning,
            ProvisioningStep::PowerOn => ServerState::PoweringOn,
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-server provisioning state machine.
///
/// ```text
/// NotStarted → Cloning → DiskAttaching → AdapterConnecting
///            → NetworkAssigning → PoweringOn → Succeeded
///
/// any running state ──→ Failed(step)
/// ```
///
/// Strictly linear: no transition re-enters an earlier state, and both
/// `Succeeded` and `Failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum ServerState {
    NotStarted,
    Cloning,
    DiskAttaching,
    AdapterConnecting,
    NetworkAssigning,
    PoweringOn,
    Succeeded,
    Failed(ProvisioningStep),
}

impl ServerState {
    fn ordinal(&self) -> u8 {
        match self {
            ServerState::NotStarted => 0,
            ServerState::Cloning => 1,
            ServerState::DiskAttaching => 2,
            ServerState::AdapterConnecting => 3,
            ServerState::NetworkAssigning => 4,
            ServerState::PoweringOn => 5,
            ServerState::Succeeded => 6,
            ServerState::Failed(_) => 7,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerState::Succeeded | ServerState::Failed(_))
    }

    /// Step being executed in this state, if any.
    pub fn running_step(&self) -> Option<ProvisioningStep> {
        ProvisioningStep::ALL
            .into_iter()
            .find(|step| step.running_state() == *self)
    }

    /// Validate and return the next state.
    pub fn transition(self, next: ServerState) -> VmfleetResult<ServerState> {
        let allowed = match next {
            ServerState::Failed(step) => self.running_step() == Some(step),
            _ => !self.is_terminal() && next.ordinal() == self.ordinal() + 1,
        };

        if allowed {
            Ok(next)
        } else {
            Err(VmfleetError::Internal(format!(
                "illegal provisioning transition {:?} -> {:?}",
                self, next
            )))
        }
    }
}

/// Shared context of one server's pipeline run.
pub struct ProvisionContext {
    pub server: Arc<ServerDescriptor>,
    pub provider: Arc<dyn VirtualizationProvider>,
    /// Upper bound for every provider call made by a task.
    pub call_timeout: Duration,
    state: Mutex<ServerState>,
}

impl ProvisionContext {
    pub fn new(
        server: Arc<ServerDescriptor>,
        provider: Arc<dyn VirtualizationProvider>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            server,
            provider,
            call_timeout,
            state: Mutex::new(ServerState::NotStarted),
        }
    }

    pub fn state(&self) -> ServerState {
        *self.state.lock()
    }

    pub fn advance(&self, next: ServerState) -> VmfleetResult<()> {
        let mut state = self.state.lock();
        *state = state.transition(next)?;
        Ok(())
    }
}

/// The step a server's pipeline stopped at, and why.
#[derive(Debug)]
pub struct StepFailure {
    pub step: ProvisioningStep,
    pub error: VmfleetError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

impl Serialize for StepFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("StepFailure", 3)?;
        s.serialize_field("step", &self.step)?;
        s.serialize_field("kind", &self.error.kind())?;
        s.serialize_field("message", &self.error.to_string())?;
        s.end()
    }
}

/// Final result of provisioning one server.
#[derive(Debug, Serialize)]
pub struct ProvisioningOutcome {
    pub server: String,
    pub state: ServerState,
    /// Steps that finished successfully, in order.
    pub completed_steps: Vec<ProvisioningStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    pub metrics: PipelineMetrics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProvisioningOutcome {
    pub fn is_success(&self) -> bool {
        self.state == ServerState::Succeeded
    }

    pub fn failed_step(&self) -> Option<ProvisioningStep> {
        self.failure.as_ref().map(|f| f.step)
    }

    pub fn error(&self) -> Option<&VmfleetError> {
        self.failure.as_ref().map(|f| &f.error)
    }
}
