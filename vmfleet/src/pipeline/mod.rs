//! Generic table-driven pipeline execution.
//!
//! ## Architecture
//!
//! ```text
//! ExecutionPlan → Tasks (strictly ordered)
//!
//! - ExecutionPlan: Ordered list of tasks sharing one context
//! - Task: Atomic unit of work; a failure aborts the rest of the plan
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pipeline::{ExecutionPlan, PipelineExecutor};
//! use tokio_util::sync::CancellationToken;
//!
//! let plan = ExecutionPlan::new(vec![Box::new(TaskA), Box::new(TaskB)]);
//! match PipelineExecutor::execute(plan, ctx, &CancellationToken::new()).await {
//!     Ok(metrics) => println!("pipeline took {}ms", metrics.total_duration_ms),
//!     Err(failure) => eprintln!("{} failed: {}", failure.task, failure.error),
//! }
//! ```

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod task;

pub use metrics::{PipelineMetrics, TaskMetrics};
pub use pipeline::{ExecutionPlan, PipelineExecutor, PipelineFailure};
pub use task::{BoxedTask, PipelineTask};
