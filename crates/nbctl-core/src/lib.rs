//! nbctl core
//!
//! Stage contract, installation plan, readiness polling, confirmation gate
//! and the orchestrator that ties them together. Nothing in this crate talks
//! to a cluster; concrete stages live in `nbctl-kube`.

pub mod confirm;
pub mod context;
pub mod deployment;
pub mod error;
pub mod plan;
pub mod poller;
pub mod stage;

pub use confirm::{ConfirmationDecision, ConfirmationGate};
pub use context::{DeployContext, DeployFlags, ImageSet};
pub use deployment::{Deployment, Outcome};
pub use error::{BoxError, DeployError, Result};
pub use plan::{InstallationPlan, PlanOptions};
pub use poller::{PollPolicy, wait_until};
pub use stage::{Report, Stage, StageAction, StageKind};
