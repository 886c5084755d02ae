//! kubectl-backed deployment stages
//!
//! Implements the orchestrator's stages and reports on top of the `kubectl`
//! binary:
//! - resource definitions from a manifest directory
//! - the platform operator from an embedded template
//! - the database operator from its release manifest
//! - the system custom resource

pub mod error;
pub mod inventory;
pub mod kubectl;
pub mod operator;
pub mod schema;
pub mod system;
pub mod templates;
pub mod versions;

pub use error::{KubeError, Result};
pub use inventory::ResourceListing;
pub use kubectl::Kubectl;
pub use operator::{OperatorSource, OperatorStage};
pub use schema::SchemaStage;
pub use system::SystemStage;
pub use templates::{ManifestTemplates, OPERATOR_DEPLOYMENT};
pub use versions::VersionReport;
