//! nbctl cloud
//!
//! Provider-neutral pieces shared by cloud provisioners: the error taxonomy
//! and polling of long-running operations.
//!
//! # Supported Providers
//!
//! - **Azure**: storage accounts and blob containers (`nbctl-cloud-azure`)

pub mod error;
pub mod operation;

pub use error::{CloudError, Result};
pub use operation::{
    LongRunningOperation, OperationPoller, OperationState, PollConfig, poll_until_done,
};
