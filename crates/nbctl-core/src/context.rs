//! Per-invocation configuration handed to every stage call

/// Images rolled out by the stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    pub core: String,
    pub operator: String,
    pub db: String,
}

/// Command flags that change how stages behave
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployFlags {
    /// Give bucket claims a cleanup policy on the system instance
    pub use_obc_cleanup_policy: bool,
    /// Run the legacy standalone database instead of the database operator
    pub use_standalone_db: bool,
    /// Return right after the last stage is applied
    pub no_wait: bool,
    /// Also remove the namespace and the cluster-wide resource definitions
    /// (including the database operator's) on uninstall
    pub cleanup: bool,
    /// Remove bucket data together with the system instance
    pub cleanup_data: bool,
}

/// Everything a stage needs to know about the current run
///
/// Built once from settings and flags, then only borrowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployContext {
    pub namespace: String,
    pub system_name: String,
    pub images: ImageSet,
    pub flags: DeployFlags,
}

impl DeployContext {
    pub fn new(namespace: impl Into<String>, system_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            system_name: system_name.into(),
            ..Default::default()
        }
    }

    pub fn with_images(mut self, images: ImageSet) -> Self {
        self.images = images;
        self
    }

    pub fn with_flags(mut self, flags: DeployFlags) -> Self {
        self.flags = flags;
        self
    }
}
