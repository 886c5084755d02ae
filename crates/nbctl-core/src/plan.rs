//! Installation plan
//!
//! The ordered set of stages selected for one invocation. Built once,
//! never mutated afterwards.

use crate::stage::{Stage, StageKind};
use std::fmt;
use std::sync::Arc;

/// Which optional stages take part in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    pub include_database_operator: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            include_database_operator: true,
        }
    }
}

#[derive(Clone)]
pub struct InstallationPlan {
    stages: Vec<Arc<dyn Stage>>,
}

impl InstallationPlan {
    /// Select and order stages
    ///
    /// Stages are sorted by their dependency key. When two stages share a
    /// kind, the first one given wins.
    pub fn build(available: &[Arc<dyn Stage>], options: PlanOptions) -> Self {
        let mut stages: Vec<Arc<dyn Stage>> = Vec::with_capacity(available.len());
        for stage in available {
            let kind = stage.kind();
            if kind == StageKind::DatabaseOperator && !options.include_database_operator {
                continue;
            }
            if stages.iter().any(|s| s.kind() == kind) {
                tracing::warn!("ignoring duplicate {} stage", kind);
                continue;
            }
            stages.push(Arc::clone(stage));
        }
        stages.sort_by_key(|s| s.kind());
        Self { stages }
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.stages.iter().any(|s| s.kind() == kind)
    }

    pub fn get(&self, kind: StageKind) -> Option<&Arc<dyn Stage>> {
        self.stages.iter().find(|s| s.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Dependencies first
    pub fn install_order(&self) -> impl Iterator<Item = &Arc<dyn Stage>> {
        self.stages.iter()
    }

    /// Exact reverse of [`install_order`](Self::install_order)
    pub fn teardown_order(&self) -> impl Iterator<Item = &Arc<dyn Stage>> {
        self.stages.iter().rev()
    }

    /// Database operator first, then the install order
    ///
    /// The system instance is the only dependent of the database operator,
    /// and it is upgraded last, so moving the database operator ahead keeps
    /// every dependency upgraded before its dependents.
    pub fn upgrade_order(&self) -> Vec<&Arc<dyn Stage>> {
        let (db, rest): (Vec<_>, Vec<_>) = self
            .stages
            .iter()
            .partition(|s| s.kind() == StageKind::DatabaseOperator);
        db.into_iter().chain(rest).collect()
    }
}

impl fmt::Debug for InstallationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationPlan")
            .field("stages", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeployContext;
    use crate::error::BoxError;
    use async_trait::async_trait;

    struct Noop(StageKind);

    #[async_trait]
    impl Stage for Noop {
        fn kind(&self) -> StageKind {
            self.0
        }
        async fn apply(&self, _ctx: &DeployContext) -> Result<(), BoxError> {
            Ok(())
        }
        async fn status(&self, _ctx: &DeployContext) -> Result<String, BoxError> {
            Ok(String::new())
        }
        async fn delete(&self, _ctx: &DeployContext) -> Result<(), BoxError> {
            Ok(())
        }
        async fn is_ready(&self, _ctx: &DeployContext) -> Result<bool, BoxError> {
            Ok(true)
        }
    }

    fn shuffled() -> Vec<Arc<dyn Stage>> {
        vec![
            Arc::new(Noop(StageKind::SystemInstance)),
            Arc::new(Noop(StageKind::DatabaseOperator)),
            Arc::new(Noop(StageKind::PlatformOperator)),
            Arc::new(Noop(StageKind::SchemaLayer)),
        ]
    }

    #[test]
    fn test_plan_sorts_by_dependency() {
        let plan = InstallationPlan::build(&shuffled(), PlanOptions::default());
        assert_eq!(plan.kinds(), StageKind::ALL.to_vec());
    }

    #[test]
    fn test_plan_without_database_operator() {
        let plan = InstallationPlan::build(
            &shuffled(),
            PlanOptions {
                include_database_operator: false,
            },
        );
        assert_eq!(
            plan.kinds(),
            vec![
                StageKind::SchemaLayer,
                StageKind::PlatformOperator,
                StageKind::SystemInstance
            ]
        );
        assert!(!plan.contains(StageKind::DatabaseOperator));
    }

    #[test]
    fn test_teardown_is_reverse_of_install() {
        for include in [true, false] {
            let plan = InstallationPlan::build(
                &shuffled(),
                PlanOptions {
                    include_database_operator: include,
                },
            );
            let install: Vec<_> = plan.install_order().map(|s| s.kind()).collect();
            let mut teardown: Vec<_> = plan.teardown_order().map(|s| s.kind()).collect();
            teardown.reverse();
            assert_eq!(install, teardown);
        }
    }

    #[test]
    fn test_upgrade_order() {
        let plan = InstallationPlan::build(&shuffled(), PlanOptions::default());
        let order: Vec<_> = plan.upgrade_order().iter().map(|s| s.kind()).collect();
        assert_eq!(
            order,
            vec![
                StageKind::DatabaseOperator,
                StageKind::SchemaLayer,
                StageKind::PlatformOperator,
                StageKind::SystemInstance
            ]
        );
    }

    #[test]
    fn test_duplicate_kind_keeps_first() {
        let mut stages = shuffled();
        stages.push(Arc::new(Noop(StageKind::SchemaLayer)));
        let plan = InstallationPlan::build(&stages, PlanOptions::default());
        assert_eq!(plan.len(), 4);
    }
}
