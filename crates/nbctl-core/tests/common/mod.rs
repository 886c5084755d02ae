use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, PollPolicy, Report, Stage, StageKind};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Apply,
    Upgrade,
    Status,
    Delete,
    Ready,
}

/// Shared record of every stage call, in call order
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(Call, StageKind)>>>);

#[allow(dead_code)]
impl CallLog {
    pub fn push(&self, action: Call, kind: StageKind) {
        self.0.lock().unwrap().push((action, kind));
    }

    pub fn calls(&self) -> Vec<(Call, StageKind)> {
        self.0.lock().unwrap().clone()
    }

    /// Kinds touched by one action, in order
    pub fn kinds(&self, action: Call) -> Vec<StageKind> {
        self.calls()
            .into_iter()
            .filter(|(a, _)| *a == action)
            .map(|(_, k)| k)
            .collect()
    }

    pub fn position(&self, action: Call, kind: StageKind) -> Option<usize> {
        self.calls().iter().position(|c| *c == (action, kind))
    }

    pub fn count(&self, action: Call, kind: StageKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == (action, kind))
            .count()
    }
}

pub struct FakeStage {
    kind: StageKind,
    log: CallLog,
    /// Ready from this check on; `None` never becomes ready
    ready_after: Option<u32>,
    checks: AtomicU32,
    fail_on: Option<Call>,
    manifest: Option<String>,
}

#[allow(dead_code)]
impl FakeStage {
    pub fn new(kind: StageKind, log: &CallLog) -> Self {
        Self {
            kind,
            log: log.clone(),
            ready_after: Some(1),
            checks: AtomicU32::new(0),
            fail_on: None,
            manifest: None,
        }
    }

    pub fn ready_after(mut self, checks: u32) -> Self {
        self.ready_after = Some(checks);
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }

    pub fn failing(mut self, action: Call) -> Self {
        self.fail_on = Some(action);
        self
    }

    pub fn with_manifest(mut self, manifest: &str) -> Self {
        self.manifest = Some(manifest.to_string());
        self
    }

    fn record(&self, action: Call) -> Result<(), BoxError> {
        self.log.push(action, self.kind);
        if self.fail_on == Some(action) {
            return Err(format!("{} {action:?} exploded", self.kind).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for FakeStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn apply(&self, _ctx: &DeployContext) -> Result<(), BoxError> {
        self.record(Call::Apply)
    }

    async fn upgrade(&self, _ctx: &DeployContext) -> Result<(), BoxError> {
        self.record(Call::Upgrade)
    }

    async fn status(&self, _ctx: &DeployContext) -> Result<String, BoxError> {
        self.record(Call::Status)?;
        Ok(format!("{} ok", self.kind))
    }

    async fn delete(&self, _ctx: &DeployContext) -> Result<(), BoxError> {
        self.record(Call::Delete)
    }

    async fn is_ready(&self, _ctx: &DeployContext) -> Result<bool, BoxError> {
        self.log.push(Call::Ready, self.kind);
        let check = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.ready_after.is_some_and(|n| check >= n))
    }

    async fn render(&self, _ctx: &DeployContext) -> Result<Option<String>, BoxError> {
        Ok(self.manifest.clone())
    }
}

pub struct FakeReport {
    pub title: String,
    pub body: Result<String, String>,
}

#[async_trait]
impl Report for FakeReport {
    fn title(&self) -> &str {
        &self.title
    }

    async fn render(&self, _ctx: &DeployContext) -> Result<String, BoxError> {
        self.body.clone().map_err(Into::into)
    }
}

/// Every stage ready on the first check
#[allow(dead_code)]
pub fn all_stages(log: &CallLog) -> Vec<Arc<dyn Stage>> {
    StageKind::ALL
        .iter()
        .map(|k| Arc::new(FakeStage::new(*k, log)) as Arc<dyn Stage>)
        .collect()
}

/// One second interval, one minute bound
#[allow(dead_code)]
pub fn quick_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_secs(1), Some(Duration::from_secs(60)))
}
