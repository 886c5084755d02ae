//! Deployment orchestrator
//!
//! Sequences install, upgrade, uninstall and status across the stages of an
//! [`InstallationPlan`]. Stages do the cluster work; this module only decides
//! order, waits for readiness and reports.

use crate::confirm::ConfirmationGate;
use crate::context::DeployContext;
use crate::error::{DeployError, Result};
use crate::plan::{InstallationPlan, PlanOptions};
use crate::poller::{PollPolicy, wait_until};
use crate::stage::{Report, Stage, StageAction, StageKind};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

/// How a mutating run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The system instance reported ready
    Ready,
    /// Changes were applied without waiting for readiness
    Applied,
    /// The system instance was applied but its bounded readiness wait
    /// expired; the cluster keeps converging without us
    NotReady { what: String },
    /// An operator never became ready, so the system instance was left
    /// untouched; nothing will converge until the command is re-run
    NotApplied { waiting_on: String },
}

pub struct Deployment {
    stages: Vec<Arc<dyn Stage>>,
    versions: Option<Arc<dyn Report>>,
    inventories: Vec<Arc<dyn Report>>,
    readiness: PollPolicy,
    settle: Duration,
}

impl Deployment {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages,
            versions: None,
            inventories: Vec::new(),
            readiness: PollPolicy::default(),
            settle: Duration::from_secs(3),
        }
    }

    pub fn with_versions(mut self, report: Arc<dyn Report>) -> Self {
        self.versions = Some(report);
        self
    }

    pub fn with_inventory(mut self, report: Arc<dyn Report>) -> Self {
        self.inventories.push(report);
        self
    }

    pub fn with_readiness(mut self, policy: PollPolicy) -> Self {
        self.readiness = policy;
        self
    }

    /// Pause between the system upgrade and the first readiness check
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Plan honouring the standalone-database flag
    pub fn plan(&self, ctx: &DeployContext) -> InstallationPlan {
        InstallationPlan::build(
            &self.stages,
            PlanOptions {
                include_database_operator: !ctx.flags.use_standalone_db,
            },
        )
    }

    /// Plan with every stage, used for teardown
    fn full_plan(&self) -> InstallationPlan {
        InstallationPlan::build(&self.stages, PlanOptions::default())
    }

    /// Install the platform
    ///
    /// Operators are applied and must be ready before the system instance is
    /// created.
    pub async fn install(&self, ctx: &DeployContext) -> Result<Outcome> {
        let plan = self.plan(ctx);
        tracing::info!(?plan, namespace = %ctx.namespace, "install");

        self.report_versions(ctx).await;
        print_namespace(ctx);

        for stage in plan
            .install_order()
            .filter(|s| s.kind() != StageKind::SystemInstance)
        {
            self.apply(stage, ctx, StageAction::Apply).await?;
        }

        if let Some(waiting_on) = self.wait_for_operators(&plan, ctx).await? {
            self.status_report(&plan, ctx, false).await;
            return Ok(Outcome::NotApplied { waiting_on });
        }

        let Some(system) = plan.get(StageKind::SystemInstance) else {
            return Ok(Outcome::Applied);
        };
        self.apply(system, ctx, StageAction::Apply).await?;

        if ctx.flags.no_wait {
            println!("{}", "NOTE:".yellow().bold());
            println!("  - This command has finished applying changes to the cluster.");
            println!(
                "  - The installation is still in progress. You can monitor using the 'nbctl status' command."
            );
            return Ok(Outcome::Applied);
        }

        print_wait_note();
        println!();
        println!("{}", "System Wait Ready:".bold());
        self.finish(system, &plan, ctx).await
    }

    /// Upgrade every stage to the configured versions
    pub async fn upgrade(&self, ctx: &DeployContext) -> Result<Outcome> {
        let plan = self.plan(ctx);
        tracing::info!(?plan, namespace = %ctx.namespace, "upgrade");

        println!("{}", "System versions prior to upgrade:".bold());
        self.report_versions(ctx).await;
        print_namespace(ctx);

        let mut system = None;
        for stage in plan.upgrade_order() {
            if stage.kind() == StageKind::SystemInstance {
                system = Some(stage);
                continue;
            }
            self.apply(stage, ctx, StageAction::Upgrade).await?;
        }

        let Some(system) = system else {
            return Ok(Outcome::Applied);
        };

        if let Some(waiting_on) = self.wait_for_operators(&plan, ctx).await? {
            self.status_report(&plan, ctx, false).await;
            return Ok(Outcome::NotApplied { waiting_on });
        }
        self.apply(system, ctx, StageAction::Upgrade).await?;

        print_wait_note();
        println!();
        println!("{}", "Waiting for the system to be ready...".bold());
        // the system can still carry its pre-upgrade Ready phase
        tokio::time::sleep(self.settle).await;
        self.finish(system, &plan, ctx).await
    }

    /// Tear the platform down in reverse dependency order
    ///
    /// With `cleanup` the gate runs first; declining aborts before anything
    /// is deleted. Without it the resource definitions stay and their status
    /// is reported instead.
    pub async fn uninstall<R: BufRead, W: Write>(
        &self,
        ctx: &DeployContext,
        gate: &mut ConfirmationGate<R, W>,
    ) -> Result<()> {
        let cleanup = ctx.flags.cleanup;
        if cleanup {
            if let Err(e) = gate.confirm() {
                println!(
                    "{}",
                    "Will not uninstall as removing the CRDs (cluster scope) was declined."
                        .red()
                );
                return Err(e);
            }
            println!("{}", "Will remove CRD (cluster scope)".yellow());
        }

        let plan = self.full_plan();
        tracing::info!(?plan, namespace = %ctx.namespace, cleanup, "uninstall");

        self.report_versions(ctx).await;
        print_namespace(ctx);

        for stage in plan.teardown_order() {
            let kind = stage.kind();
            if kind == StageKind::SchemaLayer && !cleanup {
                println!(
                    "{} {}",
                    format!("{kind} Delete:").bold(),
                    "currently disabled (enable with \"--cleanup\")".dimmed()
                );
                self.print_stage_status(stage, ctx).await;
                println!();
                continue;
            }

            println!("{}", format!("{kind} Delete:").bold());
            stage
                .delete(ctx)
                .await
                .map_err(|e| DeployError::stage(kind, StageAction::Delete, e))?;
            println!("  {} {kind} deleted", "✓".green());
            println!();
        }

        println!("{}", "✓ Uninstall finished".green().bold());
        Ok(())
    }

    /// Read-only report of every stage and resource inventory
    pub async fn status(&self, ctx: &DeployContext) -> Outcome {
        let plan = self.plan(ctx);
        self.status_report(&plan, ctx, true).await
    }

    /// Offline manifests of every stage that can render them
    pub async fn render_yaml(&self, ctx: &DeployContext) -> Result<String> {
        let plan = self.plan(ctx);
        let mut documents = Vec::new();

        for stage in plan.install_order() {
            let kind = stage.kind();
            tracing::info!("dumping {kind} yamls");
            match stage
                .render(ctx)
                .await
                .map_err(|e| DeployError::stage(kind, StageAction::Render, e))?
            {
                Some(manifest) => documents.push(manifest.trim().to_string()),
                None => tracing::info!("{kind} has no offline manifests, skipped"),
            }
        }

        let mut yaml = documents.join("\n---\n");
        if !yaml.is_empty() {
            yaml.push('\n');
        }
        Ok(yaml)
    }

    async fn apply(
        &self,
        stage: &Arc<dyn Stage>,
        ctx: &DeployContext,
        action: StageAction,
    ) -> Result<()> {
        let kind = stage.kind();
        let label = match action {
            StageAction::Upgrade => "Upgrade",
            _ => "Create",
        };
        println!("{}", format!("{kind} {label}:").bold());

        let result = match action {
            StageAction::Upgrade => stage.upgrade(ctx).await,
            _ => stage.apply(ctx).await,
        };
        result.map_err(|e| DeployError::stage(kind, action, e))?;

        println!("  {} {kind} applied", "✓".green());
        println!();
        Ok(())
    }

    /// Wait for every operator in the plan
    ///
    /// Returns the name of the first stage that timed out.
    async fn wait_for_operators(
        &self,
        plan: &InstallationPlan,
        ctx: &DeployContext,
    ) -> Result<Option<String>> {
        for stage in plan.install_order().filter(|s| s.kind().gates_system()) {
            println!("Waiting for {} to be ready...", stage.kind());
            if let Some(what) = self.wait_ready(stage, ctx).await? {
                return Ok(Some(what));
            }
        }
        Ok(None)
    }

    /// Wait on the system, then report; a timeout still reports
    async fn finish(
        &self,
        system: &Arc<dyn Stage>,
        plan: &InstallationPlan,
        ctx: &DeployContext,
    ) -> Result<Outcome> {
        match self.wait_ready(system, ctx).await? {
            None => {
                println!();
                println!();
                Ok(self.status_report(plan, ctx, true).await)
            }
            Some(what) => {
                self.status_report(plan, ctx, false).await;
                Ok(Outcome::NotReady { what })
            }
        }
    }

    /// `Ok(None)` when ready, `Ok(Some(name))` when the bounded wait expired
    async fn wait_ready(
        &self,
        stage: &Arc<dyn Stage>,
        ctx: &DeployContext,
    ) -> Result<Option<String>> {
        let what = stage.kind().to_string();
        match wait_until(&self.readiness, &what, move || stage.is_ready(ctx)).await {
            Ok(attempts) => {
                println!("  {} {what} is ready", "✓".green());
                tracing::debug!(%what, attempts, "readiness reached");
                Ok(None)
            }
            Err(e) if !e.is_fatal() => {
                println!("  {} {e}", "⚠".yellow());
                Ok(Some(what))
            }
            Err(e) => Err(e),
        }
    }

    async fn status_report(
        &self,
        plan: &InstallationPlan,
        ctx: &DeployContext,
        wait: bool,
    ) -> Outcome {
        self.report_versions(ctx).await;
        print_namespace(ctx);

        for stage in plan
            .install_order()
            .filter(|s| s.kind() != StageKind::SystemInstance)
        {
            println!("{}", format!("{} Status:", stage.kind()).bold());
            self.print_stage_status(stage, ctx).await;
            println!();
        }

        let mut outcome = Outcome::Ready;
        if let Some(system) = plan.get(StageKind::SystemInstance) {
            if wait {
                println!("{}", "System Wait Ready:".bold());
                match self.wait_ready(system, ctx).await {
                    Ok(None) => {}
                    Ok(Some(what)) => outcome = Outcome::NotReady { what },
                    Err(e) => println!("  {} {e}", "⚠".yellow()),
                }
                println!();
            }
            println!("{}", "System Status:".bold());
            self.print_stage_status(system, ctx).await;
            println!();
        }

        for report in &self.inventories {
            print_banner(report.title());
            match report.render(ctx).await {
                Ok(text) => println!("{}", text.trim_end()),
                Err(e) => println!("  {} {}: {e}", "⚠".yellow(), report.title()),
            }
            println!();
        }

        outcome
    }

    async fn print_stage_status(&self, stage: &Arc<dyn Stage>, ctx: &DeployContext) {
        match stage.status(ctx).await {
            Ok(text) => println!("{}", text.trim_end()),
            Err(e) => {
                let err = DeployError::stage(stage.kind(), StageAction::Status, e);
                println!("  {} {err}", "⚠".yellow());
            }
        }
    }

    async fn report_versions(&self, ctx: &DeployContext) {
        if let Some(versions) = &self.versions {
            match versions.render(ctx).await {
                Ok(text) => println!("{}", text.trim_end()),
                Err(e) => println!("  {} versions unavailable: {e}", "⚠".yellow()),
            }
        }
    }
}

fn print_namespace(ctx: &DeployContext) {
    println!("Namespace: {}", ctx.namespace.cyan());
    println!();
}

fn print_wait_note() {
    println!();
    println!("{}", "NOTE:".yellow().bold());
    println!("  - This command has finished applying changes to the cluster.");
    println!("  - From now on, it only loops and reads the status, to monitor the operator work.");
    println!("  - You may Ctrl-C at any time to stop the loop and watch it manually.");
}

fn print_banner(title: &str) {
    let line = format!("#{}#", "-".repeat(title.chars().count() + 4));
    println!("{line}");
    println!("#- {title} -#");
    println!("{line}");
    println!();
}
