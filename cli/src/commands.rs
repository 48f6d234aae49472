//! Subcommand handlers
//!
//! [`App`] owns the wired services; each handler runs one use case and
//! prints its result as text or JSON.

use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use conclave_application::{
    AgentPool, ArtifactReviewer, AutonomyCycle, DeliberationEngine, EventLog, HeartbeatScheduler,
    JobQueue, ModelDecisionService, NoEventLog, OrchestrationConfig, ParentRef, ReasoningExecutor,
    Toolbox,
};
use conclave_domain::{DeliberationOutcome, Strategy, Task};
use conclave_infrastructure::{
    ConfigLoader, FileConfig, InMemoryJobQueue, JsonlEventLog, LocalToolbox, RoutingModelService,
    ShellJobRunner, model_service_from_config,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Services built from one loaded configuration.
pub struct App {
    model: Arc<RoutingModelService>,
    events: Arc<dyn EventLog>,
    orchestration: OrchestrationConfig,
    council: Arc<DeliberationEngine<RoutingModelService>>,
    executor: Arc<ReasoningExecutor<RoutingModelService>>,
}

impl App {
    pub fn build(config: &FileConfig) -> Result<Self> {
        let Some(model) = model_service_from_config(&config.models) else {
            bail!(
                "No model backend configured. Set `[models] command` (and tier lists) in conclave.toml, \
                 e.g.\n\n[models]\ncommand = \"llm\"\nargs = [\"-m\", \"{{model}}\"]\nbalanced = [\"gpt-5-mini\"]"
            );
        };
        let model = Arc::new(model);
        let events = event_log(config.logging.event_log.as_deref());
        let orchestration = config.to_orchestration_config();
        let safety = orchestration
            .safety_policy()
            .context("Invalid [safety] configuration")?;

        let council = Arc::new(
            DeliberationEngine::new(model.clone(), orchestration.council.clone())
                .with_event_log(events.clone()),
        );

        let tools = &config.tools;
        let mut toolbox = LocalToolbox::new(&orchestration.reasoning.working_dir)
            .with_shell_timeout(Duration::from_secs(tools.shell_timeout_secs))
            .with_max_output(tools.max_output_bytes);
        if let Some(dir) = &tools.notes_dir {
            toolbox = toolbox.with_notes_dir(dir);
        }
        if tools.enable_review {
            toolbox = toolbox.with_reviewer(council.clone() as Arc<dyn ArtifactReviewer>);
        }
        let toolbox: Arc<dyn Toolbox> = Arc::new(toolbox);
        info!("Tools available: {}", toolbox.capabilities().join(", "));

        let executor = Arc::new(
            ReasoningExecutor::new(
                model.clone(),
                toolbox,
                safety,
                orchestration.reasoning.clone(),
            )
            .with_event_log(events.clone()),
        );

        Ok(Self {
            model,
            events,
            orchestration,
            council,
            executor,
        })
    }

    pub async fn run(
        &self,
        goal: &str,
        strategy: Option<Strategy>,
        scope: &str,
        budget: f64,
        json: bool,
    ) -> Result<()> {
        let task = Task::new(goal).with_scope(scope).with_budget(budget);
        let outcome = self.executor.execute(&task, strategy).await;

        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("{}", outcome.answer);
            println!();
            println!(
                "[{} strategy, {} step(s), ${:.4}{}]",
                outcome.strategy,
                outcome.total_steps,
                outcome.cost,
                if outcome.is_degraded() { ", degraded" } else { "" }
            );
            if let Some(error) = &outcome.error {
                println!("[primary strategy failed: {}]", error);
            }
        }

        if !outcome.success {
            bail!("Task did not complete");
        }
        Ok(())
    }

    pub async fn swarm(
        &self,
        goals: Vec<String>,
        budget: f64,
        fraction: f64,
        scope: &str,
        json: bool,
    ) -> Result<()> {
        let pool = AgentPool::new(self.executor.clone(), self.orchestration.pool.clone())
            .with_event_log(self.events.clone());
        let parent = ParentRef::root(budget);
        for goal in goals {
            pool.spawn(Task::new(goal), scope, fraction, &parent);
        }

        let summary = pool.run_all().await;

        if json {
            let agents: Vec<_> = summary
                .results
                .values()
                .map(|run| {
                    serde_json::json!({
                        "id": run.id.to_string(),
                        "status": run.status.as_str(),
                        "success": run.result.success,
                        "output": run.result.output,
                        "cost": run.result.cost,
                        "steps": run.result.steps,
                        "error": run.result.error,
                    })
                })
                .collect();
            let report = serde_json::json!({
                "agents": agents,
                "batches": summary.batches,
                "succeeded": summary.succeeded(),
                "budget_allocated": pool.total_budget_allocated(),
                "budget_used": pool.total_budget_used(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for run in summary.results.values() {
                println!("== {} [{}] ==", run.id, run.status);
                match &run.result.error {
                    Some(error) if !run.result.success => println!("error: {}", error),
                    _ => println!("{}", run.result.output),
                }
                println!();
            }
            let reputation = pool.reputation().get(scope);
            println!(
                "{}/{} agent(s) succeeded in {} batch(es), ${:.4} of ${:.4} used, scope '{}' success rate {:.0}%",
                summary.succeeded(),
                summary.results.len(),
                summary.batches,
                pool.total_budget_used(),
                pool.total_budget_allocated(),
                scope,
                reputation.success_rate() * 100.0
            );
        }
        Ok(())
    }

    pub async fn deliberate(
        &self,
        file: &Path,
        refine: bool,
        context: Option<&str>,
        json: bool,
    ) -> Result<()> {
        let artifact = read_artifact(file).await?;
        let outcome = if refine {
            self.council.refine_code(&artifact, context).await
        } else {
            self.council.deliberate(&artifact, context).await
        }
        .context("Deliberation could not start")?;

        print_outcome(&outcome, json)?;
        if !outcome.passed {
            bail!("Council did not accept the artifact");
        }
        Ok(())
    }

    pub async fn heartbeat(&self, config: &FileConfig, once: bool, json: bool) -> Result<()> {
        let working_dir = &self.orchestration.reasoning.working_dir;
        let runner = Arc::new(ShellJobRunner::new(
            working_dir,
            Duration::from_secs(config.tools.shell_timeout_secs),
            config.tools.max_output_bytes,
        ));
        let safety = self
            .orchestration
            .safety_policy()
            .context("Invalid [safety] configuration")?;
        let queue: Arc<dyn JobQueue> = Arc::new(
            InMemoryJobQueue::from_config(&config.jobs, runner).with_safety(safety.clone()),
        );
        if config.jobs.is_empty() {
            warn!("No [[jobs]] configured; the autonomy cycle has nothing to run");
        }

        let autonomy = &self.orchestration.autonomy;
        let cycle = AutonomyCycle::new(
            queue,
            safety,
            autonomy.clone(),
            self.orchestration.convergence.clone(),
        )
        .with_decision_service(Arc::new(ModelDecisionService::new(
            self.model.clone(),
            autonomy.question_tier,
        )))
        .with_question_model(self.model.clone())
        .with_event_log(self.events.clone());

        let scheduler = Arc::new(
            HeartbeatScheduler::new(&self.orchestration.heartbeat).with_event_log(self.events.clone()),
        );
        scheduler.register("autonomy", Arc::new(cycle)).await;

        if once {
            let report = scheduler.run_cycle().await?;
            if json {
                let routines: Vec<_> = report
                    .outcomes
                    .iter()
                    .map(|o| match &o.result {
                        Ok(r) => serde_json::json!({
                            "routine": o.name,
                            "ok": true,
                            "summary": r.summary,
                            "score": r.score,
                        }),
                        Err(e) => serde_json::json!({
                            "routine": o.name,
                            "ok": false,
                            "error": e.to_string(),
                        }),
                    })
                    .collect();
                let out = serde_json::json!({
                    "routines": routines,
                    "next_in_secs": report.sleep.as_secs(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for outcome in &report.outcomes {
                    match &outcome.result {
                        Ok(r) => println!("{}: {}", outcome.name, r.summary),
                        Err(e) => println!("{}: failed: {}", outcome.name, e),
                    }
                }
                println!("next cycle in {}s", report.sleep.as_secs());
            }
            return Ok(());
        }

        let token = CancellationToken::new();
        let handle = scheduler.clone().start(token.clone());
        println!(
            "Heartbeat running every {}s. Press Ctrl-C to stop.",
            scheduler.interval().as_secs()
        );

        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Stopping heartbeat");
                token.cancel();
                handle.await.context("Heartbeat task failed")?;
            }
            disabled = wait_disabled(&scheduler) => disabled?,
        }
        Ok(())
    }
}

/// Resolves once the scheduler has disabled itself after a routine panic.
async fn wait_disabled(scheduler: &HeartbeatScheduler) -> Result<()> {
    loop {
        if scheduler.is_disabled() {
            bail!("Heartbeat disabled after a routine panicked");
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn event_log(path: Option<&str>) -> Arc<dyn EventLog> {
    match path {
        Some(path) => match JsonlEventLog::open(path) {
            Some(log) => {
                info!("Writing orchestration events to {}", path);
                Arc::new(log)
            }
            None => {
                warn!("Event log {} could not be opened; events are not recorded", path);
                Arc::new(NoEventLog)
            }
        },
        None => Arc::new(NoEventLog),
    }
}

async fn read_artifact(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read artifact from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

fn print_outcome(outcome: &DeliberationOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    for round in &outcome.rounds {
        println!(
            "-- round {}: consensus {:.2}, {} --",
            round.round, round.consensus, round.verdict
        );
        for vote in &round.votes {
            let stance = match (vote.veto, vote.approve) {
                (true, _) => "veto",
                (false, true) => "approve",
                (false, false) => "reject",
            };
            println!(
                "  {} ({:.2}) {}: {}",
                vote.persona, vote.weight, stance, vote.rationale
            );
        }
    }
    println!();
    if let Some(artifact) = outcome.artifact() {
        println!("{}", artifact);
        println!();
    }
    println!("[{}, ${:.4}]", outcome.summary(), outcome.total_cost);
    Ok(())
}

/// `conclave config`: where configuration comes from and what is wrong with it.
pub fn show_config(cli: &Cli, config: &FileConfig) {
    println!("Configuration sources (highest priority first):");
    if cli.no_config {
        println!("  (disabled by --no-config; built-in defaults only)");
    } else {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
    }

    println!();
    println!("Models:");
    match &config.models.command {
        Some(command) => println!("  command: {} {}", command, config.models.args.join(" ")),
        None => println!("  command: (not set)"),
    }
    for (tier, models) in config.models.tiers() {
        let names: Vec<&str> = models.iter().map(|m| m.as_str()).collect();
        println!("  {:<8} {}", tier, names.join(", "));
    }

    let issues = config.validate();
    println!();
    if issues.is_empty() {
        println!("No configuration issues.");
    } else {
        println!("Issues:");
        for issue in &issues {
            println!("  {}", issue);
        }
    }
}
