//! CLI surface (`assistantmd serve|rescan|run|chat|status`), standing in
//! for the HTTP API described in `spec.md` §6.

use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::app::bootstrap::{bootstrap, AppContext};
use crate::domain::chat::ChatSession;
use crate::domain::context::{parse_context_template, ContextTemplate};
use crate::domain::identifiers::{SessionId, VaultId, WorkflowGlobalId};
use crate::domain::scheduler::sync::SyncAction;
use crate::domain::workflow::Workflow;
use crate::domain::AppError;
use crate::engine::chat_executor::ChatExecutor;
use crate::engine::loader::{scan_and_load, WorkflowCache};
use crate::engine::scheduler_sync::{synchronize, SchedulerRuntime, WorkflowRunner};
use crate::engine::step_engine::StepEngine;
use crate::ports::{Clock, FileStateStore, JobStore, LlmClient, SecretsStore, Settings, SystemClock, VaultRepository};

#[derive(Parser)]
#[command(name = "assistantmd")]
#[command(version)]
#[command(about = "Workflow & context orchestration engine for LLM agents over markdown vaults", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rescan all vaults, start the scheduler, and block until interrupted.
    Serve,
    /// Rescan all vaults and report what was loaded, without scheduling anything.
    Rescan,
    /// Run a single workflow immediately, bypassing its schedule.
    Run {
        /// Vault directory name.
        vault: String,
        /// Workflow path, vault-relative, without the `.md` extension (e.g. `Workflows/daily-digest`).
        workflow: String,
    },
    /// Send one chat message and print the reply.
    Chat {
        /// Vault directory name.
        vault: String,
        /// Model alias configured in `system/settings.yaml`.
        model: String,
        /// The message to send.
        message: String,
        /// Context template name (without `.md`), resolved under the
        /// vault's `AssistantMD/ContextTemplates/`.
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Report loaded workflows, load failures, and scheduled job counts.
    Status,
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Serve => serve().await,
        Commands::Rescan => rescan().await,
        Commands::Run { vault, workflow } => run_workflow(&vault, &workflow).await,
        Commands::Chat { vault, model, message, template } => chat(&vault, &model, &message, template.as_deref()).await,
        Commands::Status => status().await,
    }
}

async fn rescan() -> Result<(), AppError> {
    let ctx = bootstrap().await?;
    let cache = WorkflowCache::default();
    let report = scan_and_load(&ctx.repo, &cache).await?;

    println!("loaded {} workflow(s)", report.workflows.len());
    for failure in &report.failures {
        println!("failed to parse {}: {}", failure.global_id, failure.error);
    }
    Ok(())
}

async fn status() -> Result<(), AppError> {
    let ctx = bootstrap().await?;
    let cache = WorkflowCache::default();
    let report = scan_and_load(&ctx.repo, &cache).await?;
    let jobs = ctx.job_store.list().await?;

    println!("workflows: {} loaded, {} failed to parse", report.workflows.len(), report.failures.len());
    println!("scheduled jobs: {}", jobs.len());
    Ok(())
}

async fn run_workflow(vault: &str, workflow: &str) -> Result<(), AppError> {
    let ctx = bootstrap().await?;
    let vault_id = VaultId::new(vault)?;
    let cache = WorkflowCache::default();
    scan_and_load(&ctx.repo, &cache).await?;

    let global_id = WorkflowGlobalId::new(&vault_id, workflow);
    let workflow = cache.get(&global_id).ok_or_else(|| AppError::NotFound(global_id.to_string()))?;

    let engine = StepEngine::new(&ctx.repo, &ctx.file_state_store, &ctx.secrets_store, &*ctx.llm);
    let report = engine.run(&workflow, &vault_id, &ctx.settings, Utc::now()).await;

    for section in &report.sections {
        println!("{}: {:?}", section.section_name, section.outcome);
    }
    Ok(())
}

/// Vault-local template resolution only: `AssistantMD/ContextTemplates/` is
/// the vault-relative subtree `spec.md` §6 names for this vault. There is
/// currently no adapter that resolves the global `system/ContextTemplates/`
/// fallback `spec.md` also describes, since `VaultRepository` is rooted at
/// the data root, not the system root; that fallback is left unimplemented.
async fn load_template(ctx: &AppContext, vault: &str, name: &str) -> Result<(ContextTemplate, String), AppError> {
    let path = format!("AssistantMD/ContextTemplates/{name}.md");
    let content = ctx.repo.read_file(vault, &path).await?;
    let template = parse_context_template(&content)?;
    Ok((template, path))
}

async fn chat(vault: &str, model: &str, message: &str, template: Option<&str>) -> Result<(), AppError> {
    let ctx = bootstrap().await?;
    let vault_id = VaultId::new(vault)?;
    let mut session = ChatSession::new(SessionId::generate(), vault_id, model);

    let loaded = match template {
        Some(name) => Some(load_template(&ctx, vault, name).await?),
        None => None,
    };
    let template_arg = loaded.as_ref().map(|(template, path)| (template, path.as_str()));

    let executor = ChatExecutor::new(&ctx.repo, &ctx.context_store, &ctx.secrets_store, &*ctx.llm);
    let outcome = executor.run_turn(&mut session, template_arg, message, &ctx.settings, Utc::now()).await?;

    println!("{}", outcome.reply);
    println!("(transcript: {})", outcome.transcript_path);
    Ok(())
}

async fn serve() -> Result<(), AppError> {
    let ctx = bootstrap().await?;
    let cache = Arc::new(WorkflowCache::default());
    scan_and_load(&ctx.repo, &cache).await?;

    let AppContext { repo, file_state_store, secrets_store, job_store, llm, settings, .. } = ctx;
    let runner: Arc<dyn WorkflowRunner> = Arc::new(ScheduledRunner {
        cache: cache.clone(),
        repo: Arc::new(repo),
        file_state: Arc::new(file_state_store),
        secrets: Arc::new(secrets_store),
        llm,
        settings,
    });

    let mut scheduler = SchedulerRuntime::new().await?;
    let clock = SystemClock;
    let actions = synchronize(&cache, &job_store, &scheduler, runner, &clock).await?;
    info!(actions = actions.len(), "initial_sync_complete");
    log_actions(&actions);

    scheduler.resume().await?;
    info!("scheduler_started");

    tokio::signal::ctrl_c().await.map_err(|err| AppError::Io(err))?;
    info!("shutdown_requested");
    scheduler.shutdown().await?;
    Ok(())
}

fn log_actions(actions: &[SyncAction]) {
    for action in actions {
        match action {
            SyncAction::Add { job_id, .. } => println!("scheduled {job_id}"),
            SyncAction::Update { job_id, .. } => println!("rescheduled {job_id}"),
            SyncAction::Remove { job_id } => println!("unscheduled {job_id}"),
        }
    }
}

/// Looks up a workflow's current definition in the shared cache and runs it
/// through the Step Workflow Engine; wired into the scheduler at `serve` time.
struct ScheduledRunner {
    cache: Arc<WorkflowCache>,
    repo: Arc<dyn VaultRepository>,
    file_state: Arc<dyn FileStateStore>,
    secrets: Arc<dyn SecretsStore>,
    llm: Arc<dyn LlmClient>,
    settings: Settings,
}

#[async_trait::async_trait]
impl WorkflowRunner for ScheduledRunner {
    async fn run(&self, workflow_id: WorkflowGlobalId) {
        let Some(workflow) = self.cache.get(&workflow_id) else {
            warn!(workflow_id = %workflow_id, "scheduled_workflow_missing_from_cache");
            return;
        };
        let Some(vault_id) = vault_of(&workflow) else {
            warn!(workflow_id = %workflow_id, "scheduled_workflow_has_no_vault_prefix");
            return;
        };

        let engine = StepEngine::new(&*self.repo, &*self.file_state, &*self.secrets, &*self.llm);
        let report = engine.run(&workflow, &vault_id, &self.settings, Utc::now()).await;
        info!(workflow_id = %workflow_id, sections = report.sections.len(), "scheduled_workflow_ran");
    }
}

fn vault_of(workflow: &Workflow) -> Option<VaultId> {
    let (vault, _) = workflow.global_id.as_str().split_once('/')?;
    VaultId::new(vault).ok()
}
