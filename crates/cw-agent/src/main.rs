//! Clinical workflow agent CLI.
//!
//! Turns a free-text front-desk request into validated, guardrailed calls
//! against the healthcare backend, printing one outcome block per call and
//! appending every decision to the JSON Lines audit trail.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cw_agent::audit::{AuditSink, AuditSummary, JsonlAuditSink};
use cw_agent::config::AgentConfig;
use cw_agent::orchestrator::Orchestrator;
use cw_agent::report;
use cw_agent::resolver::{IntentResolver, OllamaResolver, RuleResolver, TieredResolver};
use cw_functions::{FunctionRegistry, MockHealthcareApi};
use cw_protocol::calls::{CallSource, ResolvedCall};
use cw_protocol::outcome::ExecutionOutcome;
use cw_protocol::request::{ExecutionMode, WorkflowRequest};

#[derive(Parser)]
#[command(name = "cw-agent")]
#[command(about = "Clinical workflow agent: scheduling, eligibility and patient lookup from plain language", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulate every call; nothing is persisted
    #[arg(long)]
    dry_run: bool,

    /// Confirm state-changing calls in this request
    #[arg(long)]
    confirm: bool,

    /// Who is submitting the request (recorded in the audit trail)
    #[arg(long)]
    actor: Option<String>,

    /// Print outcomes as JSON
    #[arg(long)]
    json: bool,

    /// Read requests line by line
    #[arg(short, long)]
    interactive: bool,

    /// The request, e.g. "Search for patient Ravi Kumar"
    #[arg(trailing_var_arg = true)]
    request: Vec<String>,
}

const HELP: &str = "\
commands:
  help        show this help
  functions   list the available workflow functions
  audit       summarize this session's audit records
  confirm     resubmit the calls waiting for confirmation
  quit, exit  leave
anything else is treated as a request";

/// State carried across interactive requests.
struct Session {
    orchestrator: Orchestrator,
    audit: Arc<JsonlAuditSink>,
    mode: ExecutionMode,
    actor: Option<String>,
    json: bool,
    request_ids: Vec<Uuid>,
    /// Calls pending confirmation from the last request, with its text.
    pending: Option<(String, Vec<ResolvedCall>)>,
}

impl Session {
    fn request(&self, text: &str, confirmed: bool) -> WorkflowRequest {
        let request = WorkflowRequest::new(text)
            .with_mode(self.mode)
            .with_confirmation(confirmed);
        match &self.actor {
            Some(actor) => request.with_actor(actor.clone()),
            None => request,
        }
    }

    async fn submit(&mut self, text: &str, confirmed: bool) -> anyhow::Result<()> {
        let request = self.request(text, confirmed);
        self.request_ids.push(request.id);
        let outcomes = self.orchestrator.process(&request).await?;
        self.finish(text, &outcomes)
    }

    async fn confirm(&mut self) -> anyhow::Result<()> {
        let Some((text, calls)) = self.pending.take() else {
            println!("nothing is waiting for confirmation");
            return Ok(());
        };
        let request = self.request(&text, true);
        self.request_ids.push(request.id);
        let calls = calls
            .into_iter()
            .map(|c| {
                ResolvedCall::new(c.function_name, c.arguments, CallSource::Caller)
                    .with_confidence(c.confidence)
            })
            .collect();
        let outcomes = self.orchestrator.process_resolved(&request, calls).await?;
        self.finish(&text, &outcomes)
    }

    fn finish(&mut self, text: &str, outcomes: &[ExecutionOutcome]) -> anyhow::Result<()> {
        let pending: Vec<ResolvedCall> = outcomes
            .iter()
            .filter_map(|o| o.pending_call.clone())
            .collect();
        self.pending = (!pending.is_empty()).then(|| (text.to_string(), pending));
        print_outcomes(outcomes, self.json)
    }

    async fn audit_summary(&self) -> anyhow::Result<()> {
        let records = self.audit.read_all().await?;
        let session: Vec<_> = records
            .iter()
            .filter(|r| self.request_ids.contains(&r.request_id))
            .collect();
        println!("{}", report::render_summary(&AuditSummary::from_records(session)));
        Ok(())
    }
}

fn print_outcomes(outcomes: &[ExecutionOutcome], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
    } else {
        println!("{}", report::render_outcomes(outcomes));
    }
    Ok(())
}

fn build_resolver(config: &AgentConfig) -> anyhow::Result<Arc<dyn IntentResolver>> {
    if !config.ollama.enabled {
        tracing::info!("ollama resolver disabled, using rules");
        return Ok(Arc::new(RuleResolver::new()));
    }
    tracing::info!(
        host = %config.ollama.host,
        model = %config.ollama.model,
        "ollama resolver enabled"
    );
    let model = OllamaResolver::new(config.ollama.clone())?;
    Ok(Arc::new(TieredResolver::new(
        Box::new(model),
        Box::new(RuleResolver::new()),
    )))
}

async fn interactive(session: &mut Session) -> anyhow::Result<()> {
    println!("clinical workflow agent ({} mode). type 'help' for commands.", session.mode);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "functions" => {
                println!("{}", report::render_catalog(&session.orchestrator.registry().exposed()))
            }
            "audit" => session.audit_summary().await?,
            "confirm" => session.confirm().await?,
            text => session.submit(text, false).await?,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cw-agent starting");

    let cli = Cli::parse();

    // ── Load config ─────────────────────────────────────────────
    let config = AgentConfig::load(cli.config.as_deref())?;
    let dry_run = cli.dry_run || config.dry_run;
    let mode = if dry_run {
        ExecutionMode::DryRun
    } else {
        ExecutionMode::Live
    };
    tracing::info!(
        audit_log = %config.audit_log_path.display(),
        mode = %mode,
        "config loaded"
    );

    // ── Wire the pipeline ───────────────────────────────────────
    let registry = Arc::new(FunctionRegistry::with_defaults()?);
    tracing::info!(function_count = registry.len(), "function registry initialized");

    let resolver = build_resolver(&config)?;
    let backend = Arc::new(MockHealthcareApi::new());
    let audit = Arc::new(JsonlAuditSink::new(&config.audit_log_path));
    let audit_sink: Arc<dyn AuditSink> = audit.clone();
    let orchestrator = Orchestrator::new(registry, resolver, backend, audit_sink);

    let mut session = Session {
        orchestrator,
        audit,
        mode,
        actor: cli.actor.or(config.actor),
        json: cli.json,
        request_ids: Vec::new(),
        pending: None,
    };

    let text = cli.request.join(" ");
    if cli.interactive || text.trim().is_empty() {
        interactive(&mut session).await?;
    } else {
        session.submit(&text, cli.confirm).await?;
    }

    tracing::info!("cw-agent done");
    Ok(())
}
