// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mailbeads - email inbox triage for AI agents.
//!
//! This is the binary entry point for the `mb` command.

mod context;
mod display;
mod gmail;
mod init;
mod repair;
mod status;
mod sync;
mod triage;
mod views;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mailbeads_core::MailbeadsError;
use tracing::warn;

use crate::context::CommandContext;
use crate::display::Output;

/// mailbeads - email inbox triage for AI agents.
#[derive(Parser, Debug)]
#[command(name = "mb", version, about, long_about = None)]
struct Cli {
    /// Store path (default: nearest .mailbeads/mail.db).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress and hint lines.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the store in the current project.
    Init,
    /// Fetch new mail from every account.
    Sync {
        /// Ignore the stored high-water mark and search the default window.
        #[arg(long)]
        full: bool,
        /// Sync only this account.
        #[arg(long)]
        account: Option<String>,
        /// Search all mail, not just the inbox.
        #[arg(long)]
        include_spam: bool,
    },
    /// List threads without a triage decision.
    Untriaged {
        /// Only threads in this account.
        #[arg(long)]
        account: Option<String>,
        /// Maximum threads to list (0 for all).
        #[arg(short = 'n', long = "limit", default_value_t = 50)]
        limit: usize,
    },
    /// Record or update the triage decision for a thread.
    Triage(TriageArgs),
    /// Close triage items as done.
    Done {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
    /// Close triage items as dismissed.
    Dismiss {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
    /// Hide a triage item from `ready` until a time.
    Snooze {
        id: String,
        /// RFC 3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        until: String,
    },
    /// List triaged items.
    Inbox {
        /// Account substring.
        #[arg(long)]
        account: Option<String>,
        /// high, medium, low, or spam.
        #[arg(long)]
        priority: Option<String>,
        /// Include closed items.
        #[arg(long)]
        all: bool,
    },
    /// List unblocked items.
    Ready {
        /// Account substring.
        #[arg(long)]
        account: Option<String>,
    },
    /// Show a thread and its triage state.
    Show {
        thread: String,
        #[arg(long)]
        account: Option<String>,
        /// Headers only.
        #[arg(long)]
        no_body: bool,
    },
    /// Store statistics.
    Stats,
    /// Inbox overview: sync state, triage summary, and high-priority items.
    #[command(alias = "st")]
    Status {
        /// Skip the ready-item listing.
        #[arg(long)]
        no_ready: bool,
    },
    /// Create tracker issues for refs left by the legacy migration.
    Migrate {
        #[arg(long)]
        dry_run: bool,
    },
    /// Repair local refs against the issue tracker.
    Reconcile {
        #[arg(long)]
        dry_run: bool,
    },
    /// Query Gmail directly.
    Gmail {
        #[command(subcommand)]
        command: GmailCommand,
    },
}

#[derive(clap::Args, Debug)]
struct TriageArgs {
    thread: String,
    /// What to do about the thread.
    #[arg(long)]
    action: String,
    #[arg(long)]
    account: Option<String>,
    /// high, medium, low, or spam (default medium).
    #[arg(long)]
    priority: Option<String>,
    /// Suggested reply or next step.
    #[arg(long)]
    suggestion: Option<String>,
    #[arg(long)]
    agent_notes: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// Override the sender recorded for the thread.
    #[arg(long)]
    from: Option<String>,
    /// ID of the item this one is blocked by.
    #[arg(long, alias = "epic", value_name = "ID")]
    depends_on: Option<String>,
}

impl From<TriageArgs> for mailbeads_workflow::triage::TriageRequest {
    fn from(args: TriageArgs) -> Self {
        Self {
            thread_id: args.thread,
            account: args.account,
            priority: args.priority,
            action: args.action,
            suggestion: args.suggestion,
            agent_notes: args.agent_notes,
            category: args.category,
            from: args.from,
            depends_on: args.depends_on,
        }
    }
}

#[derive(Subcommand, Debug)]
enum GmailCommand {
    /// Search messages with a Gmail query.
    Search {
        query: String,
        #[arg(long)]
        account: Option<String>,
        #[arg(short = 'n', long = "max-results", default_value_t = 10)]
        max_results: u32,
    },
    /// Read one message by ID.
    Read {
        id: String,
        #[arg(long)]
        account: Option<String>,
    },
}

impl Commands {
    /// Whether the command reads or writes the store.
    fn needs_store(&self) -> bool {
        !matches!(self, Self::Init | Self::Gmail { .. })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("mb: cannot read working directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let project_dir = context::config_project_dir(cli.db.as_deref(), &cwd);
    let config = match mailbeads_config::load_and_validate(project_dir.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            mailbeads_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.general.log_level);

    let out = Output::detect(cli.json, cli.quiet);
    let mut ctx = CommandContext::new(config, out, cwd, cli.db);

    let result = run(cli.command, &mut ctx).await;
    if let Err(e) = ctx.close().await {
        warn!(error = %e, "failed to close store");
    }
    match result {
        Ok(code) => code,
        Err(e) => {
            out.failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Open the store when needed and dispatch.
async fn run(command: Commands, ctx: &mut CommandContext) -> Result<ExitCode, MailbeadsError> {
    if command.needs_store() {
        ctx.open_store().await?;
    }
    let ctx = &*ctx;

    match command {
        Commands::Init => init::run(ctx).await,
        Commands::Sync {
            full,
            account,
            include_spam,
        } => {
            let options = mailbeads_workflow::sync::SyncOptions {
                full,
                account,
                include_spam,
            };
            sync::run(ctx, &options).await
        }
        Commands::Untriaged { account, limit } => {
            views::untriaged(ctx, account.as_deref(), limit).await
        }
        Commands::Triage(args) => triage::triage(ctx, &args.into()).await,
        Commands::Done { ids } => triage::close(ctx, &ids, triage::CloseKind::Done).await,
        Commands::Dismiss { ids } => triage::close(ctx, &ids, triage::CloseKind::Dismiss).await,
        Commands::Snooze { id, until } => triage::snooze(ctx, &id, &until).await,
        Commands::Inbox {
            account,
            priority,
            all,
        } => views::inbox(ctx, account, priority.as_deref(), all).await,
        Commands::Ready { account } => views::ready(ctx, account.as_deref()).await,
        Commands::Show {
            thread,
            account,
            no_body,
        } => views::show(ctx, &thread, account.as_deref(), no_body).await,
        Commands::Stats => status::stats(ctx).await,
        Commands::Status { no_ready } => status::status(ctx, !no_ready).await,
        Commands::Migrate { dry_run } => repair::migrate(ctx, dry_run).await,
        Commands::Reconcile { dry_run } => repair::reconcile(ctx, dry_run).await,
        Commands::Gmail { command } => match command {
            GmailCommand::Search {
                query,
                account,
                max_results,
            } => gmail::search(ctx, &query, account.as_deref(), max_results).await,
            GmailCommand::Read { id, account } => gmail::read(ctx, &id, account.as_deref()).await,
        },
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins; otherwise the configured level applies to mailbeads
/// crates and everything else logs at warn.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailbeads={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
