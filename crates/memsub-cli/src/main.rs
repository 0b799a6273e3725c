mod memory_cmds;

use std::io;
use std::io::IsTerminal;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use memsub_config::AppConfig;
use memsub_engine::{Engine, SystemClock, SystemTokenRng};
use memsub_policy::{default_policy, PolicyDocument, PolicyEngine};
use memsub_store::Store;

#[derive(Debug, Parser)]
#[command(name = "memsub", version, about = "Policy-governed user-memory substrate")]
struct Cli {
    #[arg(long, default_value = "config/memsub.toml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print effective store/config stats.
    Stats,
    /// Legacy scope/value-shape memories.
    V1 {
        #[command(subcommand)]
        command: V1Commands,
    },
    /// Typed-lifecycle memory objects.
    V2 {
        #[command(subcommand)]
        command: V2Commands,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScope {
    Preferences,
    Constraints,
    Communication,
    Accessibility,
    Schedule,
    Attention,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSource {
    ExplicitUserInput,
    InferredFromConversation,
    ImportedProfile,
    SystemDefault,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScopeType {
    User,
    Org,
    App,
    Session,
    Project,
    Case,
    Role,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPurpose {
    ChatResponse,
    TaskExecution,
    SafetyFiltering,
    ReflectionRequestedByUser,
    SupportAgentReview,
    ComplianceAudit,
    DebuggingReplay,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDisputeAction {
    Dispute,
    Attest,
}

#[derive(Debug, Subcommand)]
enum V1Commands {
    /// Write a scope/value-shape memory row.
    Create {
        #[arg(long)]
        user_id: String,
        #[arg(long, value_enum)]
        scope: CliScope,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long, value_enum, default_value = "explicit-user-input")]
        source: CliSource,
        #[arg(long, default_value_t = 90)]
        ttl_days: u16,
        /// Inline JSON, or `-` to read from stdin.
        #[arg(long)]
        value_json: String,
        #[arg(long)]
        app_id: uuid::Uuid,
    },
    /// Read+merge active memories in a scope, minting a revocation token.
    Read {
        #[arg(long)]
        user_id: String,
        #[arg(long, value_enum)]
        scope: CliScope,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        purpose: String,
        #[arg(long)]
        max_age_days: Option<u16>,
        #[arg(long)]
        app_id: uuid::Uuid,
    },
    /// Re-run a read against a live grant.
    Continue {
        #[arg(long)]
        token: String,
        #[arg(long)]
        max_age_days: Option<u16>,
    },
    /// Revoke a read grant.
    Revoke {
        #[arg(long)]
        token: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum V2Commands {
    /// Ingest a memory object. Body is the full `CreateMemoryV2Request` JSON.
    Create {
        #[arg(long)]
        tenant_id: String,
        /// Path to a JSON file, or `-` to read from stdin.
        #[arg(long)]
        json: String,
    },
    Query {
        #[arg(long)]
        tenant_id: String,
        #[arg(long, value_enum)]
        scope_type: CliScopeType,
        #[arg(long)]
        scope_id: String,
        #[arg(long, value_enum)]
        purpose: CliPurpose,
        #[arg(long)]
        query_text: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    Reconstruct {
        #[arg(long)]
        tenant_id: String,
        #[arg(long, value_enum)]
        scope_type: CliScopeType,
        #[arg(long)]
        scope_id: String,
        #[arg(long, value_enum)]
        purpose: CliPurpose,
        #[arg(long)]
        query_text: Option<String>,
        #[arg(long)]
        include_events: bool,
    },
    Seal {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        memory_id: String,
    },
    Revoke {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        memory_id: String,
        #[arg(long)]
        yes: bool,
    },
    Reinforce {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        memory_id: String,
        #[arg(long)]
        delta: Option<f64>,
    },
    /// Apply a reconsolidation-gated mutation. Body is optional JSON with
    /// `affect_update` / `claim_confidence` / `append_history_note`.
    Recall {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        memory_id: String,
        #[arg(long)]
        json: Option<String>,
    },
    Dispute {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        memory_id: String,
        #[arg(long, value_enum)]
        action: CliDisputeAction,
    },
    Explain {
        #[arg(long)]
        access_log_id: String,
    },
    Replay {
        #[arg(long)]
        access_log_id: String,
        #[arg(long)]
        query_text_override: Option<String>,
        #[arg(long)]
        include_events_override: Option<bool>,
    },
}

/// Reads `-` as stdin, anything else as a file path, falling back to treating
/// the argument itself as inline JSON when it looks like an object or array.
fn read_json_arg(arg: &str) -> Result<serde_json::Value> {
    let raw = if arg == "-" {
        let mut buf = String::new();
        io::Read::read_to_string(&mut io::stdin(), &mut buf)?;
        buf
    } else if Path::new(arg).exists() {
        std::fs::read_to_string(arg)?
    } else {
        arg.to_string()
    };
    Ok(serde_json::from_str(&raw)?)
}

fn build_engine(config: &AppConfig) -> Result<Engine> {
    let store = Store::open(&config.store.data_path)?;
    let policy_document = if config.has_policy_override() {
        let raw = std::fs::read_to_string(&config.policy.document_path)?;
        serde_json::from_str::<PolicyDocument>(&raw)?
    } else {
        default_policy()
    };
    let policy = PolicyEngine::new(policy_document);
    Ok(Engine::new(store, policy, Box::new(SystemClock), Box::new(SystemTokenRng)))
}

fn confirm_destructive(expected: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        bail!("refusing a destructive operation in non-interactive mode without --yes");
    }
    print!("This cannot be undone. Type '{expected}' to continue: ");
    io::stdout().flush()?;
    let mut confirmation = String::new();
    io::stdin().read_line(&mut confirmation)?;
    Ok(confirmation.trim() == expected)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Stats => memory_cmds::run_stats(&config, &engine),
        Commands::V1 { command } => Ok(match command {
            V1Commands::Create { user_id, scope, domain, source, ttl_days, value_json, app_id } => {
                let value = read_json_arg(&value_json)?;
                memory_cmds::run_v1_create(&engine, user_id, scope.into(), domain, source.into(), ttl_days, value, app_id)?;
            }
            V1Commands::Read { user_id, scope, domain, purpose, max_age_days, app_id } => {
                memory_cmds::run_v1_read(&engine, user_id, scope.into(), domain, purpose, max_age_days, app_id)?;
            }
            V1Commands::Continue { token, max_age_days } => {
                memory_cmds::run_v1_continue(&engine, token, max_age_days)?;
            }
            V1Commands::Revoke { token, yes } => {
                if !confirm_destructive("REVOKE", yes)? {
                    println!("revoke cancelled");
                    return Ok(());
                }
                memory_cmds::run_v1_revoke(&engine, token)?;
            }
        }),
        Commands::V2 { command } => Ok(match command {
            V2Commands::Create { tenant_id, json } => {
                let body = read_json_arg(&json)?;
                memory_cmds::run_v2_create(&engine, tenant_id, body)?;
            }
            V2Commands::Query { tenant_id, scope_type, scope_id, purpose, query_text, limit } => {
                memory_cmds::run_v2_query(&engine, tenant_id, scope_type.into(), scope_id, purpose.into(), query_text, limit)?;
            }
            V2Commands::Reconstruct { tenant_id, scope_type, scope_id, purpose, query_text, include_events } => {
                memory_cmds::run_v2_reconstruct(&engine, tenant_id, scope_type.into(), scope_id, purpose.into(), query_text, include_events)?;
            }
            V2Commands::Seal { tenant_id, memory_id } => {
                memory_cmds::run_v2_seal(&engine, tenant_id, memory_id)?;
            }
            V2Commands::Revoke { tenant_id, memory_id, yes } => {
                if !confirm_destructive("REVOKE", yes)? {
                    println!("revoke cancelled");
                    return Ok(());
                }
                memory_cmds::run_v2_revoke(&engine, tenant_id, memory_id)?;
            }
            V2Commands::Reinforce { tenant_id, memory_id, delta } => {
                memory_cmds::run_v2_reinforce(&engine, tenant_id, memory_id, delta)?;
            }
            V2Commands::Recall { tenant_id, memory_id, json } => {
                let body = json.map(|j| read_json_arg(&j)).transpose()?;
                memory_cmds::run_v2_recall(&engine, tenant_id, memory_id, body)?;
            }
            V2Commands::Dispute { tenant_id, memory_id, action } => {
                memory_cmds::run_v2_dispute(&engine, tenant_id, memory_id, action.into())?;
            }
            V2Commands::Explain { access_log_id } => {
                memory_cmds::run_v2_explain(&engine, access_log_id)?;
            }
            V2Commands::Replay { access_log_id, query_text_override, include_events_override } => {
                memory_cmds::run_v2_replay(&engine, access_log_id, query_text_override, include_events_override)?;
            }
        }),
    }?;

    Ok(())
}

impl From<CliScope> for memsub_types::memory_v1::Scope {
    fn from(value: CliScope) -> Self {
        use memsub_types::memory_v1::Scope::*;
        match value {
            CliScope::Preferences => Preferences,
            CliScope::Constraints => Constraints,
            CliScope::Communication => Communication,
            CliScope::Accessibility => Accessibility,
            CliScope::Schedule => Schedule,
            CliScope::Attention => Attention,
        }
    }
}

impl From<CliSource> for memsub_types::memory_v1::MemorySource {
    fn from(value: CliSource) -> Self {
        use memsub_types::memory_v1::MemorySource::*;
        match value {
            CliSource::ExplicitUserInput => ExplicitUserInput,
            CliSource::InferredFromConversation => InferredFromConversation,
            CliSource::ImportedProfile => ImportedProfile,
            CliSource::SystemDefault => SystemDefault,
        }
    }
}

impl From<CliScopeType> for memsub_types::ScopeType {
    fn from(value: CliScopeType) -> Self {
        use memsub_types::ScopeType::*;
        match value {
            CliScopeType::User => User,
            CliScopeType::Org => Org,
            CliScopeType::App => App,
            CliScopeType::Session => Session,
            CliScopeType::Project => Project,
            CliScopeType::Case => Case,
            CliScopeType::Role => Role,
        }
    }
}

impl From<CliPurpose> for memsub_types::audit_event::AccessPurpose {
    fn from(value: CliPurpose) -> Self {
        use memsub_types::audit_event::AccessPurpose::*;
        match value {
            CliPurpose::ChatResponse => ChatResponse,
            CliPurpose::TaskExecution => TaskExecution,
            CliPurpose::SafetyFiltering => SafetyFiltering,
            CliPurpose::ReflectionRequestedByUser => ReflectionRequestedByUser,
            CliPurpose::SupportAgentReview => SupportAgentReview,
            CliPurpose::ComplianceAudit => ComplianceAudit,
            CliPurpose::DebuggingReplay => DebuggingReplay,
        }
    }
}

impl From<CliDisputeAction> for memsub_types::api::DisputeAction {
    fn from(value: CliDisputeAction) -> Self {
        match value {
            CliDisputeAction::Dispute => memsub_types::api::DisputeAction::Dispute,
            CliDisputeAction::Attest => memsub_types::api::DisputeAction::Attest,
        }
    }
}
