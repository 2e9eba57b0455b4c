use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gcrm::config::{Config, OutputFormat};
use gcrm::gcp::auth::GcpCredentials;
use gcrm::gcp::client::{format_gcp_error, GcpClient};
use gcrm::resourcemanager::ResourceManager;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Query and manage Google Cloud projects, folders, organizations and their policies
#[derive(Parser, Debug)]
#[command(name = "gcrm", version, about, long_about = None)]
struct Args {
    /// Default GCP project (used by `ancestry` without a resource)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Resource Manager endpoint override
    #[arg(long, env = "GCRM_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Use this access token instead of Application Default Credentials
    #[arg(long, env = "GCRM_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Log level for debugging (written to the log file)
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Api(ApiCommand),
    /// Manage the gcrm config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands that call the Resource Manager API
#[derive(Subcommand, Debug)]
enum ApiCommand {
    /// Show a project, folder or organization (e.g. projects/123)
    Resource { name: String },
    /// Show the chain from a resource up to its organization
    Ancestry { name: Option<String> },
    /// Show the IAM policy of a resource
    IamPolicy { name: String },
    /// Organization policy operations
    #[command(subcommand)]
    OrgPolicy(OrgPolicyCommand),
}

#[derive(Subcommand, Debug)]
enum OrgPolicyCommand {
    /// Show the policy for one constraint
    Get { name: String, constraint: String },
    /// List policies set on a resource
    List {
        name: String,
        /// Follow every page and print only the policies
        #[arg(long)]
        all: bool,
    },
    /// Replace a policy (JSON or YAML file)
    Set {
        name: String,
        #[arg(long)]
        policy_file: PathBuf,
        #[arg(long)]
        etag: String,
    },
    /// Clear a policy
    Delete {
        name: String,
        constraint: String,
        #[arg(long)]
        etag: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Remember a default project
    SetProject { project: String },
    /// Print the current configuration
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // RUST_LOG wins over --log-level when set
    let filter = match (std::env::var("RUST_LOG").ok(), level.to_tracing_level()) {
        (Some(directives), _) => EnvFilter::new(directives),
        (None, Some(tracing_level)) => EnvFilter::new(tracing_level.as_str()),
        (None, None) => return None,
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcrm started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcrm").join("gcrm.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcrm").join("gcrm.log");
    }
    PathBuf::from("gcrm.log")
}

fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Policy files may be JSON or YAML (YAML parses both)
fn read_policy_file(path: &Path) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse policy {:?}", path))
}

async fn build_manager(args: &Args, config: &Config) -> Result<ResourceManager> {
    let endpoint = config.effective_endpoint(args.endpoint.as_deref())?;

    let credentials = match &args.access_token {
        Some(token) => GcpCredentials::from_static_token(token.clone()),
        None => GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?,
    };

    let project = match args.project.clone().or_else(|| config.effective_project()) {
        Some(project) => project,
        None => credentials.project_id().await.unwrap_or_default(),
    };
    tracing::info!("Using project: {:?}, endpoint: {}", project, endpoint);

    let client = GcpClient::with_credentials(credentials, &project)?.with_endpoint(&endpoint);
    Ok(ResourceManager::new(client))
}

fn run_config(command: &ConfigCommand, config: &mut Config, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommand::SetProject { project } => {
            config.set_project(project)?;
            println!("Default project set to {}", project);
            Ok(())
        },
        ConfigCommand::Show => print_value(&serde_json::to_value(&*config)?, format),
    }
}

async fn run_api(command: &ApiCommand, manager: &ResourceManager) -> Result<Value> {
    let result = match command {
        ApiCommand::Resource { name } => manager.get_resource(name).await?,
        ApiCommand::Ancestry { name } => {
            Value::Array(manager.project_ancestry(name.as_deref()).await?)
        },
        ApiCommand::IamPolicy { name } => manager.get_iam_policy(name).await?,
        ApiCommand::OrgPolicy(OrgPolicyCommand::Get { name, constraint }) => {
            manager.get_org_policy(name, constraint).await?
        },
        ApiCommand::OrgPolicy(OrgPolicyCommand::List { name, all: false }) => {
            manager.list_org_policy(name).await?
        },
        ApiCommand::OrgPolicy(OrgPolicyCommand::List { name, all: true }) => {
            Value::Array(manager.list_all_org_policies(name).await?)
        },
        ApiCommand::OrgPolicy(OrgPolicyCommand::Set {
            name,
            policy_file,
            etag,
        }) => {
            let policy = read_policy_file(policy_file)?;
            manager.set_org_policy(name, &policy, etag).await?
        },
        ApiCommand::OrgPolicy(OrgPolicyCommand::Delete {
            name,
            constraint,
            etag,
        }) => manager.delete_org_policy(name, constraint, etag).await?,
    };
    Ok(result)
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    let format = args.output.or(config.output).unwrap_or_default();

    match &args.command {
        Command::Config(command) => run_config(command, &mut config, format),
        Command::Api(command) => {
            let manager = build_manager(&args, &config).await?;
            let result = run_api(command, &manager).await?;
            print_value(&result, format)
        },
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:?}", err);
        eprintln!("Error: {}", format_gcp_error(&err));
        // flush buffered log lines before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}
