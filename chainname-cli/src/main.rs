//! Chainname CLI - resolve blockchain domain names
//!
//! Prints each resolution as a JSON `ResolutionResponse`. Off-chain (CCIP-Read)
//! lookups follow the consent persisted next to the config file, unless a
//! one-off `--allow-offchain` / `--deny-offchain` is given.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod error;
mod paths;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chainname::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use error::Result;

/// Resolve ENS and Unstoppable Domains names
#[derive(Parser)]
#[command(name = "chainname")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "CHAINNAME_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the Ethereum address of a domain
    Addr(ResolveArgs),

    /// Resolve the content hash of an ENS domain
    Contenthash(ResolveArgs),

    /// Resolve the web URL of a domain
    Dns(ResolveArgs),

    /// Show or change the off-chain lookup consent
    Consent(ConsentArgs),

    /// Create the default configuration
    Init(InitArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

/// Arguments shared by the resolve commands
#[derive(Args)]
struct ResolveArgs {
    /// Domain name, e.g. `vitalik.eth` or `brad.crypto`
    domain: String,

    /// Allow an off-chain lookup for this request
    #[arg(long, group = "decision")]
    allow_offchain: bool,

    /// Refuse an off-chain lookup for this request
    #[arg(long, group = "decision")]
    deny_offchain: bool,

    /// Persist the allow/deny decision
    #[arg(long, requires = "decision")]
    remember: bool,
}

impl ResolveArgs {
    const fn options(&self) -> Option<OffchainLookupOptions> {
        if !self.allow_offchain && !self.deny_offchain {
            return None;
        }
        Some(OffchainLookupOptions {
            allow: self.allow_offchain,
            remember: self.remember,
        })
    }
}

/// Arguments for the consent command
#[derive(Args)]
struct ConsentArgs {
    #[command(subcommand)]
    command: ConsentCommands,
}

#[derive(Subcommand)]
enum ConsentCommands {
    /// Show the persisted consent
    Show,
    /// Set the persisted consent
    Set {
        /// New consent
        #[arg(value_enum)]
        state: ConsentChoice,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConsentChoice {
    /// Prompt before each off-chain lookup
    Ask,
    /// Always follow off-chain lookups
    Allow,
    /// Never follow off-chain lookups
    Deny,
}

impl From<ConsentChoice> for ConsentState {
    fn from(choice: ConsentChoice) -> Self {
        match choice {
            ConsentChoice::Ask => Self::Ask,
            ConsentChoice::Allow => Self::AlwaysAllow,
            ConsentChoice::Deny => Self::NeverAllow,
        }
    }
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("chainname={level},chainname_cli={level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let config_file = paths::config_path(cli.config.as_deref());
    match cli.command {
        Commands::Addr(args) => {
            let service = build_service(&config_file).await?;
            let result = service.resolve_address(&args.domain, args.options()).await;
            print_response(ResolutionResponse::from(result))
        }
        Commands::Contenthash(args) => {
            let service = build_service(&config_file).await?;
            let result = service
                .resolve_content_hash(&args.domain, args.options())
                .await
                .map(|outcome| outcome.map(|hash| hash.to_string()));
            print_response(ResolutionResponse::from(result))
        }
        Commands::Dns(args) => {
            let service = build_service(&config_file).await?;
            let result = service
                .resolve_dns(&args.domain, args.options())
                .await
                .map(|outcome| outcome.map(String::from));
            print_response(ResolutionResponse::from(result))
        }
        Commands::Consent(args) => cmd_consent(args, &config_file).await,
        Commands::Init(args) => cmd_init(args, &config_file).await,
        Commands::Config(args) => cmd_config(args, &config_file).await,
    }
}

/// Builds the service from the config file and the consent file next to it.
async fn build_service(config_file: &Path) -> Result<NameService> {
    let config = ResolverConfig::load(config_file).await?.with_env_overrides();
    let store = FileConsentStore::new(paths::consent_path(config_file));
    Ok(NameService::builder(config)
        .consent_store(Arc::new(store))
        .build()?)
}

/// Prints `response` as JSON; failures exit non-zero.
fn print_response(response: ResolutionResponse<String>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(if response.error.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Show or change the persisted consent.
async fn cmd_consent(args: ConsentArgs, config_file: &Path) -> Result<ExitCode> {
    let store = FileConsentStore::new(paths::consent_path(config_file));
    let gate = ConsentGate::new(Arc::new(store));

    if let ConsentCommands::Set { state } = args.command {
        gate.set_state(state.into()).await?;
    }
    let state = gate.state().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "offchain_lookup": state }))?
    );
    Ok(ExitCode::SUCCESS)
}

/// Write the default configuration.
async fn cmd_init(args: InitArgs, config_file: &Path) -> Result<ExitCode> {
    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(ExitCode::SUCCESS);
    }

    ResolverConfig::default().save(config_file).await?;
    tracing::info!(path = %config_file.display(), "created default config");

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. set your RPC endpoints under [[networks]]");
    println!("  2. chainname addr vitalik.eth");

    Ok(ExitCode::SUCCESS)
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_file: &Path) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let config = ResolverConfig::load(config_file).await?.with_env_overrides();
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("chainname").chain(args.iter().copied()))
    }

    fn resolve_args(args: &[&str]) -> ResolveArgs {
        match parse(args).expect("valid arguments").command {
            Commands::Addr(args) | Commands::Contenthash(args) | Commands::Dns(args) => args,
            _ => panic!("not a resolve command"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_consent_flags() {
        assert_eq!(resolve_args(&["addr", "vitalik.eth"]).options(), None);
        assert_eq!(
            resolve_args(&["dns", "offchainexample.eth", "--allow-offchain"]).options(),
            Some(OffchainLookupOptions::allow_once())
        );
        assert_eq!(
            resolve_args(&["addr", "offchainexample.eth", "--deny-offchain", "--remember"])
                .options(),
            Some(OffchainLookupOptions::deny_and_remember())
        );
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(parse(&["addr", "a.eth", "--allow-offchain", "--deny-offchain"]).is_err());
        assert!(parse(&["addr", "a.eth", "--remember"]).is_err());
    }

    #[tokio::test]
    async fn test_init_and_consent() {
        let dir = assert_fs::TempDir::new().expect("temp dir");
        let config = dir.child("config.toml");

        cmd_init(InitArgs { force: false }, config.path())
            .await
            .expect("init");
        let written = std::fs::read_to_string(config.path()).expect("config written");
        assert_eq!(
            ResolverConfig::from_toml_str(&written).expect("parses"),
            ResolverConfig::default()
        );

        let args = ConsentArgs {
            command: ConsentCommands::Set {
                state: ConsentChoice::Deny,
            },
        };
        cmd_consent(args, config.path()).await.expect("set consent");
        dir.child("consent.json")
            .assert("{\n  \"offchain_lookup\": \"never_allow\"\n}");
    }
}
