//! linkgate daemon: entry point for running the gateway and managing links.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use linkgate_codec::LinkVersion;
use linkgate_node::{
    join_reaper, spawn_reaper, GatewayConfig, LinkShortifyClient, PolicyName, Resolver,
    ShutdownController, StorageBackend, Stores,
};
use linkgate_rpc::{AppState, HttpSettings, RpcServer};
use linkgate_types::OwnerId;
use linkgate_utils::{format_duration, init_logging, LogFormat};
use linkgate_verification::{DisabledVerifier, VerificationGate};

#[derive(Parser)]
#[command(name = "linkgate", about = "Single-use, verification-gated link gateway")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "LINKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "LINKGATE_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Public origin used in resolve URLs, e.g. "https://go.example.com".
    #[arg(long, env = "LINKGATE_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "LINKGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: "memory" or "lmdb".
    #[arg(long, env = "LINKGATE_STORAGE")]
    storage: Option<String>,

    /// Security policy: "strict" or "relaxed".
    #[arg(long, env = "LINKGATE_POLICY")]
    policy: Option<String>,

    /// reCAPTCHA secret key.
    #[arg(long, env = "LINKGATE_CAPTCHA_SECRET", hide_env_values = true)]
    captcha_secret: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "LINKGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LINKGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve,
    /// Manage link owners.
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// Manage wrapped links.
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// Encode or decode link slugs offline.
    Codec {
        #[command(subcommand)]
        action: CodecAction,
    },
}

#[derive(clap::Subcommand)]
enum OwnerAction {
    /// Create or renew an owner.
    Put {
        #[arg(long)]
        id: String,
        /// Subscription length from now, in days.
        #[arg(long, default_value_t = 30)]
        valid_days: u64,
        /// API key of the owner's shortener account.
        #[arg(long)]
        shortener_key: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum LinkAction {
    /// Register a link for an owner.
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        target: String,
        /// Custom slug; a random one is generated when omitted.
        #[arg(long)]
        slug: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum CodecAction {
    Encode {
        #[arg(long, default_value = "v4")]
        version: String,
        url: String,
    },
    Decode {
        #[arg(long, default_value = "v4")]
        version: String,
        slug: String,
    },
}

/// File config (if any) with CLI/env overrides applied.
fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    if let Some(addr) = &cli.listen_addr {
        config.listen_addr = addr.clone();
    }
    if let Some(base) = &cli.public_base_url {
        config.public_base_url = Some(base.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(storage) = &cli.storage {
        config.storage = match storage.to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "lmdb" => StorageBackend::Lmdb,
            other => bail!("unknown storage backend: {other}"),
        };
    }
    if let Some(policy) = &cli.policy {
        config.gate.policy = match PolicyName::from_name(policy) {
            Some(name) => name,
            None => bail!("unknown policy: {policy}"),
        };
    }
    if let Some(secret) = &cli.captcha_secret {
        config.captcha.secret_key = Some(secret.clone());
    }
    if let Some(format) = &cli.log_format {
        config.log_format = LogFormat::from_name(format);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Resolver for offline registry commands: no CAPTCHA or shortener traffic.
fn admin_resolver(config: &GatewayConfig) -> anyhow::Result<Resolver> {
    if config.storage == StorageBackend::Memory {
        bail!("registry commands need persistent storage; pass --storage lmdb");
    }
    let stores = Stores::open(config)?;
    Ok(Resolver::new(
        stores.sessions,
        stores.links,
        VerificationGate::new(config.gate_params(), config.security_policy()),
        Arc::new(DisabledVerifier),
        Arc::new(LinkShortifyClient::new()),
    ))
}

async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting linkgate on {} (storage: {:?}, policy: {:?}, captcha: {:?})",
        config.listen_addr,
        config.storage,
        config.gate.policy,
        config.captcha.provider,
    );
    tracing::info!(
        "session ttl {}, minimum dwell {}",
        format_duration(config.gate.session_ttl_secs),
        format_duration(config.gate.min_dwell_secs),
    );
    if !config.security_policy().is_strict() {
        tracing::warn!("relaxed security policy: gate checks only log warnings");
    }

    let stores = Stores::open(&config)?;
    let resolver = Arc::new(Resolver::from_config(&config, stores)?);

    let shutdown = ShutdownController::new();
    let reaper = spawn_reaper(
        Arc::clone(resolver.sessions()),
        Arc::clone(resolver.clock()),
        Arc::clone(resolver.metrics()),
        config.reap_interval(),
        shutdown.subscribe(),
    );

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let state = AppState::new(resolver, HttpSettings::from_config(&config));
    let server = RpcServer::new(config.listen_addr.clone(), state);
    let result = server.start(shutdown.signalled()).await;

    shutdown.shutdown();
    join_reaper(reaper).await;
    tracing::info!("linkgate stopped");
    Ok(result?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Serve => serve(config).await?,
        Command::Owner { action } => match action {
            OwnerAction::Put {
                id,
                valid_days,
                shortener_key,
            } => {
                let owner = admin_resolver(&config)?.register_owner(
                    OwnerId::new(id),
                    valid_days,
                    shortener_key,
                )?;
                println!("owner {} valid until {}", owner.id, owner.valid_until);
            }
        },
        Command::Link { action } => match action {
            LinkAction::Create {
                owner,
                target,
                slug,
            } => {
                let link = admin_resolver(&config)?.register_link(
                    &OwnerId::new(owner),
                    &target,
                    slug.as_deref(),
                )?;
                println!("{} -> {}", link.slug, link.target_url);
            }
        },
        Command::Codec { action } => match action {
            CodecAction::Encode { version, url } => {
                let version: LinkVersion = version.parse()?;
                println!("{}", version.encode(&url)?);
            }
            CodecAction::Decode { version, slug } => {
                let version: LinkVersion = version.parse()?;
                println!("{}", version.decode(&slug)?);
            }
        },
    }
    Ok(())
}
