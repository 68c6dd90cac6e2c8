use std::{future::IntoFuture, path::Path, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use storegate::{
    adapters::{HttpHandler, RemoteAppStore},
    config::{ServerConfigValidator, loader::load_config, models::ServerConfig},
    core::GatewayService,
    tracing_setup,
    utils::graceful_shutdown::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let config: ServerConfig = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    ServerConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}: {e}"))?;

    tracing_setup::init_tracing(&config.logging).context("Failed to initialize tracing")?;
    tracing::info!("Loaded configuration from {config_path}");

    let store = Arc::new(
        RemoteAppStore::new(&config.upstream).context("Failed to create upstream client")?,
    );
    let gateway_service = Arc::new(GatewayService::new(
        store,
        Duration::from_millis(config.upstream.proxy_timeout_ms),
    ));
    let router = HttpHandler::new(gateway_service, config.public_scheme.clone()).into_router();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    tracing::info!(
        "storegate listening on {} (upstream: {})",
        config.listen_addr,
        config.upstream.base_url
    );

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    {
        let graceful_shutdown = graceful_shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = graceful_shutdown.run_signal_handler().await {
                tracing::error!("Signal handler failed: {:?}", e);
            }
        });
    }

    let token = graceful_shutdown.shutdown_token();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            token.wait_for_shutdown().await;
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.context("Server error")?;
            tracing::info!("All in-flight requests drained");
        }
        _ = async {
            graceful_shutdown.wait_for_shutdown_signal().await;
            tokio::time::sleep(graceful_shutdown.drain_timeout()).await;
        } => {
            tracing::warn!(
                "Drain timeout of {:?} exceeded, forcing shutdown",
                graceful_shutdown.drain_timeout()
            );
        }
    }

    tracing::info!("storegate shutdown complete");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • Public Scheme: {}", config.public_scheme);
            println!("   • Upstream: {}", config.upstream.base_url);
            println!(
                "   • Upstream Timeout: {}s (proxied: {}ms)",
                config.upstream.timeout_secs, config.upstream.proxy_timeout_ms
            );
            println!(
                "   • Logging: {} ({})",
                config.logging.level,
                if config.logging.json { "json" } else { "pretty" }
            );
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure the upstream base_url starts with http:// or https://");
            println!("   • Verify listen address format (e.g., '127.0.0.1:3000')");
            println!("   • Use 'http' or 'https' for public_scheme");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# storegate configuration
# Every key can be overridden from the environment, e.g. STOREGATE__UPSTREAM__BASE_URL

# The address to listen on
listen_addr = "127.0.0.1:3000"

# Scheme for generated links when requests carry no X-Forwarded-Proto
public_scheme = "http"

[upstream]
# App-store metadata provider
base_url = "http://127.0.0.1:8000/"
timeout_secs = 30
# Applies to calls routed through a client-supplied ?proxy=
proxy_timeout_ms = 10000

[logging]
level = "info"
json = true
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'storegate serve --config {config_path}' to start the server");
    Ok(())
}
