mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use unologin_core::{
    CONFIG_FILE_NAME, UnologinConfig, VerificationMode, default_config_dir, load_config_from_file,
    write_default_config_file,
};

use crate::commands::serve;

#[derive(Debug, Parser)]
#[command(name = "unologin", about = "unologin login middleware tools")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[arg(long, global = true, env = "UNOLOGIN_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Config file; overrides --config-dir
    #[arg(long, global = true, env = "UNOLOGIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default unologin.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the configuration
    Check,
    /// Verify a login token and print its payload
    Verify {
        #[arg(long)]
        token: String,
    },
    /// Run a reference app with the login pipeline mounted
    Serve(serve::ServeArgs),
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            self.config_dir
                .clone()
                .unwrap_or_else(default_config_dir)
                .join(CONFIG_FILE_NAME)
        })
    }

    fn load_config(&self) -> anyhow::Result<UnologinConfig> {
        let path = self.config_path();
        load_config_from_file(&path)
            .map_err(|e| anyhow::anyhow!("{e} (run `unologin init` to create {})", path.display()))
    }
}

fn init_tracing(json_logs: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("unologin=info,unologin_auth=info,unologin_axum=info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match &cli.command {
        Commands::Init { force } => {
            let path = cli.config_path();
            write_default_config_file(&path, *force)?;
            pout(
                cli.json,
                serde_json::json!({"message": "init complete", "config": path}),
                &format!("Wrote {}", path.display()),
            )?;
        }
        Commands::Check => {
            let config = cli.load_config()?;
            let mode = match &config.verification {
                VerificationMode::Provider => "provider",
                VerificationMode::Key(_) => "key",
            };
            pout(
                cli.json,
                serde_json::json!({
                    "ok": true,
                    "api_url": config.realm.api_url,
                    "frontend_url": config.realm.frontend_url,
                    "cookies_domain": config.cookies_domain,
                    "login_path": config.login_path,
                    "app_id": config.app_id(),
                    "verification": mode,
                }),
                &format!(
                    "Configuration OK (verification: {mode}, login path: {})",
                    config.login_path
                ),
            )?;
        }
        Commands::Verify { token } => {
            let config = cli.load_config()?;
            let verifier = unologin_auth::build_verifier(&config)?;
            let login = verifier.verify(token).await?;
            pout(
                cli.json,
                serde_json::to_value(&login.payload)?,
                &format!(
                    "Valid token for {} ({})",
                    login.payload.asu_id,
                    login.payload.user_classes.join(", ")
                ),
            )?;
        }
        Commands::Serve(args) => {
            let config = cli.load_config()?;
            serve::cmd_serve(config, args).await?;
        }
    }

    Ok(())
}

pub fn pout(json_mode: bool, value: serde_json::Value, text: &str) -> anyhow::Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{text}");
    }
    Ok(())
}
