//! proofreader: streaming proofreading proxy
//!
//! Serves the completion endpoint used by the proofreading front end, and
//! ships a few commands to inspect prompts and drive a session from the shell.

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use proofreader::{
    config::AppConfig,
    credentials::CredentialTable,
    prompt::{self, DEFAULT_CONTEXT, DEFAULT_INSTRUCTION},
    run_server,
    session::{CompletionClient, ProofreadSettings, SessionStatus, StreamingSession, TextSink},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "proofreader")]
#[command(version)]
#[command(about = "Streaming proofreading proxy for OpenAI-compatible providers")]
#[command(long_about = "
proofreader forwards proofreading requests to an OpenAI-compatible provider
and streams the corrected text back as plain text. Callers either present a
key provisioned on the server, or bring their own endpoint and API key.

Example usage:
  proofreader serve --credentials credentials.toml
  proofreader system-prompt --context email --instruction polish
  echo 'i seen him yesterday' | proofreader proofread --model gpt-4
")]
struct Cli {
    /// Path to config file (defaults to config.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override listen address
        #[arg(long)]
        host: Option<String>,

        /// Credential document: a path to a TOML file or base64-encoded TOML
        #[arg(long, env = "CONFIG", default_value = "", hide_env_values = true)]
        credentials: String,
    },

    /// Validate the configuration file and credential document
    CheckConfig {
        /// Credential document: a path to a TOML file or base64-encoded TOML
        #[arg(long, env = "CONFIG", default_value = "", hide_env_values = true)]
        credentials: String,
    },

    /// List writing contexts and instructions
    Prompts {
        /// Show the full prompt text
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the system prompt for a context and instruction
    SystemPrompt {
        #[arg(long, default_value = DEFAULT_CONTEXT)]
        context: String,

        #[arg(long, default_value = DEFAULT_INSTRUCTION)]
        instruction: String,
    },

    /// List the models a running server allows
    Models {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
    },

    /// Proofread text through a running server
    Proofread {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,

        #[arg(short, long)]
        model: String,

        #[arg(long, default_value = DEFAULT_CONTEXT)]
        context: String,

        #[arg(long, default_value = DEFAULT_INSTRUCTION)]
        instruction: String,

        /// Custom provider base URL
        #[arg(long, default_value = "")]
        endpoint: String,

        #[arg(long, env = "PROOFREAD_API_KEY", default_value = "", hide_env_values = true)]
        api_key: String,

        /// Text to proofread; read from stdin when omitted
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            credentials,
        } => {
            serve(cli.config, port, host, &credentials).await?;
        }
        Commands::CheckConfig { credentials } => {
            check_config(cli.config, &credentials)?;
        }
        Commands::Prompts { verbose } => {
            list_prompts(verbose);
        }
        Commands::SystemPrompt { context, instruction } => {
            println!("{}", prompt::compose(&context, &instruction)?);
        }
        Commands::Models { server } => {
            list_models(&server).await?;
        }
        Commands::Proofread {
            server,
            model,
            context,
            instruction,
            endpoint,
            api_key,
            text,
        } => {
            let settings = ProofreadSettings {
                model: Some(model),
                context,
                instruction,
                endpoint,
                api_key,
            };
            proofread(&server, settings, text).await?;
        }
    }

    Ok(())
}

/// Run the proxy server
async fn serve(
    config_path: Option<PathBuf>,
    port_override: Option<u16>,
    host_override: Option<String>,
    credentials: &str,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load_or_default(config_path.as_deref()).context("failed to load configuration")?;

    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(host) = host_override {
        config.server.host = host;
    }
    config.validate()?;

    let table = CredentialTable::load_default(credentials);
    if table.is_empty() {
        tracing::info!("No provisioned credentials, every caller must bring an API key");
    }

    run_server(config, table).await
}

/// Validate configuration and credentials
fn check_config(config_path: Option<PathBuf>, credentials: &str) -> anyhow::Result<()> {
    let config = match AppConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Configuration is valid\n");
    println!("Server:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("\nUpstream:");
    println!("  Default URL: {}", config.upstream.default_base_url);
    println!("  Connect timeout: {}s", config.upstream.connect_timeout_seconds);
    println!("  Stream timeout: {}s", config.upstream.stream_timeout_seconds);
    println!("\nStats:");
    println!("  Enabled: {}", config.stats.enabled);
    println!("  Format: {:?}", config.stats.format);

    let table = CredentialTable::load_default(credentials);
    println!("\nCredentials:");
    if table.is_empty() {
        println!("  none (all callers self-provisioned)");
    } else {
        for user in table.users() {
            println!("  {} -> {}", user.name, user.base_url);
        }
    }
    println!("\nModels:");
    for model in table.models() {
        println!("  - {}", model);
    }

    Ok(())
}

/// List contexts and instructions
fn list_prompts(verbose: bool) {
    println!("Writing contexts:\n");
    for context in prompt::CONTEXTS {
        if verbose {
            println!("  {} ({}):", context.key, context.label);
            println!("    {}", context.prompt);
            if let Some(guidelines) = context.guidelines {
                println!("    Guidelines:");
                for line in guidelines.lines() {
                    println!("      {}", line);
                }
            }
            println!();
        } else {
            println!("  {:20} {}", context.key, context.label);
        }
    }

    println!("\nInstructions:\n");
    for instruction in prompt::INSTRUCTIONS {
        println!("  {:28} {}", instruction.key, instruction.prompt);
    }
}

async fn list_models(server: &str) -> anyhow::Result<()> {
    let client = CompletionClient::new(server)?;
    let models = client.models().await?;

    if models.is_empty() {
        println!("No models allowed for provisioned keys on {}", client.base_url());
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}

/// Prints only the part of the accumulated text not yet written
struct TerminalSink {
    printed: Mutex<usize>,
}

impl TextSink for TerminalSink {
    fn replace(&self, text: &str) {
        let mut printed = self.printed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(rest) = text.get(*printed..) {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(rest.as_bytes());
            let _ = stdout.flush();
            *printed = text.len();
        }
    }
}

/// Drive a session from the terminal, Ctrl-C cancels
async fn proofread(server: &str, settings: ProofreadSettings, text: Option<String>) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input).context("failed to read stdin")?;
            input
        }
    };

    let client = CompletionClient::new(server)?;
    let sink = Arc::new(TerminalSink { printed: Mutex::new(0) });
    let session = StreamingSession::new(client, sink);

    settings.check_keys()?;
    session.start(&settings, &text)?;

    let snapshot = tokio::select! {
        snapshot = session.finished() => snapshot,
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            eprintln!("\n(cancelled)");
            session.snapshot()
        }
    };
    println!();

    if snapshot.status == SessionStatus::Errored {
        anyhow::bail!(snapshot.error.unwrap_or_else(|| "Proofreading failed".to_string()));
    }
    Ok(())
}
