// UMSS Assistant Entry Point
// Interactive chat, classifier training and model inspection

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use umss_assistant::assistant::train_artifact;
use umss_assistant::{Assistant, AssistantConfig};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "umss-assistant", version, about = "Campus assistant for UMSS students")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "UMSS_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat on stdin/stdout (default)
    Chat {
        /// User identifier; a random one is generated when omitted
        #[arg(long)]
        user: Option<String>,
    },
    /// Train the intent classifier from the taxonomy and save the artifact
    Train {
        /// Output path; defaults to the configured model path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show which intent model is active
    Info,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn chat(assistant: &Assistant, user: Option<String>) -> Result<()> {
    let user_id = user.unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(user_id = %user_id, "Chat session started");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "¡Hola! Soy el asistente de la UMSS. Escribe 'salir' para terminar.")?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if matches!(utterance.to_lowercase().as_str(), "salir" | "exit" | "quit") {
            break;
        }

        let reply = assistant.respond(utterance, &user_id);
        writeln!(stdout, "{}\n", reply.text)?;
    }

    writeln!(stdout, "¡Hasta pronto!")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = AssistantConfig::load().context("Failed to read configuration")?;

    match cli.command.unwrap_or(Command::Chat { user: None }) {
        Command::Chat { user } => {
            let assistant =
                Assistant::from_config(&config).context("Failed to initialize the assistant")?;
            chat(&assistant, user)
        }
        Command::Train { output } => {
            let output = match output.or_else(|| config.model_path.clone()) {
                Some(path) => path,
                None => {
                    warn!("No model path configured, writing to the default location");
                    PathBuf::from("models/intent_classifier.bin")
                }
            };
            let artifact = train_artifact(&config, &output)
                .with_context(|| format!("Failed to train classifier into {}", output.display()))?;
            println!(
                "Trained on {} samples, {} intents, estimated accuracy {:.1}% -> {}",
                artifact.training_samples,
                artifact.intent_labels.len(),
                artifact.accuracy * 100.0,
                output.display()
            );
            Ok(())
        }
        Command::Info => {
            let assistant =
                Assistant::from_config(&config).context("Failed to initialize the assistant")?;
            println!("{}", serde_json::to_string_pretty(&assistant.model_info())?);
            Ok(())
        }
    }
}
