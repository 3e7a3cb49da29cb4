use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use teleagent::core::agent::{ConversationAgent, Dispatcher};
use teleagent::core::config::{ModelSettings, Settings};
use teleagent::core::operation::OperationRegistry;
use teleagent::core::session::ConversationSession;
use teleagent::kpi::{KpiEvaluator, render_table, summarize};
use teleagent::llm::backends::openai_compatible::OpenAICompatible;
use teleagent::llm::builder::LLMBuilder;
use teleagent::llm::embedding::LexicalEmbedder;
use teleagent::llm::EmbeddingProvider;
use teleagent::telecom::{SubscriberStore, telecom_registry};

const DEFAULT_USERS: &str = "data/users.json";
const DEFAULT_PACKAGES: &str = "data/packages.json";
const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "çık"];

#[derive(Parser)]
#[command(name = "teleagent")]
#[command(about = "Telecom self-service agent and KPI evaluator", long_about = None)]
struct Cli {
    /// TOML settings file; TELEAGENT_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DataArgs {
    /// Subscriber records (JSON array)
    #[arg(long, default_value = DEFAULT_USERS)]
    users: PathBuf,

    /// Package catalog (JSON array)
    #[arg(long, default_value = DEFAULT_PACKAGES)]
    packages: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent on stdin
    Chat {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Replay scenarios and report tool-call and answer KPIs
    Kpi {
        /// Scenario file (JSON array or single object)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Write per-scenario rows to this CSV file
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Score answers with the offline lexical embedder
        #[arg(long)]
        lexical: bool,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Print the operation descriptions shown to the model
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Chat { data } => chat(&settings, &data).await?,
        Commands::Kpi {
            scenario,
            out,
            lexical,
            data,
        } => kpi(&settings, &data, &scenario, out.as_deref(), lexical).await?,
        Commands::Tools => {
            let registry = telecom_registry(Arc::new(SubscriberStore::default()))?;
            println!("{}", registry.describe());
        }
    }

    Ok(())
}

fn build_llm(model: &ModelSettings) -> Result<Arc<OpenAICompatible>> {
    let mut builder = LLMBuilder::<OpenAICompatible>::new()
        .base_url(&model.base_url)
        .model(&model.model)
        .embedding_model(&model.embedding_model)
        .temperature(model.temperature)
        .timeout_seconds(model.timeout_seconds);
    if let Some(key) = &model.api_key {
        builder = builder.api_key(key);
    }
    if let Some(max_tokens) = model.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    builder.build().context("Failed to build the model client")
}

fn load_registry(data: &DataArgs) -> Result<Arc<OperationRegistry>> {
    log::info!(
        "Loading subscribers from {} and packages from {}",
        data.users.display(),
        data.packages.display()
    );
    let store = SubscriberStore::from_json_files(&data.users, &data.packages)
        .context("Failed to load subscriber data")?;
    Ok(Arc::new(telecom_registry(Arc::new(store))?))
}

fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&input.as_str())
}

async fn chat(settings: &Settings, data: &DataArgs) -> Result<()> {
    let registry = load_registry(data)?;
    let llm = build_llm(&settings.model)?;
    let dispatcher = Dispatcher::from_settings(registry, llm, &settings.agent)?;
    let mut session = ConversationSession::new();

    println!("Type your request, or 'exit' / 'çık' to quit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        match dispatcher.respond(&mut session, input).await {
            Ok(outcome) => {
                for call in &outcome.tool_calls {
                    log::debug!("{} -> {}", call.action.action, call.result.to_json_string());
                }
                println!("{}", outcome.reply);
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }

    Ok(())
}

async fn kpi(
    settings: &Settings,
    data: &DataArgs,
    scenario: &Path,
    out: Option<&Path>,
    lexical: bool,
) -> Result<()> {
    let registry = load_registry(data)?;
    let llm = build_llm(&settings.model)?;
    let embedder: Arc<dyn EmbeddingProvider> = if lexical {
        Arc::new(LexicalEmbedder::new())
    } else {
        llm.clone()
    };
    let agent: Arc<dyn ConversationAgent> =
        Arc::new(Dispatcher::from_settings(registry, llm, &settings.agent)?);
    let evaluator = KpiEvaluator::new(agent, embedder, settings.kpi.similarity_threshold);

    let rows = evaluator
        .evaluate_report(scenario, out)
        .await
        .with_context(|| format!("KPI evaluation of {} failed", scenario.display()))?;

    println!("{}", render_table(&rows));
    let summary = summarize(&rows);
    println!(
        "scenarios: {}  ok: {}  tool accuracy: {:.3}  mean similarity: {:.3}  mean latency: {:.3}s",
        summary.scenarios,
        summary.scenarios_ok,
        summary.tool_call_accuracy,
        summary.mean_similarity,
        summary.mean_latency_s
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(is_exit_command("çık"));
        assert!(is_exit_command(" Çık "));
        assert!(!is_exit_command("cik"));
        assert!(!is_exit_command("faturamı göster"));
    }

    #[test]
    fn test_cli_parses_kpi_command() {
        let cli = Cli::try_parse_from([
            "teleagent", "kpi", "--scenario", "data/scenarios.json", "--lexical",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Kpi { lexical: true, .. }));
    }
}
