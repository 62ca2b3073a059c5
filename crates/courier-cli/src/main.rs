use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bat::{PrettyPrinter, WrappingMode};
use clap::Parser;
use cliclack::{input, select, spinner};
use console::style;
use courier::agent::Agent;
use courier::providers::base::GenerationParams;
use courier::providers::configs::ProviderConfig;
use courier::providers::factory::{get_provider, ProviderType};
use courier::tools::{ToolContext, ToolRegistry};
use tracing_subscriber::EnvFilter;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Provider to chat with: openai, hf or ollama. Asked for when omitted
    #[arg(short, long)]
    provider: Option<ProviderType>,

    /// Model to use instead of the provider's default
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature, between 0 and 2
    #[arg(short, long, default_value_t = 0.7)]
    temperature: f32,

    /// Maximum tokens per generation
    #[arg(long, default_value_t = 512)]
    max_tokens: u32,

    /// Directory the file tools work in
    #[arg(long, default_value = ".")]
    workdir: PathBuf,
}

impl Cli {
    fn params(&self) -> GenerationParams {
        GenerationParams::default()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let params = cli.params();
    params.validate()?;

    let provider_type = match cli.provider {
        Some(provider_type) => provider_type,
        None => select("Choose a provider")
            .item(ProviderType::OpenAi, "openai", "OpenRouter, OpenAI compatible")
            .item(ProviderType::HuggingFace, "hf", "Hugging Face router")
            .item(ProviderType::Ollama, "ollama", "local models")
            .interact()?,
    };

    let mut config = ProviderConfig::from_env(provider_type)
        .with_context(|| format!("failed to configure the {} provider", provider_type))?;
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    let provider = get_provider(config)?;
    let registry = ToolRegistry::new(ToolContext::new(cli.workdir.clone()));
    let mut agent = Agent::new(provider, Arc::new(registry));

    println!(
        "courier chat with {} {}",
        style(provider_type).bold(),
        style("- type \"exit\" to end the session").dim()
    );
    println!();

    loop {
        let message_text: String = match input("Message:").placeholder("").required(false).interact() {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => break,
            Err(e) => return Err(e.into()),
        };

        let message_text = message_text.trim();
        if message_text.is_empty() {
            continue;
        }
        if is_exit_command(message_text) {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");
        let result = agent.process(message_text, &params).await;
        spin.stop("");

        match result {
            Ok(reply) => {
                for line in &reply.tool_log {
                    println!("{}", style(line).dim());
                }
                render(&reply.content)?;
            }
            Err(e) => eprintln!("{}", style(e).red()),
        }
        println!();
    }

    println!("Goodbye");
    Ok(())
}

fn is_exit_command(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    EXIT_WORDS.contains(&text.as_str())
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("failed to render reply: {}", e))?;
    Ok(())
}
