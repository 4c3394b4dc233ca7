//! Explain command implementation

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::utils::{read_input, reads_stdin, SettingsArgs};
use crate::domain::Config;
use crate::gateway::OpenAiGateway;
use crate::orchestrate::{Explainer, Progress};
use crate::quota::QuotaTracker;

#[derive(Args)]
pub struct ExplainArgs {
    /// File to explain; reads stdin when omitted or `-`
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// API key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Do not show the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: ExplainArgs) -> Result<()> {
    let config = args.settings.resolve()?;
    let (text, name) = read_input(args.input.as_deref())?;
    if text.trim().is_empty() {
        anyhow::bail!("Nothing to explain: {} is empty", name);
    }

    let api_key = resolve_api_key(args.api_key, reads_stdin(args.input.as_deref()))?;
    let show_progress = !args.quiet && std::io::stderr().is_terminal();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let explanation = runtime.block_on(explain(config, api_key, text, show_progress))?;

    println!("{}", explanation);
    Ok(())
}

async fn explain(config: Config, api_key: String, text: String, show_progress: bool) -> Result<String> {
    let gateway = OpenAiGateway::new(api_key, config.gateway.clone())
        .context("Failed to build HTTP client")?;
    let quota = Arc::new(QuotaTracker::new(config.window()));
    let explainer = Explainer::new(Arc::new(gateway), quota, config);

    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("Loading");
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut task = explainer.spawn(text);
    loop {
        tokio::select! {
            event = task.next_event() => match event {
                Some(event) => {
                    tracing::info!("{}", describe(&event));
                    spinner.set_message(describe(&event));
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                spinner.set_message("Cancelling");
                task.cancel();
            }
        }
    }
    spinner.finish_and_clear();

    Ok(task.join().await?)
}

fn describe(event: &Progress) -> String {
    match event {
        Progress::Planned { estimated_tokens, calls: 1 } => {
            format!("Explaining ~{} tokens in one request", estimated_tokens)
        }
        Progress::Planned { estimated_tokens, calls } => {
            format!("Explaining ~{} tokens in {} chunks + summary", estimated_tokens, calls - 1)
        }
        Progress::Waiting { stage, seconds } => {
            format!("Waiting {}s for token quota before {}", seconds, stage)
        }
        Progress::Admitted { stage, estimated_tokens } => {
            format!("Sending {} (~{} tokens)", stage, estimated_tokens)
        }
        Progress::Completed { stage } => format!("Finished {}", stage),
    }
}

/// Use the provided key, or ask for one when a terminal is available.
fn resolve_api_key(provided: Option<String>, input_from_stdin: bool) -> Result<String> {
    if let Some(key) = provided.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    if input_from_stdin || !std::io::stdin().is_terminal() {
        anyhow::bail!("An API key is required: pass --api-key or set OPENAI_API_KEY");
    }
    let key = Password::new()
        .with_prompt("Enter OpenAI API key")
        .interact()
        .context("Failed to read API key")?;
    if key.trim().is_empty() {
        anyhow::bail!("An API key is required");
    }
    Ok(key.trim().to_string())
}
