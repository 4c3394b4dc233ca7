//! Estimate command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use super::utils::{read_input, SettingsArgs};
use crate::chunk::{plan, Plan};
use crate::utils::{estimate_tokens, format_with_commas};

#[derive(Args)]
pub struct EstimateArgs {
    /// File to estimate; reads stdin when omitted or `-`
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Print the full prompt of every batch
    #[arg(long)]
    pub show_prompts: bool,
}

pub fn run(args: EstimateArgs) -> Result<()> {
    let config = args.settings.resolve()?;
    let (text, name) = read_input(args.input.as_deref())?;

    let raw_tokens = estimate_tokens(&text);
    let plan = plan(&text, &config);

    println!("Input: {}", name);
    println!("  Lines: {}", format_with_commas(text.lines().count()));
    println!("  Estimated tokens: {}", format_with_commas(raw_tokens));
    if plan.token_estimate() != raw_tokens {
        println!("  After comment stripping: {}", format_with_commas(plan.token_estimate()));
    }
    println!("Limits:");
    println!("  Per-request cap: {}", format_with_commas(config.per_request_cap));
    println!(
        "  Budget: {} tokens per {}s (max wait {}s)",
        format_with_commas(config.per_minute_budget),
        config.window_secs,
        config.max_wait_secs
    );

    match &plan {
        Plan::Single { prompt, .. } => {
            println!("Plan: {}", style("single request").green());
            if args.show_prompts {
                println!("\n{}", prompt);
            }
        }
        Plan::Chunked { batches, .. } => {
            println!(
                "Plan: {} + 1 summary request",
                style(format!("{} chunks", batches.len())).yellow()
            );
            for batch in batches {
                let over = if batch.token_estimate > config.per_request_cap {
                    style(" (over cap)").red().to_string()
                } else {
                    String::new()
                };
                println!(
                    "  #{:<3} lines {}-{}  ~{} tokens  [{}]{}",
                    batch.index + 1,
                    batch.start_line,
                    batch.end_line,
                    format_with_commas(batch.token_estimate),
                    batch.id,
                    over
                );
                if args.show_prompts {
                    println!("\n{}", batch.prompt);
                }
            }
        }
    }
    println!("Completion calls: {}", plan.call_count());

    Ok(())
}
