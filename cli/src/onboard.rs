use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};
use ferry_core::config::{self, Config};
use ferry_core::providers::ollama::DEFAULT_BASE_URL;

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_base_url() -> Result<Option<String>> {
    let base_url: String = Input::new()
        .with_prompt("Ollama server URL")
        .default(DEFAULT_BASE_URL.to_string())
        .interact_text()
        .context("Failed to read server URL")?;

    let base_url = base_url.trim().trim_end_matches('/');
    if base_url.is_empty() || base_url == DEFAULT_BASE_URL {
        Ok(None)
    } else {
        Ok(Some(base_url.to_string()))
    }
}

fn setup_model(default: &str) -> Result<String> {
    let model: String = Input::new()
        .with_prompt("Model name")
        .default(default.to_string())
        .interact_text()
        .context("Failed to read model name")?;

    let model = model.trim();
    if model.is_empty() {
        return Err(anyhow::anyhow!("Model name cannot be empty"));
    }

    Ok(model.to_string())
}

fn setup_debug() -> Result<bool> {
    Confirm::new()
        .with_prompt("Trace every message and return step lists?")
        .default(false)
        .interact()
        .context("Failed to read debug choice")
}

pub fn run_onboard() -> Result<Config> {
    println!("  {}", style("ferry setup").white().bold());
    println!(
        "  {}",
        style("Point ferry at a chat backend and pick a model.").dim()
    );

    let defaults = Config::default();

    print_step(1, 3, "Backend");
    let base_url = setup_base_url()?;

    print_step(2, 3, "Model");
    let model = setup_model(&defaults.model)?;

    print_step(3, 3, "Debug tracing");
    let debug = setup_debug()?;

    let config = Config {
        provider: Some("ollama".to_string()),
        base_url,
        model,
        debug,
        ..defaults
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(config::get_config_path().display()).cyan()
    );
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("ferry chat").cyan().bold()
    );
    println!();

    Ok(config)
}
