use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use ferry_core::{Assistant, Config, config, providers, tools};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod display;
mod onboard;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "ferry - tool-calling chat loop for local models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write ~/.ferry/config.toml interactively
    Init,
    Chat {
        #[arg(short, long)]
        message: Option<String>,
        /// Mirror every message and print the step trace
        #[arg(long)]
        debug: bool,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },
}

fn init_tracing(debug: bool) {
    let default_directive = if debug {
        "warn,ferry_core=debug"
    } else {
        "warn,ferry_core=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_assistant(config: &Config) -> Result<Assistant> {
    if !config.workspace_dir.exists() {
        std::fs::create_dir_all(&config.workspace_dir).map_err(|e| {
            anyhow::anyhow!(
                "Could not create workspace at {}: {}",
                config.workspace_dir.display(),
                e
            )
        })?;
    }

    let provider = providers::create_provider(config)?;
    let options = config
        .to_assistant_options()
        .with_tool(Arc::new(tools::FileReadTool::new(&config.workspace_dir)))
        .with_tool(Arc::new(tools::ShellTool::new(&config.workspace_dir)))
        .with_tool(Arc::new(tools::CurrentTimeTool::new()));

    Ok(Assistant::new(provider, options).with_sink(Arc::new(display::ConsoleSink)))
}

async fn ask_and_print(assistant: &mut Assistant, prompt: &str) -> Result<()> {
    let answer = assistant.ask(prompt).await?;
    println!("{}", answer.response);
    if let Some(steps) = &answer.steps {
        display::print_steps(steps);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Chat {
        message: None,
        debug: false,
        model: None,
    });

    match command {
        Commands::Init => {
            init_tracing(false);
            let config = onboard::run_onboard()?;
            config::save_config(&config)?;
        }
        Commands::Chat {
            message,
            debug,
            model,
        } => {
            let mut config = Config::load_or_init()?;
            config.debug |= debug;
            if let Some(model) = model {
                config.model = model;
            }
            init_tracing(config.debug);

            let mut assistant = build_assistant(&config)?;

            if let Some(msg) = message {
                if let Err(e) = ask_and_print(&mut assistant, &msg).await {
                    eprintln!("{} {}", style("error:").red().bold(), e);
                    anyhow::bail!("Chat failed: {}", e);
                }
                return Ok(());
            }

            println!("{} ({})", style("ferry").cyan().bold(), assistant.model());
            println!("Type your message, /context to dump history (Ctrl+D to exit):\n");
            use std::io::BufRead;
            let stdin = std::io::stdin();

            loop {
                print!("> ");
                let _ = std::io::stdout().flush();

                let mut input = String::new();
                let read = stdin.lock().read_line(&mut input);
                match read {
                    Ok(0) | Err(_) => {
                        println!();
                        break;
                    }
                    Ok(_) => {
                        let input = input.trim();
                        if input.is_empty() {
                            continue;
                        }
                        if input == "/context" {
                            assistant.log_context();
                            continue;
                        }

                        if let Err(e) = ask_and_print(&mut assistant, input).await {
                            eprintln!("{} {}", style("error:").red().bold(), e);
                        }
                        println!();
                    }
                }
            }
        }
    }

    Ok(())
}
