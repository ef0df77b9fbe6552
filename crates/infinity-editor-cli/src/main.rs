use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use infinity_editor_core::{EditorConfig, EditorRope, parse_html, write_html};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::EnvFilter;

mod script;

use script::Script;

#[derive(Parser)]
#[command(version, about = "Infinity - headless rich-text document editor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON script of editor events and print every notification
    Replay {
        /// Path to the script
        script: PathBuf,

        /// Editor config (.json or .toml), overrides the script's own
        #[arg(long, env = "INFINITY_EDITOR_CONFIG")]
        config: Option<PathBuf>,

        /// File holding the initial content, overrides the script's own
        #[arg(long)]
        initial: Option<PathBuf>,

        /// Print notifications and the summary as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Read markup and print it in canonical form
    Normalize {
        /// Path to the markup file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    init_miette()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            config,
            initial,
            json,
        } => replay(&script, config.as_deref(), initial.as_deref(), json)?,
        Commands::Normalize { file } => {
            let markup = read(&file)?;
            let parsed = parse_html(&markup);
            println!("{}", write_html(&EditorRope::from_parts(&parsed.text, parsed.styles)));
        }
    }

    Ok(())
}

fn replay(path: &Path, config: Option<&Path>, initial: Option<&Path>, json: bool) -> Result<()> {
    let source = read(path)?;
    let script: Script = serde_json::from_str(&source)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid script {}", path.display()))?;

    let config = match config {
        Some(path) => EditorConfig::from_path(path)
            .into_diagnostic()
            .wrap_err("failed to load editor config")?,
        None => {
            let config = script.config.clone().unwrap_or_default();
            config
                .validate()
                .into_diagnostic()
                .wrap_err("invalid config in script")?;
            config
        }
    };
    let initial = match initial {
        Some(path) => read(path)?,
        None => script.initial.clone(),
    };

    tracing::info!(events = script.events.len(), "replaying {}", path.display());
    let summary = script::replay(&script, &initial, config, json, true);

    if json {
        let line = serde_json::json!({
            "final_content": summary.final_content,
            "immediate": summary.immediate,
            "debounced": summary.debounced,
            "unmount": summary.unmount,
        });
        println!("{line}");
    } else {
        println!();
        println!(
            "{} immediate, {} debounced, {} unmount",
            summary.immediate, summary.debounced, summary.unmount
        );
        println!("final: {}", summary.final_content);
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()
    .wrap_err("couldn't set the miette hook")?;
    miette::set_panic_hook();
    Ok(())
}
