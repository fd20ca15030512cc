//! Headless quickstart runner.
//!
//! Usage:
//!   quickstart [--config options.json] [--input doc.automerge] [--type TEXT] [--toggle] [--undo] [--output doc.automerge] [--stats]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quickcollab::quickstart::{self, EDITOR_1, EDITOR_2, REDO_BUTTON, TOGGLE_BUTTON, UNDO_BUTTON};
use quickcollab::{quickstart_loader, Page, RealtimeOptions};

#[derive(Parser, Debug)]
#[command(
    name = "quickstart",
    about = "Run the realtime quickstart against a headless page",
    version
)]
struct Args {
    /// Loader options as JSON (clientId, authButtonElementId, autoCreate, defaultTitle)
    #[arg(short, long, env = "QUICKSTART_CONFIG")]
    config: Option<PathBuf>,

    /// Application identifier, used when no config file is given
    #[arg(long, env = "QUICKSTART_CLIENT_ID", default_value = "quickstart-cli")]
    client_id: String,

    /// Document title (defaults to the config title, or the input file name when reopening)
    #[arg(long)]
    title: Option<String>,

    /// Reopen a saved document instead of creating one
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Save the document here when done
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Type this text into the first editor
    #[arg(long = "type", value_name = "TEXT")]
    text: Option<String>,

    /// Click the toggle button
    #[arg(long, default_value = "false")]
    toggle: bool,

    /// Click the undo button
    #[arg(long, default_value = "false")]
    undo: bool,

    /// Print document and UI statistics
    #[arg(long, default_value = "false")]
    stats: bool,
}

fn load_options(args: &Args) -> Result<RealtimeOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).context("Failed to read config file")?;
            RealtimeOptions::from_json(&json).context("Invalid config file")?
        }
        None => RealtimeOptions::new(&args.client_id),
    };
    if let Some(title) = &args.title {
        options.default_title = title.clone();
    }
    options.validate().context("Invalid loader options")?;
    Ok(options)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = load_options(&args)?;
    let page = Page::quickstart();
    let loader = quickstart_loader(options);

    // 1. Create or reopen the document
    let loaded = match &args.input {
        Some(path) => {
            let bytes = std::fs::read(path).context("Failed to read input document")?;
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            let title = args.title.clone().unwrap_or_else(|| id.clone());
            loader.authorize(&page).context("Failed to authorize")?;
            loader
                .load_file(&page, &id, &title, &bytes)
                .context("Failed to load document")?
        }
        None => loader
            .start(&page)
            .context("Failed to start loader")?
            .context("autoCreate is off and no --input was given")?,
    };

    // 2. Simulate user actions
    if let Some(text) = &args.text {
        let editor = page.text_area(EDITOR_1)?;
        if !editor.type_text(text) {
            anyhow::bail!("{} is disabled", EDITOR_1);
        }
    }
    if args.toggle && !page.button(TOGGLE_BUTTON)?.click() {
        anyhow::bail!("{} is disabled", TOGGLE_BUTTON);
    }
    if args.undo && !page.button(UNDO_BUTTON)?.click() {
        anyhow::bail!("Nothing to undo");
    }

    // 3. Print the shared state
    let state = quickstart::snapshot(&loaded.document).context("Failed to read document state")?;
    println!("{}", serde_json::to_string_pretty(&state)?);

    // 4. Optional save
    let binary = loaded.document.save();
    if let Some(output) = &args.output {
        std::fs::write(output, &binary).context("Failed to write output file")?;
        eprintln!("Saved {} bytes to {}", binary.len(), output.display());
    }

    // 5. Optional stats
    if args.stats {
        let model = loaded.document.get_model();
        eprintln!();
        eprintln!("Document statistics:");
        eprintln!("  ID:       {}", loaded.document.id());
        eprintln!("  Title:    {}", loaded.document.title());
        eprintln!("  Created:  {}", loaded.created);
        eprintln!("  Actor:    {}", model.actor_id());
        eprintln!("  Heads:    {}", model.get_heads().len());
        eprintln!("  Binary:   {} bytes", binary.len());
        eprintln!();
        eprintln!("UI state:");
        eprintln!("  {}: {:?}", EDITOR_2, page.text_area(EDITOR_2)?.value());
        for id in [UNDO_BUTTON, REDO_BUTTON, TOGGLE_BUTTON] {
            let state = if page.button(id)?.is_disabled() { "disabled" } else { "enabled" };
            eprintln!("  {}: {}", id, state);
        }
    }

    Ok(())
}
