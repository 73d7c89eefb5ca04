use clap::{Args as ClapArgs, Parser, Subcommand};
use format_copier::config::{Config, DEFAULT_HOST};
use format_copier::dispatch::{Dispatcher, LocalHost, Outcome, PageAgent, Tab, Target};
use format_copier::page::Page;
use format_copier::snapshot::Mode;
use format_copier::store::{FileStore, SnapshotStore};
use std::fs;
use std::path::PathBuf;

const TAB_ID: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "format-copier")]
#[command(about = "Copy rich-text formatting between selections of a compose body", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot store file (overrides the configuration)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(ClapArgs, Debug)]
struct SelectionArgs {
    /// Markup file holding the page
    file: PathBuf,

    /// Text to select inside the compose body
    #[arg(long = "select", value_name = "TEXT")]
    text: String,

    /// Which occurrence of the text to select
    #[arg(long, default_value = "1")]
    occurrence: usize,

    /// Word-by-word mode
    #[arg(long)]
    words: bool,

    /// URL the page is pretended to be loaded from
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy the format of a selection
    Copy {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Paste the copied format onto a selection and print the page
    Paste {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the page here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the copied format
    Show {
        /// Show the word-by-word format
        #[arg(long)]
        words: bool,
    },
    /// Forget everything copied so far
    Reset,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn mode_for(words: bool, config: &Config) -> Mode {
    if words { Mode::Words } else { config.mode }
}

/// Load the page, select the text and run `command` like a keyboard shortcut
fn run_command(
    selection: &SelectionArgs,
    command: &str,
    mode: Mode,
    config: Config,
    store: FileStore,
) -> Result<Page, String> {
    let markup = fs::read_to_string(&selection.file)
        .map_err(|e| format!("Failed to read '{}': {}", selection.file.display(), e))?;
    let mut page = Page::from_markup(&markup).map_err(|e| e.to_string())?;
    page.select_text(&selection.text, selection.occurrence)
        .map_err(|_| format!("'{}' not found in the page", selection.text))?;

    let target = Target::top(TAB_ID);
    let mut host = LocalHost::new(PageAgent::new(mode));
    host.insert(target, page);

    let tab = Tab {
        id: TAB_ID,
        url: selection
            .url
            .clone()
            .unwrap_or_else(|| format!("https://{DEFAULT_HOST}/")),
    };
    let mut dispatcher = Dispatcher::new(host, store, config);
    match dispatcher.on_command(command, &tab) {
        Outcome::Copied(_) | Outcome::Pasted(_) => {}
        Outcome::Ignored => return Err(format!("Command ignored on {}", tab.url)),
        Outcome::NoOp(err) => return Err(err.to_string()),
    }

    dispatcher
        .host_mut()
        .remove(target)
        .ok_or_else(|| "Page went away".to_string())
}

fn cmd_copy(selection: SelectionArgs, config: Config, store: FileStore) -> Result<(), String> {
    let mode = mode_for(selection.words, &config);
    let command = match mode {
        Mode::Classic => "copy-format",
        Mode::Words => "copy-word-format",
    };
    run_command(&selection, command, mode, config, store)?;
    println!("Format copied.");
    Ok(())
}

fn cmd_paste(
    selection: SelectionArgs,
    output: Option<PathBuf>,
    config: Config,
    store: FileStore,
) -> Result<(), String> {
    let mode = mode_for(selection.words, &config);
    let command = match mode {
        Mode::Classic => "paste-format",
        Mode::Words => "paste-word-format",
    };
    let page = run_command(&selection, command, mode, config, store)?;
    let markup = page.to_markup();

    match output {
        Some(path) => fs::write(&path, markup)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e)),
        None => {
            println!("{}", markup);
            Ok(())
        }
    }
}

fn cmd_show(words: bool, config: &Config, store: &FileStore) -> Result<(), String> {
    let mode = mode_for(words, config);
    match store
        .load(mode.storage_key())
        .map_err(|e| e.to_string())?
    {
        Some(value) => {
            let json = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        None => println!("(nothing copied)"),
    }
    Ok(())
}

fn cmd_reset(config: Config, store: FileStore) -> Result<(), String> {
    let mut dispatcher = Dispatcher::new(LocalHost::default(), store, config);
    dispatcher.on_installed().map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load(args.config.as_deref());
    let store = FileStore::new(args.store.clone().unwrap_or_else(|| config.store_path()));

    let result = match args.command {
        Commands::Copy { selection } => cmd_copy(selection, config, store),
        Commands::Paste { selection, output } => cmd_paste(selection, output, config, store),
        Commands::Show { words } => cmd_show(words, &config, &store),
        Commands::Reset => cmd_reset(config, store),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
