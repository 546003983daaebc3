use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::clipboard::{self, SystemClipboard};
use crate::config::{PaletteConfig, default_config_path};
use crate::debounce::DebouncedPipe;
use crate::history::{self, FileStorage, HistoryStore};
use crate::intent::IntentParser;
use crate::models::{HistoryEntry, HistoryKind};
use crate::palette::{ActionExecutor, JsonLineExecutor, Palette, PaletteMode};
use crate::search::{
    RankedSuggestion, SearchProvider, SessionManager, SessionSnapshot, StaticProvider,
    merge_results,
};

#[derive(Parser)]
#[command(name = "command-palette")]
#[command(version = "0.1.0")]
#[command(about = "Parse palette commands, search catalogues and manage palette history", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted history
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse free text and print the resulting command as JSON
    Parse {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Classify clipboard content (reads the system clipboard when no text is given)
    Classify { text: Option<String> },
    /// Inspect or edit the palette history
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Query JSON catalogues through the search session manager
    Search {
        query: String,
        /// JSON array of suggestions; the file stem names the source
        #[arg(long = "catalog", required = true)]
        catalogs: Vec<PathBuf>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Treat stdin lines as keystrokes and print each debounced query's parse
    Watch,
    /// Type text into a palette session and print the resulting view
    Run {
        text: String,
        #[arg(long = "catalog")]
        catalogs: Vec<PathBuf>,
        /// Select this merged result, entering chain mode
        #[arg(long)]
        select: Option<usize>,
        /// Then run this chain action
        #[arg(long, requires = "select")]
        chain: Option<usize>,
        /// Act on the parsed intent instead of searching
        #[arg(long, conflicts_with = "select")]
        execute: bool,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Print entries, most recent first
    List,
    Add {
        query: String,
        #[arg(long, value_enum, default_value_t = KindArg::Search)]
        kind: KindArg,
    },
    Remove { query: String },
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Action,
    Search,
    Navigation,
}

impl From<KindArg> for HistoryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Action => HistoryKind::Action,
            KindArg::Search => HistoryKind::Search,
            KindArg::Navigation => HistoryKind::Navigation,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Some(Commands::Parse { text }) => {
            let parser = IntentParser::from_config(&config);
            print_json(&parser.parse(&text.join(" ")))?;
        }
        Some(Commands::Classify { text }) => {
            let suggestion = match text {
                Some(text) => clipboard::classify(text),
                None => clipboard::inspect(&mut SystemClipboard::new()),
            };
            match suggestion {
                Some(suggestion) => print_json(&suggestion)?,
                None => println!("No suggestion"),
            }
        }
        Some(Commands::History { action }) => {
            let mut store = open_history(&config, cli.data_dir.as_deref())?;
            run_history(&mut store, action)?;
        }
        Some(Commands::Search { query, catalogs, limit }) => {
            let providers = load_catalogs(catalogs)?;
            block_on(search(&config, providers, query, *limit))?;
        }
        Some(Commands::Watch) => {
            block_on(watch(&config))?;
        }
        Some(Commands::Run { text, catalogs, select, chain, execute }) => {
            let providers = load_catalogs(catalogs)?;
            let storage = Box::new(FileStorage::new(data_dir(cli.data_dir.as_deref())?));
            let mut palette =
                Palette::new(&config, providers, storage, Box::new(SystemClipboard::new()));
            let options = RunOptions { select: *select, chain: *chain, execute: *execute };
            block_on(run_palette(&mut palette, text, options))?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PaletteConfig> {
    match path {
        Some(path) if !path.exists() => bail!("Config file not found: {}", path.display()),
        Some(path) => PaletteConfig::load(path),
        None => PaletteConfig::load(&default_config_path()?),
    }
}

fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => history::default_data_dir().context("Failed to get platform data directory"),
    }
}

fn open_history(config: &PaletteConfig, explicit: Option<&Path>) -> Result<HistoryStore> {
    let storage = FileStorage::new(data_dir(explicit)?);
    debug!(dir = %storage.dir().display(), "opening history");
    Ok(HistoryStore::from_config(Box::new(storage), config))
}

fn run_history(store: &mut HistoryStore, action: &HistoryCommand) -> Result<()> {
    match action {
        HistoryCommand::List => {
            if store.is_empty() {
                println!("History is empty");
            }
            for entry in store.list() {
                let when = chrono::DateTime::from_timestamp_millis(entry.timestamp)
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("{}  {:<10}  {}", when, kind_label(entry.kind), entry.query);
            }
        }
        HistoryCommand::Add { query, kind } => {
            store.add(HistoryEntry::new(query.clone(), (*kind).into()));
            ensure_persisted(store)?;
            println!("Added: {}", query);
        }
        HistoryCommand::Remove { query } => {
            if !store.remove(query) {
                bail!("No history entry for {:?}", query);
            }
            ensure_persisted(store)?;
            println!("Removed: {}", query);
        }
        HistoryCommand::Clear => {
            store.clear();
            ensure_persisted(store)?;
            println!("History cleared");
        }
    }
    Ok(())
}

/// The store swallows write failures; a one-shot command should still report them
fn ensure_persisted(store: &HistoryStore) -> Result<()> {
    if store.is_dirty() {
        bail!("Failed to persist history");
    }
    Ok(())
}

fn kind_label(kind: HistoryKind) -> &'static str {
    match kind {
        HistoryKind::Action => "action",
        HistoryKind::Search => "search",
        HistoryKind::Navigation => "navigation",
    }
}

fn load_catalogs(paths: &[PathBuf]) -> Result<Vec<Arc<dyn SearchProvider>>> {
    paths
        .iter()
        .map(|path| {
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .with_context(|| format!("Invalid catalog file name: {}", path.display()))?;
            let provider: Arc<dyn SearchProvider> =
                Arc::new(StaticProvider::from_json_file(id, path)?);
            Ok(provider)
        })
        .collect()
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(future)
}

#[derive(Serialize)]
struct SearchReport {
    sources: Vec<SessionSnapshot>,
    results: Vec<RankedSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
}

async fn search(
    config: &PaletteConfig,
    providers: Vec<Arc<dyn SearchProvider>>,
    query: &str,
    limit: usize,
) -> Result<()> {
    let sessions = SessionManager::from_config(config, providers);
    sessions.submit_all(query).await;

    let sources = sessions.states();
    let sets: Vec<_> =
        sources.iter().map(|s| (s.source_id.as_str(), s.results.as_slice())).collect();
    let results = merge_results(query, &sets, limit);
    let note = (query.trim().chars().count() < config.min_query_len).then_some("query too short");
    print_json(&SearchReport { sources, results, note })
}

async fn watch(config: &PaletteConfig) -> Result<()> {
    let parser = IntentParser::from_config(config);
    let (pipe, mut committed) = DebouncedPipe::spawn(config.debounce());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => {
                    pipe.send(line);
                }
                None => break,
            },
            Some(query) = committed.recv() => print_json_line(&parser.parse(&query))?,
        }
    }

    pipe.finish().await;
    while let Some(query) = committed.recv().await {
        print_json_line(&parser.parse(&query))?;
    }
    Ok(())
}

struct RunOptions {
    select: Option<usize>,
    chain: Option<usize>,
    execute: bool,
}

async fn run_palette(palette: &mut Palette, text: &str, options: RunOptions) -> Result<()> {
    let mut executor = JsonLineExecutor::new(io::stdout());

    palette.open();
    palette.input(text);

    if options.execute {
        match palette.execute_command() {
            Some(action) => return executor.execute(&action),
            None => bail!("No actionable command in {:?}", text),
        }
    }

    palette.settle().await;

    if let Some(index) = options.select {
        palette.select_result(index).with_context(|| format!("No result at index {index}"))?;
        if let Some(index) = options.chain {
            let action = palette
                .select_chain_action(index)
                .with_context(|| format!("No chain action at index {index}"))?;
            return executor.execute(&action);
        }
    }

    let view = palette.view();
    debug!(mode = ?view.mode, results = view.results.len(), "palette settled");
    print_json(&view)?;
    if view.mode == PaletteMode::Command && view.results.is_empty() && view.intent.is_none() {
        eprintln!("No results");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_json_line<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).context("Failed to serialize output")?;
    writeln!(stdout).context("Failed to write output")?;
    Ok(())
}
