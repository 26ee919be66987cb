//! Command line driver for the-suggest.
//!
//! - `rank` filters and ranks a JSON source against a query.
//! - `replay` runs a scripted session against the headless collaborators and
//!   prints every notification as a JSON line.

mod rank;
mod script;

use std::{
  path::{
    Path,
    PathBuf,
  },
  rc::Rc,
};

use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use eyre::{
  Result,
  WrapErr,
};
use log::LevelFilter;
use the_suggest::{
  AutocompleteConfig,
  SourceItem,
};

use crate::script::Script;

#[derive(Debug, Parser)]
#[command(name = "the-suggest")]
#[command(about = "Rank suggestions and replay autocomplete sessions")]
struct Cli {
  /// Engine options (TOML)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Filter and rank a JSON source against a query
  Rank {
    /// JSON array of strings or suggestion objects
    #[arg(long)]
    source: PathBuf,

    #[arg(long, default_value = "")]
    query: String,

    /// Return everything in source order when the query is empty
    #[arg(long)]
    open_on_focus: bool,
  },
  /// Replay a scripted session and print notifications as JSON lines
  Replay {
    /// Initial source; scripts may replace it with `source` steps
    #[arg(long)]
    source: Option<PathBuf>,

    #[arg(long)]
    script: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let config = match &cli.config {
    Some(path) => {
      AutocompleteConfig::load(path)
        .wrap_err_with(|| format!("invalid config {}", path.display()))?
    },
    None => AutocompleteConfig::default(),
  };

  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  match cli.command {
    Command::Rank {
      source,
      query,
      open_on_focus,
    } => {
      let source = load_source(&source)?;
      rank::run(
        &source,
        &query,
        open_on_focus || config.open_on_focus,
        &mut out,
      )
    },
    Command::Replay { source, script } => {
      let script = Script::load(&script)?;
      let source = source.as_deref().map(load_source).transpose()?;
      script::replay(config, source, &script, &mut out)
    },
  }
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .init();
}

fn load_source(path: &Path) -> Result<Rc<[SourceItem]>> {
  let text = std::fs::read_to_string(path)
    .wrap_err_with(|| format!("failed to read source {}", path.display()))?;
  let items: Vec<SourceItem> = serde_json::from_str(&text)
    .wrap_err_with(|| format!("source {} is not a JSON array", path.display()))?;
  log::info!("loaded {} source entries from {}", items.len(), path.display());
  Ok(Rc::from(items))
}
