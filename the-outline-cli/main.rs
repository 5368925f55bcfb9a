use std::{
  fs,
  io::ErrorKind,
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
};

use anyhow::{
  Context,
  Result,
};
use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use the_editor_outline::{
  ConfigLoadError,
  FaultReporter,
  FaultSink,
  FoldRegion,
  LogicalPosition,
  OutlineConfig,
  OutlinePanel,
  Size,
  host::{
    DocumentSource,
    ScrollModel,
  },
  memory::MemoryHost,
  panel::PaintReport,
};
use tiny_skia::Pixmap;

use crate::cli::{
  CliOptions,
  FoldArg,
};

mod cli;

const FOLD_PLACEHOLDER: &str = "{...}";

fn main() -> Result<()> {
  let options = CliOptions::parse()?;

  let log_file = match &options.log_file {
    Some(path) => path.clone(),
    None => default_log_file()?,
  };
  setup_logging(&log_file, options.verbosity).context("failed to initialize logging")?;

  let config = load_config(options.config_file.as_deref())?;
  let report = run(&options, &config)?;
  println!(
    "wrote {} ({}x{} panel, {}x{} miniature)",
    options.output.display(),
    options.panel_width,
    options.panel_height,
    report.miniature.width,
    report.miniature.height
  );
  Ok(())
}

fn run(options: &CliOptions, config: &OutlineConfig) -> Result<PaintReport> {
  let text = fs::read_to_string(&options.file)
    .with_context(|| format!("failed to read {}", options.file.display()))?;

  let mut host = MemoryHost::new(&text);
  host.viewport = Size::new(options.editor_width, options.editor_height);
  host.folds = options
    .folds
    .iter()
    .map(|fold| fold_region(&host, *fold))
    .collect();
  host.carets = options.carets.clone();
  log::info!(
    "outlining {} ({} lines, {} folds)",
    options.file.display(),
    host.line_count(),
    host.folds.len()
  );

  let faults = Arc::new(FaultReporter::new(config.fault_policy, Some(Box::new(StderrSink))));
  let mut panel =
    OutlinePanel::new(host, config, faults).context("invalid outline configuration")?;
  if let Some(line) = options.scroll_line {
    panel
      .host_mut()
      .scroll_to(LogicalPosition::new(line, 0), false);
  }

  let mut target = Pixmap::new(options.panel_width, options.panel_height)
    .context("failed to allocate the panel surface")?;
  let report = panel.try_paint(&mut target).context("failed to paint the outline")?;
  if let Some(stats) = report.rasterized {
    log::debug!(
      "{} rows, {} tokens, {} glyph runs, {} bands",
      stats.rows,
      stats.tokens,
      stats.glyph_runs,
      stats.bands
    );
  }

  target
    .save_png(&options.output)
    .with_context(|| format!("failed to write {}", options.output.display()))?;
  Ok(report)
}

/// Collapse from the end of the first line to the end of the last one, so
/// the first line stays visible with the placeholder after it.
fn fold_region(doc: &MemoryHost, fold: FoldArg) -> FoldRegion {
  let start = doc.line_bounds(fold.start_line).content_end();
  let end = doc.line_bounds(fold.end_line).content_end();
  FoldRegion::collapsed(start, end, FOLD_PLACEHOLDER)
}

struct StderrSink;

impl FaultSink for StderrSink {
  fn notify(&self, message: &str) {
    eprintln!("{message}");
  }
}

fn load_config(specified: Option<&Path>) -> Result<OutlineConfig> {
  let global = match specified {
    Some(path) => path.to_path_buf(),
    None => default_config_file()?,
  };
  let local = workspace_config_file();

  match OutlineConfig::load_files(&global, &local) {
    Ok(config) => Ok(config),
    Err(ConfigLoadError::Error(err)) if err.kind() == ErrorKind::NotFound && specified.is_none() => {
      Ok(OutlineConfig::default())
    },
    Err(err) => Err(err).context("failed to load outline configuration"),
  }
}

fn default_config_file() -> Result<PathBuf> {
  let strategy = choose_base_strategy().context("unable to find the config directory")?;
  Ok(strategy.config_dir().join("the-outline").join("outline.toml"))
}

fn workspace_config_file() -> PathBuf {
  PathBuf::from(".the-outline").join("outline.toml")
}

fn default_log_file() -> Result<PathBuf> {
  let strategy = choose_base_strategy().context("unable to find the cache directory")?;
  Ok(strategy.cache_dir().join("the-outline").join("the-outline.log"))
}

fn setup_logging(log_file: &Path, verbosity: u8) -> Result<()> {
  if let Some(parent) = log_file.parent() {
    fs::create_dir_all(parent)?;
  }

  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  fern::Dispatch::new()
    .level(level)
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(fern::log_file(log_file)?)
    .apply()?;
  Ok(())
}
