use std::path::PathBuf;

use anyhow::{
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
};
use the_editor_outline::LogicalPosition;

/// A fold given on the command line, as 0-indexed lines. The region runs from
/// the end of `start_line` to the end of `end_line`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldArg {
  pub start_line: usize,
  pub end_line:   usize,
}

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub file:          PathBuf,
  pub output:        PathBuf,
  pub panel_width:   u32,
  pub panel_height:  u32,
  pub editor_width:  u32,
  pub editor_height: u32,
  pub folds:         Vec<FoldArg>,
  pub carets:        Vec<LogicalPosition>,
  pub scroll_line:   Option<usize>,
  pub verbosity:     u8,
  pub log_file:      Option<PathBuf>,
  pub config_file:   Option<PathBuf>,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(
  name = "the-outline",
  about = "Render the code outline of a file to a PNG",
  long_about = None,
  version
)]
struct RawCli {
  /// File to outline
  #[arg(value_name = "FILE")]
  file: PathBuf,

  /// Where to write the rendered panel
  #[arg(short = 'o', long = "output", value_name = "PNG", default_value = "outline.png")]
  output: PathBuf,

  /// Panel size as WIDTHxHEIGHT
  #[arg(long = "panel", value_name = "SIZE", default_value = "120x600", value_parser = parse_size)]
  panel: (u32, u32),

  /// Editor viewport size in pixels as WIDTHxHEIGHT
  #[arg(long = "editor", value_name = "SIZE", default_value = "800x600", value_parser = parse_size)]
  editor: (u32, u32),

  /// Collapse lines FROM:TO (1-based, inclusive); repeatable
  #[arg(long = "fold", value_name = "FROM:TO", value_parser = parse_fold)]
  folds: Vec<FoldArg>,

  /// Place a caret at LINE[:COL] (1-based); repeatable
  #[arg(long = "caret", value_name = "LINE[:COL]", value_parser = parse_position)]
  carets: Vec<LogicalPosition>,

  /// Scroll the editor so LINE (1-based) is centred
  #[arg(long = "scroll-to", value_name = "LINE", value_parser = parse_line)]
  scroll_line: Option<usize>,

  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let (panel_width, panel_height) = raw.panel;
    let (editor_width, editor_height) = raw.editor;
    if panel_width == 0 || panel_height == 0 {
      bail!("panel size must not be zero");
    }

    let mut carets = raw.carets;
    if carets.is_empty() {
      carets.push(LogicalPosition::zero());
    }

    Ok(Self {
      file: raw.file,
      output: raw.output,
      panel_width,
      panel_height,
      editor_width,
      editor_height,
      folds: raw.folds,
      carets,
      scroll_line: raw.scroll_line,
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
    })
  }
}

fn parse_size(value: &str) -> std::result::Result<(u32, u32), String> {
  let parsed = value
    .split_once(['x', 'X'])
    .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
  parsed.ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))
}

fn parse_line(value: &str) -> std::result::Result<usize, String> {
  match value.parse::<usize>() {
    Ok(line) if line > 0 => Ok(line - 1),
    _ => Err(format!("expected a line number starting at 1, got '{value}'")),
  }
}

fn parse_fold(value: &str) -> std::result::Result<FoldArg, String> {
  let (from, to) = value
    .split_once(':')
    .ok_or_else(|| format!("expected FROM:TO, got '{value}'"))?;
  let start_line = parse_line(from)?;
  let end_line = parse_line(to)?;
  if end_line <= start_line {
    return Err(format!("fold '{value}' must span at least two lines"));
  }
  Ok(FoldArg {
    start_line,
    end_line,
  })
}

fn parse_position(value: &str) -> std::result::Result<LogicalPosition, String> {
  let (line, column) = match value.split_once(':') {
    Some((line, column)) => (line, Some(column)),
    None => (value, None),
  };
  let line = parse_line(line)?;
  let column = match column {
    Some(column) => parse_line(column)?,
    None => 0,
  };
  Ok(LogicalPosition::new(line, column))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sizes() {
    assert_eq!(parse_size("120x600"), Ok((120, 600)));
    assert_eq!(parse_size("8X9"), Ok((8, 9)));
    assert!(parse_size("120").is_err());
    assert!(parse_size("ax4").is_err());
  }

  #[test]
  fn folds_are_one_based() {
    assert_eq!(
      parse_fold("3:9"),
      Ok(FoldArg {
        start_line: 2,
        end_line:   8,
      })
    );
    assert!(parse_fold("9:3").is_err());
    assert!(parse_fold("0:3").is_err());
    assert!(parse_fold("4").is_err());
  }

  #[test]
  fn positions() {
    assert_eq!(parse_position("12"), Ok(LogicalPosition::new(11, 0)));
    assert_eq!(parse_position("12:5"), Ok(LogicalPosition::new(11, 4)));
    assert!(parse_position("x:1").is_err());
  }

  #[test]
  fn defaults_place_one_caret_at_start() {
    let raw = RawCli::try_parse_from(["the-outline", "main.rs"]).unwrap();
    let options = CliOptions::try_from(raw).unwrap();
    assert_eq!(options.carets, vec![LogicalPosition::zero()]);
    assert_eq!((options.panel_width, options.panel_height), (120, 600));
    assert_eq!(options.output, PathBuf::from("outline.png"));
  }

  #[test]
  fn zero_panel_is_rejected() {
    let raw = RawCli::try_parse_from(["the-outline", "main.rs", "--panel", "0x10"]).unwrap();
    assert!(CliOptions::try_from(raw).is_err());
  }
}
