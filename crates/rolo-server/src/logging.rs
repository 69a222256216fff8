//! Tracing subscriber setup.
//!
//! Misconfiguration never stops the server: an unparseable option falls back
//! to its default and a warning is logged once the subscriber is up.

use std::{
  fs::{File, OpenOptions},
  io,
  path::PathBuf,
  sync::Mutex,
};

use anyhow::Context as _;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

/// The path that selects the discarding writer.
pub const DEV_NULL: &str = "/dev/null";

/// `[log]` section of the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// `debug`, `info`, `warn` or `error`. Empty defers to `RUST_LOG`, then
  /// `info`.
  #[serde(default)]
  pub level:  String,
  /// `text` or `json`. Empty means `text`.
  #[serde(default)]
  pub format: String,
  /// Append logs to this file. Empty or `-` means stdout.
  #[serde(default)]
  pub file:   String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Text,
  Json,
}

pub enum Output {
  Stdout,
  Discard,
  File(PathBuf, File),
}

/// A [`LogConfig`] with every option resolved to something usable.
pub struct Resolved {
  /// `None` means "read `RUST_LOG`".
  pub level:    Option<LevelFilter>,
  pub format:   Format,
  pub output:   Output,
  /// Fallbacks taken while resolving, to be logged after init.
  pub warnings: Vec<String>,
}

fn parse_level(s: &str) -> Result<Option<LevelFilter>, ()> {
  match s.to_ascii_lowercase().as_str() {
    "" => Ok(None),
    "debug" => Ok(Some(LevelFilter::DEBUG)),
    "info" => Ok(Some(LevelFilter::INFO)),
    "warn" => Ok(Some(LevelFilter::WARN)),
    "error" => Ok(Some(LevelFilter::ERROR)),
    _ => Err(()),
  }
}

impl LogConfig {
  pub fn resolve(&self) -> Resolved {
    let mut warnings = Vec::new();

    let level = parse_level(&self.level).unwrap_or_else(|()| {
      warnings.push(format!("could not parse logger level {:?}", self.level));
      None
    });

    let format = match self.format.to_ascii_lowercase().as_str() {
      "" | "text" => Format::Text,
      "json" => Format::Json,
      other => {
        warnings.push(format!("could not parse logger format {other:?}"));
        Format::Text
      }
    };

    let output = match self.file.as_str() {
      "" | "-" => Output::Stdout,
      DEV_NULL => Output::Discard,
      path => match OpenOptions::new().append(true).create(true).open(path) {
        Ok(file) => Output::File(PathBuf::from(path), file),
        Err(e) => {
          warnings.push(format!("could not open logger file {path:?}: {e}"));
          Output::Stdout
        }
      },
    };

    Resolved { level, format, output, warnings }
  }
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
  let Resolved { level, format, output, warnings } = config.resolve();

  let filter = match level {
    Some(level) => EnvFilter::default().add_directive(level.into()),
    None => EnvFilter::builder()
      .with_default_directive(LevelFilter::INFO.into())
      .from_env_lossy(),
  };

  let ansi = matches!(output, Output::Stdout);
  let (writer, path) = match output {
    Output::Stdout => (BoxMakeWriter::new(io::stdout), None),
    Output::Discard => (BoxMakeWriter::new(io::sink), None),
    Output::File(path, file) => (BoxMakeWriter::new(Mutex::new(file)), Some(path)),
  };

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(ansi);
  let installed = match format {
    Format::Text => builder.try_init(),
    Format::Json => builder.json().try_init(),
  };
  installed
    .map_err(|e| anyhow::anyhow!(e))
    .context("failed to install tracing subscriber")?;

  if let Some(path) = path {
    tracing::info!(path = %path.display(), ?format, "logging to file");
  }
  for warning in warnings {
    tracing::warn!("{warning}");
  }
  Ok(())
}
