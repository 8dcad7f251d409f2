use clap::Parser;

use crate::config::{DEFAULT_MAX_DOCUMENT_SIZE, PipelineConfig};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "capzip")]
#[command(version)]
#[command(about = "Convert a ZIP archive of CAP alerts into a GeoJSON FeatureCollection", long_about = None)]
#[command(after_help = "Examples:\n  \
  capzip alerts.zip -o alerts.geojson   write all alert areas to alerts.geojson\n  \
  capzip -l -v alerts.zip               list the alert documents in the archive\n  \
  capzip --ext cap feed.zip | jq .      read .cap entries and pipe the JSON")]
pub struct Cli {
    /// ZIP archive of CAP documents
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Write the FeatureCollection to FILE instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// List alert documents (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extension of alert documents inside the archive
    #[arg(long = "ext", value_name = "EXT", default_value = "xml")]
    pub extension: String,

    /// Skip documents larger than this many bytes
    #[arg(long = "max-size", value_name = "BYTES", default_value_t = DEFAULT_MAX_DOCUMENT_SIZE)]
    pub max_size: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Pipeline settings from `--ext` and `--max-size`
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_extension(&self.extension)
            .with_max_document_size(self.max_size)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Log filter for the tracing subscriber, before `RUST_LOG` overrides
    pub fn log_filter(&self) -> &'static str {
        match self.quiet {
            0 => "info",
            1 => "warn",
            _ => "error",
        }
    }
}
