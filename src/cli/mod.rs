//! CLI interface for mapsonic

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sonify and glyph-annotate urban map features
#[derive(Parser)]
#[command(name = "mapsonic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario of pointer events against an in-memory map
    Replay {
        /// Scenario file (map layers plus timed events)
        scenario: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run without waiting between events
        #[arg(long)]
        fast: bool,

        /// Write the scheduled notes as JSON lines
        #[arg(short, long, conflicts_with = "midi")]
        record: Option<PathBuf>,

        /// Play through a MIDI output port (optionally matching a name)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        midi: Option<String>,
    },

    /// Render a city-block glyph as SVG
    Glyph {
        /// Block properties as JSON or YAML
        properties: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave the height metric out
        #[arg(long)]
        no_height: bool,

        /// Leave the age metric out
        #[arg(long)]
        no_age: bool,

        /// Leave the land-use metric out
        #[arg(long)]
        no_land_use: bool,

        /// Leave the street metric out
        #[arg(long)]
        no_street: bool,
    },

    /// Show what each classifier makes of a height or age
    Classify {
        /// Building height in metres
        #[arg(long)]
        height: Option<f64>,

        /// Building age in years
        #[arg(long)]
        age: Option<f64>,
    },

    /// List instruments, their samples and the MIDI output ports
    Instruments,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "mapsonic.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
