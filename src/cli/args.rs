use crate::config::LinkerConfig;
use crate::linkage::{CountryResolution, Scorer};
use crate::utils::constants::{COMPRESSION_SNAPPY, DEFAULT_CHUNK_SIZE};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aq-linker")]
#[command(about = "Link city air-quality measurements to gazetteer coordinates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Configuration file (TOML, JSON or YAML); AQ_LINKER_* variables override it"
    )]
    pub config: Option<PathBuf>,
}

/// Input tables plus the linkage settings that can be overridden per run.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[arg(short, long, help = "Air-quality measurement CSV")]
    pub measurements: PathBuf,

    #[arg(short, long, help = "City gazetteer CSV with coordinates")]
    pub gazetteer: PathBuf,

    #[arg(short, long, help = "Accept matches scoring strictly above this [default: 85]")]
    pub threshold: Option<f64>,

    #[arg(long, help = "Similarity scorer: ratio, levenshtein or jaro_winkler")]
    pub scorer: Option<Scorer>,

    #[arg(long, help = "Resolve countries on both sides and drop unrecognized rows")]
    pub strict_countries: bool,

    #[arg(long, help = "Worker threads for matching [default: all cores]")]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Fail instead of comparing more than this many city pairs")]
    pub max_pairs: Option<u64>,
}

impl LinkArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut LinkerConfig) {
        if let Some(threshold) = self.threshold {
            config.matching.threshold = threshold;
        }
        if let Some(scorer) = self.scorer {
            config.matching.scorer = scorer;
        }
        if self.strict_countries {
            config.country_resolution = CountryResolution::Strict;
        }
        if let Some(max_workers) = self.max_workers {
            config.matching.max_workers = max_workers;
        }
        if let Some(max_pairs) = self.max_pairs {
            config.matching.max_pairs = max_pairs;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Link measurements to coordinates, report and optionally export
    Link {
        #[command(flatten)]
        inputs: LinkArgs,

        #[arg(
            short,
            long,
            help = "Output Parquet file path [default with --export: output/aq-linked-{YYMMDD}.parquet]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Export to the default output file")]
        export: bool,

        #[arg(short, long, default_value = COMPRESSION_SNAPPY)]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        #[arg(short, long, default_value = "5", help = "Joined rows to print")]
        sample: usize,

        #[arg(long, help = "Print the linkage report as JSON")]
        json: bool,
    },

    /// Show the city mapping with scores
    Match {
        #[command(flatten)]
        inputs: LinkArgs,

        #[arg(long, help = "Also list cities that found no acceptable match")]
        rejected: bool,
    },

    /// Dashboard drill-down: countries, a country overview, or a city
    Overview {
        #[command(flatten)]
        inputs: LinkArgs,

        #[arg(long, help = "Country name or code")]
        country: Option<String>,

        #[arg(long, help = "City name")]
        city: Option<String>,
    },

    /// Display information about an exported Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,

        #[arg(
            long,
            default_value = "0",
            help = "Maximum records to analyze (0 = all records)"
        )]
        analysis_limit: usize,
    },
}
