use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

pub const DEFAULT_RELEVANT_CATEGORIES: [&str; 5] = [
    "ANNOUNCE_MEAL",
    "MEAL_END",
    "DOSE_INSULIN",
    "DOSE_BASAL_INSULIN",
    "ANNOUNCE_EXERCISE",
];

/// Clean patient event logs and label meal segments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing patient CSV files, or a single CSV file
    #[arg(help = "Directory containing patient CSV files, or a single CSV file")]
    pub input_path: PathBuf,

    /// Directory the labelled CSV files are written to
    #[arg(long, env = "MEAL_OUTPUT_DIR", default_value = "labeled")]
    pub output_dir: PathBuf,

    /// Optional path for a JSON run report
    #[arg(long, env = "MEAL_REPORT")]
    pub report: Option<PathBuf>,

    /// chrono format used to parse timestamps; must include an offset
    #[arg(long, env = "MEAL_TIMESTAMP_FORMAT", default_value = DEFAULT_TIMESTAMP_FORMAT)]
    pub timestamp_format: String,

    /// Categories kept as indicator columns (comma separated)
    #[arg(
        long,
        env = "MEAL_CATEGORIES",
        value_delimiter = ',',
        default_values_t = DEFAULT_RELEVANT_CATEGORIES.map(String::from)
    )]
    pub categories: Vec<String>,

    /// Value columns removed from the output (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    #[arg(long, default_value = "time")]
    pub timestamp_column: String,

    #[arg(long, default_value = "msg_type")]
    pub category_column: String,

    #[arg(long, default_value = "affects_fob")]
    pub fob_column: String,

    #[arg(long, default_value = "affects_iob")]
    pub iob_column: String,

    /// File extension of patient files
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// How deep to descend into the input directory (unlimited if unset)
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Header names of the columns the loader treats specially.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNames {
    pub timestamp: String,
    pub category: String,
    pub affects_fob: String,
    pub affects_iob: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            timestamp: "time".to_string(),
            category: "msg_type".to_string(),
            affects_fob: "affects_fob".to_string(),
            affects_iob: "affects_iob".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    pub timestamp_format: String,
    pub relevant_categories: Vec<String>,
    pub drop_columns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            relevant_categories: DEFAULT_RELEVANT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            drop_columns: Vec::new(),
        }
    }
}

fn trimmed(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Everything a run needs, detached from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub report: Option<PathBuf>,
    pub extension: String,
    pub max_depth: Option<usize>,
    pub columns: ColumnNames,
    pub normalizer: NormalizerConfig,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            input_path: args.input_path,
            output_dir: args.output_dir,
            report: args.report,
            extension: args.extension,
            max_depth: args.max_depth,
            columns: ColumnNames {
                timestamp: args.timestamp_column,
                category: args.category_column,
                affects_fob: args.fob_column,
                affects_iob: args.iob_column,
            },
            normalizer: NormalizerConfig {
                timestamp_format: args.timestamp_format,
                relevant_categories: trimmed(args.categories),
                drop_columns: trimmed(args.drop_columns),
            },
        }
    }
}
