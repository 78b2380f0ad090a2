use clap::Parser;
use docdiff_config::shared::{DiffConfig, OutputFormat};

/// Compares the records of a source and a destination sorted by id.
///
/// A URL is either an Elasticsearch index (`http://host:9200/index[/type]`) or an NDJSON file
/// (`file:///path/records.ndjson` or a plain path). Diffs are written to stdout, logs to stderr.
#[derive(Debug, Parser)]
#[command(name = "docdiff", version)]
pub struct Args {
    /// Output format, `text` or `json`
    #[arg(short = 'o', long = "output")]
    pub output: Option<OutputFormat>,

    /// Number of records fetched per round trip
    #[arg(long = "size")]
    pub size: Option<usize>,

    /// Raw query for filtering the source, e.g. {"term":{"user":"olivere"}}
    #[arg(long = "sf")]
    pub source_query: Option<String>,

    /// Raw query for filtering the destination, e.g. {"term":{"name.keyword":"Oliver"}}
    #[arg(long = "df")]
    pub destination_query: Option<String>,

    /// Field to sort the source by, e.g. "id" or "-id" (prepend with - for descending)
    #[arg(long = "ssort", default_value = "")]
    pub source_sort: String,

    /// Field to sort the destination by, e.g. "id" or "-id" (prepend with - for descending)
    #[arg(long = "dsort", default_value = "")]
    pub destination_sort: String,

    /// Fields to include from both sides, e.g. "obj.*"
    #[arg(long = "include", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Fields to exclude from both sides, e.g. "hash_value,sub.*"
    #[arg(long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Print unchanged records [default: false]
    #[arg(short = 'u', num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub unchanged: Option<bool>,

    /// Print updated records [default: true]
    #[arg(short = 'c', num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub updated: Option<bool>,

    /// Print created records [default: true]
    #[arg(short = 'a', num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub created: Option<bool>,

    /// Print deleted records [default: true]
    #[arg(short = 'd', num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub deleted: Option<bool>,

    /// Source URL
    pub source: String,

    /// Destination URL
    pub destination: String,
}

impl Args {
    /// Overrides `config` with the flags given on the command line.
    pub fn apply(&self, config: &mut DiffConfig) {
        if let Some(format) = self.output {
            config.output.format = format;
        }

        if let Some(size) = self.size {
            config.producer.batch_size = size;
        }

        let modes = &mut config.output.modes;
        for (flag, mode) in [
            (self.unchanged, &mut modes.unchanged),
            (self.updated, &mut modes.updated),
            (self.created, &mut modes.created),
            (self.deleted, &mut modes.deleted),
        ] {
            if let Some(enabled) = flag {
                *mode = enabled;
            }
        }
    }
}
