use snafu::Snafu;
use wit_reader_core::ReadError;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to open WIT file {path}: {source}"))]
    OpenInput {
        path: String,
        #[snafu(source(from(ReadError, Box::new)))]
        source: Box<ReadError>,
    },

    #[snafu(display(
        "Failed to read records from {path} after {produced} record(s): {source}"
    ))]
    ReadRecords {
        path: String,
        produced: usize,
        #[snafu(source(from(ReadError, Box::new)))]
        source: Box<ReadError>,
    },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: std::io::Error },

    #[snafu(display("Failed to serialize record as JSON: {source}"))]
    SerializeRecord { source: serde_json::Error },
}
