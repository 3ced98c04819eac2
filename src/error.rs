use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read source partition {partition}: {source}")]
    SourceRead {
        partition: String,
        #[source]
        source: csv::Error,
    },

    #[error("source partition {partition} is missing required column {column:?}")]
    MissingColumn {
        partition: String,
        column: String,
    },

    #[error("none of the {attempted} source partitions could be read")]
    NoPartitions { attempted: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
