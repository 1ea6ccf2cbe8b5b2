use std::path::PathBuf;

/// Fatal conditions raised while splitting a stream. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("failed to open input file '{}'", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read error after line {line_number}")]
    Read {
        line_number: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "malformed header at line {line_number}: expected at least {required} fields \
         separated by '{delimiter}', found {found}: {line}"
    )]
    MalformedHeader {
        line_number: usize,
        line: String,
        delimiter: String,
        required: usize,
        found: usize,
    },

    #[error("line {line_number} appears before any header line: {line}")]
    RoutingBeforeHeader { line_number: usize, line: String },

    #[error("failed to create output file '{}'", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input reader thread panicked")]
    ReaderPanicked,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one header field index is required")]
    NoFieldIndices,

    #[error("header delimiter must not be empty")]
    EmptyDelimiter,

    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("buffer size must be at least 1 byte")]
    ZeroBufferSize,
}
