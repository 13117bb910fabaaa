use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset '{path}': {source}")]
    Dataset {
        path: PathBuf,
        #[source]
        source: ntlm_verifier::Error,
    },

    #[error("Line {line_number}: malformed candidate line ({reason})")]
    MalformedCandidateLine { line_number: usize, reason: String },

    #[error("Worker thread panicked")]
    WorkerPanicked,
}
