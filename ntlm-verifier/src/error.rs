use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset could not be opened, sized, seeked or read. A search that hits
    /// this cannot tell "absent" from "unreadable", so it aborts.
    #[error("dataset unreadable: {0}")]
    DatasetUnreadable(#[from] io::Error),

    #[error("invalid NTLM hash {input:?}: {reason}")]
    InvalidHash { input: String, reason: &'static str },

    /// A probe landed inside a hash that would have to start before the beginning
    /// of the file.
    #[error("malformed record near byte offset {offset}")]
    MalformedRecord { offset: u64 },
}
