use crate::transducer::TransducerError;

/// Failure to open a speller archive.
#[derive(Debug, thiserror::Error)]
pub enum SpellerArchiveError {
    /// The archive file could not be opened.
    #[error("File error")]
    File(#[source] std::io::Error),

    /// An archive entry could not be read.
    #[error("IO error reading {0}")]
    Io(String, #[source] std::io::Error),

    /// The archive is not a readable ZIP file.
    #[error("Error reading zip archive")]
    Zip(#[source] zip::result::ZipError),

    /// An automaton in the archive could not be parsed.
    #[error("Transducer error in {0}")]
    Transducer(String, #[source] TransducerError),

    /// The archive contains no acceptor automaton.
    #[error("No automata found in archive")]
    NoAutomata,
}
