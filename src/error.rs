use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("iterator is exhausted")]
    Exhausted,

    #[error("no positions saved")]
    NoSavedPosition,

    #[error("source is closed")]
    SourceClosed,

    #[error("cannot advance by a negative number of places ({0})")]
    NegativeAdvance(isize),

    #[error("section size must be at least one character")]
    ZeroSectionSize,

    #[error("cannot insert a node next to itself")]
    SelfInsertion,

    #[error("node is tail")]
    NoNextNode,

    #[error("node is head")]
    NoPreviousNode,

    #[error("source contains malformed UTF-8")]
    MalformedUtf8,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`].
///
/// `Exhausted` is recoverable by reverting. The remaining kinds signal misuse and are not
/// meant to be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Exhausted,
    InvalidState,
    InvalidArgument,
    InvalidOperation,
    EndOfSequence,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Exhausted => ErrorKind::Exhausted,
            Error::NoSavedPosition | Error::SourceClosed => ErrorKind::InvalidState,
            Error::NegativeAdvance(_) | Error::ZeroSectionSize => ErrorKind::InvalidArgument,
            Error::SelfInsertion => ErrorKind::InvalidOperation,
            Error::NoNextNode | Error::NoPreviousNode => ErrorKind::EndOfSequence,
            Error::MalformedUtf8 | Error::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::Exhausted.kind(), ErrorKind::Exhausted);
        assert_eq!(Error::NoSavedPosition.kind(), ErrorKind::InvalidState);
        assert_eq!(Error::SourceClosed.kind(), ErrorKind::InvalidState);
        assert_eq!(Error::NegativeAdvance(-1).kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::ZeroSectionSize.kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::SelfInsertion.kind(), ErrorKind::InvalidOperation);
        assert_eq!(Error::NoNextNode.kind(), ErrorKind::EndOfSequence);
        let failure = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(Error::from(failure).kind(), ErrorKind::Io);
    }

    #[test]
    fn messages() {
        assert_eq!(Error::NoSavedPosition.to_string(), "no positions saved");
        assert_eq!(
            Error::NegativeAdvance(-3).to_string(),
            "cannot advance by a negative number of places (-3)"
        );
    }
}
