//! Revertible cursors over lists, strings and character streams, and pivot iterators that
//! attach a value to each position a cursor visits.
//!
//! A cursor can save its position any number of times, move on, and later revert to the
//! position saved last. A [`PivotIterator`] wraps a cursor and keeps a sorted chain of
//! [`Pivot`]s, one per position it was asked about; looking up the pivot for the current
//! position starts from the pivot used last, so it costs as much as the distance moved
//! since then.

pub use cursor::{CharCursor, RevertibleCursor};
pub use error::{Error, ErrorKind, Result};
pub use list_cursor::ListCursor;
pub use pivot::{Pivot, PivotChain, SharedPivots};
pub use pivot_iterator::{PivotIterator, Pivoting};
pub use source::{ReaderSource, Source};
pub use str_cursor::StrCursor;
pub use stream_cursor::{SourcePosition, StreamConfig, StreamCursor, DEFAULT_SECTION_SIZE};

mod cursor;
mod error;
mod list_cursor;
pub mod node;
mod pivot;
mod pivot_iterator;
mod source;
mod str_cursor;
mod stream_cursor;
