use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::cursor::{CharCursor, IndexCursor, RevertibleCursor};
use crate::error::Result;

lazy_static! {
    // Shared by every cursor over an empty string, so they all compare equal.
    static ref EMPTY: Arc<[char]> = Arc::from(Vec::<char>::new());
}

/// A revertible cursor over the characters of a string.
///
/// Positions count `char`s, not bytes, so any position is a valid place to stop.
#[derive(Debug, Clone)]
pub struct StrCursor {
    chars: Arc<[char]>,
    index: IndexCursor,
}

impl PartialEq for StrCursor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chars, &other.chars) && self.index.position() == other.index.position()
    }
}

impl Eq for StrCursor {}

impl Hash for StrCursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.chars) as *const char).hash(state);
        self.index.position().hash(state);
    }
}

impl Default for StrCursor {
    fn default() -> Self {
        StrCursor::from_chars(EMPTY.clone())
    }
}

impl StrCursor {
    pub fn new(text: &str) -> Self {
        if text.is_empty() {
            return StrCursor::default();
        }
        StrCursor::from_chars(text.chars().collect())
    }

    /// Creates a cursor sharing an already decoded string with other cursors.
    pub fn from_chars(chars: Arc<[char]>) -> Self {
        StrCursor {
            chars,
            index: IndexCursor::new(),
        }
    }

    pub fn get_shared_chars(&self) -> Arc<[char]> {
        self.chars.clone()
    }

    pub fn remaining(&self) -> usize {
        self.index.remaining(self.chars.len())
    }
}

impl From<&str> for StrCursor {
    fn from(text: &str) -> Self {
        StrCursor::new(text)
    }
}

impl RevertibleCursor for StrCursor {
    type Item = char;
    type Position = usize;

    fn try_next(&mut self) -> Result<char> {
        self.index.next(&self.chars[..])
    }

    fn peek(&mut self) -> Result<char> {
        self.index.peek(&self.chars[..])
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(self.remaining() > 0)
    }

    fn advance(&mut self, places: isize) -> Result<()> {
        self.index.advance(places)
    }

    fn save(&mut self) -> Result<()> {
        self.index.save();
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        self.index.revert()
    }

    fn remove_save(&mut self) -> Result<()> {
        self.index.remove_save()
    }

    fn position(&self) -> usize {
        self.index.position()
    }
}

impl CharCursor for StrCursor {}

impl Iterator for StrCursor {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl Display for StrCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.index.describe(&self.chars[..], f)
    }
}
