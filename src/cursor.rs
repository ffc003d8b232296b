use std::fmt;

use crate::error::{Error, Result};

/// A sequence of elements whose position can be saved and reverted to later.
///
/// ```
/// use pivoting::{RevertibleCursor, StrCursor};
///
/// let mut chars = StrCursor::new("Hello, world!");
/// chars.save().unwrap();
/// chars.advance(7).unwrap();
/// assert_eq!(chars.by_ref().collect::<String>(), "world!");
/// chars.revert().unwrap();
/// assert_eq!(chars.collect::<String>(), "Hello, world!");
/// ```
pub trait RevertibleCursor {
    type Item;
    type Position: Ord + Clone;

    /// Returns the current element and moves past it.
    ///
    /// Fails with [`Error::Exhausted`] if there are no more elements.
    fn try_next(&mut self) -> Result<Self::Item>;

    /// Returns the current element without moving.
    fn peek(&mut self) -> Result<Self::Item>;

    fn has_next(&mut self) -> Result<bool>;

    /// Returns true if nothing more can be read without reverting to a saved position.
    fn is_exhausted(&mut self) -> Result<bool> {
        Ok(!self.has_next()?)
    }

    /// Moves forward by `places` elements.
    ///
    /// Moving past the end is allowed; only reading from there fails. A negative count is
    /// rejected with [`Error::NegativeAdvance`] and leaves the cursor in place.
    fn advance(&mut self, places: isize) -> Result<()>;

    /// Saves the current position. May be called any number of times, even while exhausted.
    fn save(&mut self) -> Result<()>;

    /// Moves back to the position saved last, and forgets it.
    fn revert(&mut self) -> Result<()>;

    /// Forgets the position saved last without moving.
    fn remove_save(&mut self) -> Result<()>;

    fn position(&self) -> Self::Position;
}

/// A revertible cursor over characters.
pub trait CharCursor: RevertibleCursor<Item = char> {
    fn next_char(&mut self) -> Result<char> {
        self.try_next()
    }

    fn peek_char(&mut self) -> Result<char> {
        self.peek()
    }
}

/// Positions saved by a cursor, most recent last.
#[derive(Debug, Clone, Default)]
pub(crate) struct SaveStack<P> {
    saved: Vec<P>,
}

impl<P> SaveStack<P> {
    pub fn new() -> Self {
        SaveStack { saved: Vec::new() }
    }

    pub fn push(&mut self, position: P) {
        self.saved.push(position);
    }

    pub fn pop(&mut self) -> Result<P> {
        self.saved.pop().ok_or(Error::NoSavedPosition)
    }
}

pub(crate) fn checked_places(places: isize) -> Result<usize> {
    usize::try_from(places).map_err(|_| Error::NegativeAdvance(places))
}

/// Index and saved positions of a cursor over elements held in memory.
///
/// The elements themselves are owned by the cursor using it, and passed in on every read.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexCursor {
    // May exceed the number of elements after an advance, in which case the cursor is
    // exhausted.
    pos: usize,
    saved: SaveStack<usize>,
}

impl IndexCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn peek<T: Clone>(&self, elements: &[T]) -> Result<T> {
        elements.get(self.pos).cloned().ok_or(Error::Exhausted)
    }

    pub fn next<T: Clone>(&mut self, elements: &[T]) -> Result<T> {
        let element = self.peek(elements)?;
        self.pos += 1;
        Ok(element)
    }

    pub fn remaining(&self, len: usize) -> usize {
        len.saturating_sub(self.pos)
    }

    pub fn advance(&mut self, places: isize) -> Result<()> {
        self.pos = self.pos.saturating_add(checked_places(places)?);
        Ok(())
    }

    pub fn save(&mut self) {
        self.saved.push(self.pos);
    }

    pub fn revert(&mut self) -> Result<()> {
        self.pos = self.saved.pop()?;
        Ok(())
    }

    pub fn remove_save(&mut self) -> Result<()> {
        self.saved.pop().map(|_| ())
    }

    pub fn describe<T: fmt::Display>(
        &self,
        elements: &[T],
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match elements.get(self.pos) {
            Some(element) => write!(f, "'{}' (index = {})", element, self.pos),
            None => write!(f, "<iterator exhausted> (index = {})", self.pos),
        }
    }
}
