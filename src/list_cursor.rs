use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::cursor::{IndexCursor, RevertibleCursor};
use crate::error::Result;

/// A revertible cursor over a shared list of elements.
///
/// Elements are handed out by value, so `T` is usually cheap to clone or itself shared.
#[derive(Debug)]
pub struct ListCursor<T> {
    vec: Arc<Vec<T>>,
    index: IndexCursor,
}

impl<T> Clone for ListCursor<T> {
    fn clone(&self) -> Self {
        ListCursor {
            vec: self.vec.clone(),
            index: self.index.clone(),
        }
    }
}

/// Two cursors are equal when they walk the same list instance and sit at the same index.
/// Lists with equal contents but different allocations never compare equal.
impl<T> PartialEq for ListCursor<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.vec, &other.vec) && self.index.position() == other.index.position()
    }
}

impl<T> Eq for ListCursor<T> {}

impl<T> Hash for ListCursor<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.vec).hash(state);
        self.index.position().hash(state);
    }
}

impl<T> ListCursor<T> {
    pub fn new(vec: Arc<Vec<T>>) -> Self {
        ListCursor {
            vec,
            index: IndexCursor::new(),
        }
    }

    pub fn get_shared_vec(&self) -> Arc<Vec<T>> {
        self.vec.clone()
    }

    /// Number of elements left before the cursor is exhausted.
    pub fn remaining(&self) -> usize {
        self.index.remaining(self.vec.len())
    }
}

impl<T> From<Vec<T>> for ListCursor<T> {
    fn from(vec: Vec<T>) -> Self {
        ListCursor::new(Arc::new(vec))
    }
}

impl<T> From<Arc<Vec<T>>> for ListCursor<T> {
    fn from(vec: Arc<Vec<T>>) -> Self {
        ListCursor::new(vec)
    }
}

impl<T: Clone> RevertibleCursor for ListCursor<T> {
    type Item = T;
    type Position = usize;

    fn try_next(&mut self) -> Result<T> {
        self.index.next(self.vec.as_slice())
    }

    fn peek(&mut self) -> Result<T> {
        self.index.peek(self.vec.as_slice())
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

impl<T: Clone> Iterator for ListCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<T: Display> Display for ListCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.index.describe(self.vec.as_slice(), f)
    }
}
