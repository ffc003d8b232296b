use std::cell::RefMut;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::cursor::{CharCursor, RevertibleCursor};
use crate::error::Result;
use crate::node::NodeId;
use crate::pivot::{Pivot, PivotChain, SharedPivots};

/// A revertible cursor that assigns a value to every position it is asked about.
///
/// Use when positional metadata has to be recorded while iterating with backtracking, as a
/// memoizing parser does. The value for the current position is created on the first call
/// to [`here`](Self::here) and survives any later save, advance or revert.
///
/// ```
/// use pivoting::{Pivoting, RevertibleCursor, StrCursor};
///
/// let mut chars = StrCursor::new("Hello, world!").pivoting(|_| [0u32]);
/// while chars.has_next().unwrap() {
///     let code = chars.peek().unwrap() as u32;
///     chars.here()[0] = code;
///     chars.try_next().unwrap();
/// }
/// let codes: Vec<_> = chars.pivots().into_iter().map(|p| p.value[0]).collect();
/// assert_eq!(&codes[..3], [72, 101, 108]);
/// assert_eq!(codes.last(), Some(&33));
/// ```
pub struct PivotIterator<C: RevertibleCursor, V, F> {
    cursor: C,
    pivots: SharedPivots<C::Position, V>,
    // Pivot touched last; the next lookup starts from here.
    current: Option<NodeId>,
    init: F,
}

impl<C, V, F> PivotIterator<C, V, F>
where
    C: RevertibleCursor,
    F: FnMut(&C::Position) -> V,
{
    /// Creates an iterator with a chain of its own. `init` produces the value of each new
    /// pivot from its position.
    pub fn new(cursor: C, init: F) -> Self {
        Self::with_pivots(cursor, PivotChain::shared(), init)
    }

    /// Creates an iterator recording into an existing chain, possibly held by other
    /// iterators over the same sequence.
    pub fn with_pivots(cursor: C, pivots: SharedPivots<C::Position, V>, init: F) -> Self {
        PivotIterator {
            cursor,
            pivots,
            current: None,
            init,
        }
    }

    /// Returns the value assigned to the current position, creating it if needed.
    ///
    /// #   Panics
    ///
    /// If the chain is already borrowed, through a previous `here` whose result is still
    /// alive or through another holder of the shared chain.
    pub fn here(&mut self) -> RefMut<'_, V> {
        let position = self.cursor.position();
        let mut chain = self.pivots.borrow_mut();
        let init = &mut self.init;
        let node = chain.locate(self.current, position.clone(), || init(&position));
        self.current = Some(node);
        RefMut::map(chain, |chain| &mut chain.get_mut(node).value)
    }
}

impl<C: RevertibleCursor, V, F> PivotIterator<C, V, F> {
    /// Returns every pivot created so far, in ascending position.
    ///
    /// This walks and copies the whole chain; it is meant for inspection, not for use
    /// inside an iteration loop.
    pub fn pivots(&self) -> Vec<Pivot<C::Position, V>>
    where
        V: Clone,
    {
        self.pivots.borrow().iter().cloned().collect()
    }

    pub fn shared_pivots(&self) -> SharedPivots<C::Position, V> {
        Rc::clone(&self.pivots)
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn into_cursor(self) -> C {
        self.cursor
    }
}

impl<C: RevertibleCursor, V, F> RevertibleCursor for PivotIterator<C, V, F> {
    type Item = C::Item;
    type Position = C::Position;

    fn try_next(&mut self) -> Result<C::Item> {
        self.cursor.try_next()
    }

    fn peek(&mut self) -> Result<C::Item> {
        self.cursor.peek()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.cursor.has_next()
    }

    fn is_exhausted(&mut self) -> Result<bool> {
        self.cursor.is_exhausted()
    }

    fn advance(&mut self, places: isize) -> Result<()> {
        self.cursor.advance(places)
    }

    fn save(&mut self) -> Result<()> {
        self.cursor.save()
    }

    fn revert(&mut self) -> Result<()> {
        self.cursor.revert()
    }

    fn remove_save(&mut self) -> Result<()> {
        self.cursor.remove_save()
    }

    fn position(&self) -> C::Position {
        self.cursor.position()
    }
}

impl<C: CharCursor, V, F> CharCursor for PivotIterator<C, V, F> {
    fn next_char(&mut self) -> Result<char> {
        self.cursor.next_char()
    }

    fn peek_char(&mut self) -> Result<char> {
        self.cursor.peek_char()
    }
}

impl<C: RevertibleCursor, V, F> Iterator for PivotIterator<C, V, F> {
    type Item = C::Item;

    fn next(&mut self) -> Option<C::Item> {
        self.cursor.try_next().ok()
    }
}

impl<C: RevertibleCursor + Display, V, F> Display for PivotIterator<C, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.cursor, f)
    }
}

impl<C, V, F> Debug for PivotIterator<C, V, F>
where
    C: RevertibleCursor + Debug,
    C::Position: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PivotIterator")
            .field("cursor", &self.cursor)
            .field("pivots", &self.pivots)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Turns any revertible cursor into a [`PivotIterator`].
pub trait Pivoting: RevertibleCursor + Sized {
    fn pivoting<V, F>(self, init: F) -> PivotIterator<Self, V, F>
    where
        F: FnMut(&Self::Position) -> V,
    {
        PivotIterator::new(self, init)
    }
}

impl<C: RevertibleCursor> Pivoting for C {}
