use std::fmt::{self, Display};

use num_integer::Integer;
use tracing::{debug, instrument, trace};

use crate::cursor::{checked_places, CharCursor, RevertibleCursor, SaveStack};
use crate::error::{Error, Result};
use crate::source::Source;

pub const DEFAULT_SECTION_SIZE: usize = 8192;

/// Position of a [`StreamCursor`]: a section of the buffered stream, and an offset in it.
///
/// Ordered by section, then by offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    pub section: usize,
    pub offset: usize,
}

impl Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.offset)
    }
}

/// Settings for a [`StreamCursor`].
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    section_size: Option<usize>,
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of characters buffered per section. Defaults to [`DEFAULT_SECTION_SIZE`].
    pub fn section_size(&mut self, section_size: usize) -> &mut Self {
        self.section_size = Some(section_size);
        self
    }

    /// #   Panics
    ///
    /// If the configuration is invalid; see [`checked_build`](Self::checked_build).
    pub fn build<S: Source>(&self, source: S) -> StreamCursor<S> {
        match self.checked_build(source) {
            Ok(cursor) => cursor,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn checked_build<S: Source>(&self, source: S) -> Result<StreamCursor<S>> {
        let section_size = self.section_size.unwrap_or(DEFAULT_SECTION_SIZE);
        if section_size == 0 {
            return Err(Error::ZeroSectionSize);
        }
        Ok(StreamCursor {
            source,
            section_size,
            sections: Vec::new(),
            pending: Vec::new(),
            ended: false,
            section: 0,
            offset: 0,
            saved: SaveStack::new(),
        })
    }
}

/// A revertible cursor over the characters of a source of unknown length.
///
/// Characters are read from the source one section at a time, on demand, and every section
/// is kept for the lifetime of the cursor. Reverting therefore never reads the source again,
/// at the price of memory growing with the amount of input read.
///
/// Once the source reports itself closed, every operation fails with
/// [`Error::SourceClosed`].
#[derive(Debug)]
pub struct StreamCursor<S> {
    source: S,
    section_size: usize,
    // All full except the last one.
    sections: Vec<Vec<char>>,
    // Characters of a section whose loading was interrupted by a failed read.
    pending: Vec<char>,
    ended: bool,
    section: usize,
    // May run past the end of `section` after an advance; reads move it forward.
    offset: usize,
    saved: SaveStack<SourcePosition>,
}

impl<S: Source> StreamCursor<S> {
    pub fn new(source: S) -> Self {
        StreamConfig::new().build(source)
    }

    pub fn section_size(&self) -> usize {
        self.section_size
    }

    /// Number of sections read from the source so far.
    pub fn sections_loaded(&self) -> usize {
        self.sections.len()
    }

    /// Number of characters between the start of the stream and the cursor.
    ///
    /// Saturates at `usize::MAX` for a cursor advanced that far past the end.
    pub fn absolute_position(&self) -> usize {
        let position = RevertibleCursor::position(self);
        position
            .section
            .saturating_mul(self.section_size)
            .saturating_add(position.offset)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn check_open(&self) -> Result<()> {
        if self.source.is_closed() {
            return Err(Error::SourceClosed);
        }
        Ok(())
    }

    /// Moves the cursor to the section holding its offset, loading sections as needed.
    ///
    /// Returns false if the source ends before that.
    fn settle(&mut self) -> Result<bool> {
        self.check_open()?;
        loop {
            let len = match self.sections.get(self.section) {
                Some(chars) => chars.len(),
                None => {
                    if !self.load_section()? {
                        return Ok(false);
                    }
                    continue;
                }
            };
            if self.offset < len {
                return Ok(true);
            }
            if self.section + 1 == self.sections.len() && !self.load_section()? {
                return Ok(false);
            }
            self.offset -= len;
            self.section += 1;
        }
    }

    #[instrument(level = "trace", skip(self))]
    fn load_section(&mut self) -> Result<bool> {
        if self.ended {
            return Ok(false);
        }
        if self.pending.is_empty() {
            self.pending.reserve(self.section_size.min(DEFAULT_SECTION_SIZE));
        }
        // A failed read leaves what was already read in `pending`, for the next attempt.
        while self.pending.len() < self.section_size {
            let wanted = self.section_size - self.pending.len();
            if self.source.read_chars(&mut self.pending, wanted)? == 0 {
                self.ended = true;
                break;
            }
        }
        let chars = std::mem::take(&mut self.pending);
        if chars.is_empty() {
            debug!(sections = self.sections.len(), "source exhausted");
            return Ok(false);
        }
        trace!(len = chars.len(), "section loaded");
        self.sections.push(chars);
        Ok(true)
    }
}

impl<S: Source> RevertibleCursor for StreamCursor<S> {
    type Item = char;
    type Position = SourcePosition;

    fn try_next(&mut self) -> Result<char> {
        let c = self.peek()?;
        self.offset += 1;
        Ok(c)
    }

    fn peek(&mut self) -> Result<char> {
        if !self.settle()? {
            return Err(Error::Exhausted);
        }
        self.sections
            .get(self.section)
            .and_then(|chars| chars.get(self.offset))
            .copied()
            .ok_or(Error::Exhausted)
    }

    fn has_next(&mut self) -> Result<bool> {
        self.settle()
    }

    fn advance(&mut self, places: isize) -> Result<()> {
        self.check_open()?;
        self.offset = self.offset.saturating_add(checked_places(places)?);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.check_open()?;
        self.saved.push(RevertibleCursor::position(self));
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        self.check_open()?;
        let SourcePosition { section, offset } = self.saved.pop()?;
        self.section = section;
        self.offset = offset;
        Ok(())
    }

    fn remove_save(&mut self) -> Result<()> {
        self.check_open()?;
        self.saved.pop().map(|_| ())
    }

    /// Returns the position of the cursor, in canonical form.
    ///
    /// Every section but the last is full, so an offset past the current section is
    /// carried into the section number. The same character always has the same position,
    /// whether or not the cursor has caught up with it yet.
    fn position(&self) -> SourcePosition {
        let (carry, offset) = self.offset.div_rem(&self.section_size);
        SourcePosition {
            section: self.section.saturating_add(carry),
            offset,
        }
    }
}

impl<S: Source> CharCursor for StreamCursor<S> {}

/// Shows the current character if it has been read already.
impl<S: Source> Display for StreamCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = RevertibleCursor::position(self);
        let absolute = self.absolute_position();
        let current = self
            .sections
            .get(position.section)
            .and_then(|chars| chars.get(position.offset));
        match current {
            Some(c) => write!(f, "'{}' (position = {})", c, absolute),
            None if self.ended => write!(f, "<iterator exhausted> (position = {})", absolute),
            None => write!(f, "<not read yet> (position = {})", absolute),
        }
    }
}

impl<S: Source> Iterator for StreamCursor<S> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.try_next().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::source::ReaderSource;

    fn cursor(text: &str, section_size: usize) -> StreamCursor<ReaderSource<&[u8]>> {
        StreamConfig::new()
            .section_size(section_size)
            .build(ReaderSource::new(text.as_bytes()))
    }

    /// Counts how many times the cursor reads from the underlying source.
    struct CountingSource<S> {
        inner: S,
        reads: Rc<RefCell<usize>>,
    }

    impl<S: Source> Source for CountingSource<S> {
        fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
            *self.reads.borrow_mut() += 1;
            self.inner.read_chars(buf, max)
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    #[test]
    fn reads_across_sections() {
        let mut chars = cursor("Hello, world!", 4);
        assert_eq!(chars.by_ref().collect::<String>(), "Hello, world!");
        assert_eq!(chars.sections_loaded(), 4);
        assert!(matches!(chars.try_next(), Err(Error::Exhausted)));
    }

    #[test]
    fn hello_world() {
        let mut chars = StreamCursor::new(ReaderSource::new("Hello, world!".as_bytes()));
        chars.save().unwrap();
        chars.advance(7).unwrap();
        assert_eq!(chars.by_ref().collect::<String>(), "world!");
        chars.revert().unwrap();
        assert_eq!(chars.collect::<String>(), "Hello, world!");
    }

    #[test]
    fn advance_through_whole_sections() {
        let mut chars = cursor("abcdefghijklmnop", 3);
        chars.advance(10).unwrap();
        assert_eq!(chars.sections_loaded(), 0);
        assert_eq!(chars.peek().unwrap(), 'k');
        assert_eq!(chars.sections_loaded(), 4);
        assert_eq!(chars.position(), SourcePosition { section: 3, offset: 1 });
        assert_eq!(chars.absolute_position(), 10);
    }

    #[test]
    fn position_is_canonical_before_reading() {
        let mut chars = cursor("abcdefgh", 3);
        chars.advance(4).unwrap();
        let before = chars.position();
        assert_eq!(before, SourcePosition { section: 1, offset: 1 });
        chars.peek().unwrap();
        assert_eq!(chars.position(), before);
    }

    #[test]
    fn revert_does_not_read_again() {
        let reads = Rc::new(RefCell::new(0));
        let source = CountingSource {
            inner: ReaderSource::new("0123456789".as_bytes()),
            reads: Rc::clone(&reads),
        };
        let mut chars = StreamConfig::new().section_size(2).build(source);
        chars.save().unwrap();
        assert_eq!(chars.by_ref().count(), 10);
        let total = *reads.borrow();

        chars.revert().unwrap();
        assert_eq!(chars.collect::<String>(), "0123456789");
        assert_eq!(*reads.borrow(), total);
    }

    #[test]
    fn advance_past_end() {
        let mut chars = cursor("abc", 2);
        chars.save().unwrap();
        chars.advance(100).unwrap();
        assert!(chars.is_exhausted().unwrap());
        assert!(matches!(chars.peek(), Err(Error::Exhausted)));
        chars.revert().unwrap();
        assert_eq!(chars.peek().unwrap(), 'a');
        assert!(matches!(chars.advance(-2), Err(Error::NegativeAdvance(-2))));
        assert_eq!(chars.peek().unwrap(), 'a');
    }

    #[test]
    fn empty_source() {
        let mut chars = cursor("", 4);
        assert!(!chars.has_next().unwrap());
        assert!(matches!(chars.peek(), Err(Error::Exhausted)));
        assert_eq!(chars.position(), SourcePosition { section: 0, offset: 0 });
    }

    #[test]
    fn closed_source_fails_everything() {
        let shared = Rc::new(RefCell::new(ReaderSource::new("abcdef".as_bytes())));
        let mut chars = StreamConfig::new()
            .section_size(2)
            .build(Rc::clone(&shared));
        assert_eq!(chars.try_next().unwrap(), 'a');
        chars.save().unwrap();
        shared.borrow_mut().close();

        assert!(matches!(chars.try_next(), Err(Error::SourceClosed)));
        assert!(matches!(chars.peek(), Err(Error::SourceClosed)));
        assert!(matches!(chars.has_next(), Err(Error::SourceClosed)));
        assert!(matches!(chars.advance(1), Err(Error::SourceClosed)));
        assert!(matches!(chars.save(), Err(Error::SourceClosed)));
        assert!(matches!(chars.revert(), Err(Error::SourceClosed)));
        assert!(matches!(chars.remove_save(), Err(Error::SourceClosed)));
    }

    #[test]
    fn zero_section_size_is_rejected() {
        let result = StreamConfig::new()
            .section_size(0)
            .checked_build(ReaderSource::new("x".as_bytes()));
        assert!(matches!(result, Err(Error::ZeroSectionSize)));
    }

    #[test]
    fn default_section_size() {
        let chars = StreamCursor::new(ReaderSource::new("x".as_bytes()));
        assert_eq!(chars.section_size(), DEFAULT_SECTION_SIZE);
    }

    #[test]
    fn boxed_source() {
        let source: Box<dyn Source> = Box::new(ReaderSource::new("héllo".as_bytes()));
        let mut chars = StreamConfig::new().section_size(2).build(source);
        assert_eq!(chars.next_char().unwrap(), 'h');
        assert_eq!(chars.peek_char().unwrap(), 'é');
        assert_eq!(chars.collect::<String>(), "éllo");
    }

    /// Hands out at most two characters per read, and fails once after `fail_after` reads.
    struct FlakySource {
        inner: ReaderSource<&'static [u8]>,
        reads: usize,
        fail_after: usize,
    }

    impl Source for FlakySource {
        fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
            self.reads += 1;
            if self.reads == self.fail_after + 1 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "again").into());
            }
            self.inner.read_chars(buf, max.min(2))
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    #[test]
    fn failed_read_keeps_partial_section() {
        let source = FlakySource {
            inner: ReaderSource::new("abcdefgh".as_bytes()),
            reads: 0,
            fail_after: 1,
        };
        let mut chars = StreamConfig::new().section_size(4).build(source);
        assert!(matches!(chars.peek(), Err(Error::Io(_))));
        assert_eq!(chars.sections_loaded(), 0);
        assert_eq!(chars.peek().unwrap(), 'a');
        assert_eq!(chars.sections_loaded(), 1);
        assert_eq!(chars.collect::<String>(), "abcdefgh");
    }

    #[test]
    fn advance_far_past_end() {
        for section_size in [1, 2] {
            let mut chars = cursor("abc", section_size);
            assert_eq!(chars.by_ref().take(3).count(), 3);
            assert!(chars.is_exhausted().unwrap());
            chars.save().unwrap();
            chars.advance(isize::MAX).unwrap();
            chars.advance(isize::MAX).unwrap();
            chars.save().unwrap();
            assert_eq!(chars.absolute_position(), usize::MAX);
            assert!(chars.position() > SourcePosition { section: 1, offset: 0 });
            assert!(matches!(chars.peek(), Err(Error::Exhausted)));
            chars.remove_save().unwrap();
            chars.revert().unwrap();
            assert_eq!(chars.absolute_position(), 3);
        }
    }

    #[test]
    fn display() {
        let mut chars = cursor("abc", 2);
        assert_eq!(chars.to_string(), "<not read yet> (position = 0)");
        chars.peek().unwrap();
        assert_eq!(chars.to_string(), "'a' (position = 0)");
        chars.advance(2).unwrap();
        assert_eq!(chars.to_string(), "<not read yet> (position = 2)");
        chars.peek().unwrap();
        assert_eq!(chars.to_string(), "'c' (position = 2)");
        chars.advance(1).unwrap();
        chars.has_next().unwrap();
        assert_eq!(chars.to_string(), "<iterator exhausted> (position = 3)");
    }

    #[test]
    fn position_display() {
        let position = SourcePosition { section: 2, offset: 7 };
        assert_eq!(position.to_string(), "2:7");
    }
}
