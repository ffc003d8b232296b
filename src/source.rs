use std::cell::RefCell;
use std::io::{self, BufRead};
use std::rc::Rc;

use crate::error::{Error, Result};

/// A supplier of characters for a [`StreamCursor`](crate::StreamCursor).
pub trait Source {
    /// Appends up to `max` characters to `buf` and returns how many were appended.
    ///
    /// Returns zero only when the source has no characters left. Reading from a closed
    /// source fails with [`Error::SourceClosed`].
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize>;

    fn is_closed(&self) -> bool;
}

/// Lets the caller keep a handle to a source while a cursor reads from it, for instance to
/// close it.
impl<S: Source + ?Sized> Source for Rc<RefCell<S>> {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        self.borrow_mut().read_chars(buf, max)
    }

    fn is_closed(&self) -> bool {
        self.borrow().is_closed()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        (**self).read_chars(buf, max)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Decodes UTF-8 text from a buffered reader.
///
/// Wrapping the reader in a larger buffer does not change how many characters are read at
/// once; the cursor decides that.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader: Some(reader),
        }
    }

    /// Releases the reader. Every later read fails.
    pub fn close(&mut self) {
        self.reader = None;
    }

    pub fn into_inner(self) -> Option<R> {
        self.reader
    }
}

impl<R: BufRead> Source for ReaderSource<R> {
    fn read_chars(&mut self, buf: &mut Vec<char>, max: usize) -> Result<usize> {
        let reader = self.reader.as_mut().ok_or(Error::SourceClosed)?;
        let mut count = 0;
        while count < max {
            match decode_char(reader)? {
                Some(c) => {
                    buf.push(c);
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

fn decode_char<R: BufRead>(reader: &mut R) -> Result<Option<char>> {
    let first = match read_byte(reader)? {
        Some(byte) => byte,
        None => return Ok(None),
    };
    let width = utf8_width(first).ok_or(Error::MalformedUtf8)?;
    let mut bytes = [first, 0, 0, 0];
    for byte in bytes.iter_mut().take(width).skip(1) {
        *byte = read_byte(reader)?.ok_or(Error::MalformedUtf8)?;
    }
    let decoded = std::str::from_utf8(&bytes[..width]).map_err(|_| Error::MalformedUtf8)?;
    Ok(decoded.chars().next())
}

fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let byte = loop {
        match reader.fill_buf() {
            Ok(available) => break available.first().copied(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    if byte.is_some() {
        reader.consume(1);
    }
    Ok(byte)
}

// Length of the sequence introduced by `first`. Overlong and surrogate encodings that pass
// this check are rejected when the whole sequence is validated.
fn utf8_width(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use super::*;

    fn read_all<S: Source>(source: &mut S, chunk: usize) -> Result<String> {
        let mut buf = Vec::new();
        while source.read_chars(&mut buf, chunk)? > 0 {}
        Ok(buf.into_iter().collect())
    }

    #[test]
    fn decodes_multibyte_characters() {
        let text = "aé€😀z";
        let mut source = ReaderSource::new(text.as_bytes());
        assert_eq!(read_all(&mut source, 2).unwrap(), text);
    }

    #[test]
    fn decodes_across_reader_buffers() {
        let text = "ünïcödé 😀 text";
        let reader = BufReader::with_capacity(1, text.as_bytes());
        let mut source = ReaderSource::new(reader);
        assert_eq!(read_all(&mut source, 3).unwrap(), text);
    }

    #[test]
    fn reads_at_most_max() {
        let mut source = ReaderSource::new("abcdef".as_bytes());
        let mut buf = Vec::new();
        assert_eq!(source.read_chars(&mut buf, 4).unwrap(), 4);
        assert_eq!(source.read_chars(&mut buf, 4).unwrap(), 2);
        assert_eq!(source.read_chars(&mut buf, 4).unwrap(), 0);
        assert_eq!(buf, ['a', 'b', 'c', 'd', 'e', 'f']);
    }

    #[test]
    fn malformed_input() {
        let mut source = ReaderSource::new(&[b'a', 0xFF][..]);
        let mut buf = Vec::new();
        assert!(matches!(source.read_chars(&mut buf, 8), Err(Error::MalformedUtf8)));

        // Truncated sequence at the end of input.
        let mut source = ReaderSource::new(&[0xE2u8, 0x82][..]);
        assert!(matches!(source.read_chars(&mut buf, 8), Err(Error::MalformedUtf8)));

        // Surrogate half.
        let mut source = ReaderSource::new(&[0xEDu8, 0xA0, 0x80][..]);
        assert!(matches!(source.read_chars(&mut buf, 8), Err(Error::MalformedUtf8)));
    }

    #[test]
    fn closed_source() {
        let mut source = ReaderSource::new("abc".as_bytes());
        source.close();
        assert!(source.is_closed());
        let mut buf = Vec::new();
        assert!(matches!(source.read_chars(&mut buf, 1), Err(Error::SourceClosed)));
    }

    #[test]
    fn shared_handle_sees_close() {
        let shared = Rc::new(RefCell::new(ReaderSource::new("abc".as_bytes())));
        let mut handle = Rc::clone(&shared);
        let mut buf = Vec::new();
        assert_eq!(handle.read_chars(&mut buf, 1).unwrap(), 1);
        shared.borrow_mut().close();
        assert!(handle.is_closed());
        assert!(matches!(handle.read_chars(&mut buf, 1), Err(Error::SourceClosed)));
    }
}
