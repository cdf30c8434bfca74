use std::cmp;
use std::io;

use tracing::trace;

use crate::readable::Readable;

/// A fixed capacity window of characters read from a source.
///
/// A chunk is owned by a seeker and refilled in place by its `Source`. The
/// layout after each refill is:
///
/// ```text
/// [back_position, start_position)                carried over field
/// [start_position, start_position + length)      newly read characters
/// ```
///
/// The carried region lets a field that was cut off at the end of the
/// previous chunk continue without being copied anywhere else.
#[derive(Clone, Debug)]
pub struct Chunk {
    data: Vec<char>,
    length: usize,
    start_position: usize,
    back_position: usize,
    max_field_size: usize,
    source_description: String,
}

impl Chunk {
    /// Create an empty chunk that holds at most `capacity` characters.
    ///
    /// `capacity` is also the largest field the chunk can carry over.
    pub fn new(capacity: usize) -> Chunk {
        Chunk {
            data: vec!['\0'; capacity],
            length: 0,
            start_position: 0,
            back_position: 0,
            max_field_size: capacity,
            source_description: String::new(),
        }
    }

    /// The whole backing buffer.
    pub fn data(&self) -> &[char] {
        &self.data
    }

    /// The number of newly read characters.
    pub fn length(&self) -> usize {
        self.length
    }

    /// The index of the first newly read character.
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// The index at which the carried over field begins.
    pub fn back_position(&self) -> usize {
        self.back_position
    }

    /// The largest field this chunk can hold.
    pub fn max_field_size(&self) -> usize {
        self.max_field_size
    }

    /// The label of the source the newly read characters came from.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Refill this chunk.
    ///
    /// If `carry_from` is given, the characters from that index to the end
    /// of the current data are moved to the front of the buffer first. Then
    /// `read` is called with the free space after them and must return how
    /// many characters it wrote. Returns that count.
    pub fn fill_with<F>(
        &mut self,
        carry_from: Option<usize>,
        read: F,
    ) -> io::Result<usize>
    where
        F: FnOnce(&mut [char]) -> io::Result<usize>,
    {
        let carried = match carry_from {
            None => 0,
            Some(from) => {
                let end = self.start_position + self.length;
                assert!(from <= end, "carry over starts past end of data");
                self.data.copy_within(from..end, 0);
                end - from
            }
        };
        self.back_position = 0;
        self.start_position = carried;
        self.length = 0;
        let n = read(&mut self.data[carried..])?;
        self.length = cmp::min(n, self.data.len() - carried);
        Ok(self.length)
    }

    /// Set the label of the source the data came from.
    pub fn set_source_description(&mut self, description: &str) {
        if self.source_description != description {
            self.source_description.clear();
            self.source_description.push_str(description);
        }
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> char {
        self.data[i]
    }

    /// Copy the character at `from` to `from - back`, dropping whatever
    /// was there.
    #[inline]
    pub(crate) fn relocate(&mut self, from: usize, back: usize) {
        self.data[from - back] = self.data[from];
    }
}

/// A supplier of chunks.
///
/// A source hands out the input as a sequence of chunks and is responsible
/// for carrying the tail of an unfinished field over into the next one.
pub trait Source {
    /// Create a chunk suitable for passing to `next_chunk`.
    fn new_chunk(&self) -> Chunk;

    /// Refill `chunk` with the next characters.
    ///
    /// `carry_from` is `None` on the first request. Otherwise it is the
    /// index in `chunk` of the field still being scanned, whose characters
    /// up to the end of the current data must survive the refill, beginning
    /// at the new chunk's back position.
    ///
    /// Returns `false`, leaving `chunk` untouched, once there is nothing
    /// more to read. A refilled chunk with a length of zero also means the
    /// input ended.
    fn next_chunk(
        &mut self,
        chunk: &mut Chunk,
        carry_from: Option<usize>,
    ) -> io::Result<bool>;

    /// Release the underlying input.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn new_chunk(&self) -> Chunk {
        (**self).new_chunk()
    }

    fn next_chunk(
        &mut self,
        chunk: &mut Chunk,
        carry_from: Option<usize>,
    ) -> io::Result<bool> {
        (**self).next_chunk(chunk, carry_from)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A source that fills each chunk with one read from a `Readable`.
#[derive(Debug)]
pub struct ReadableSource<R> {
    readable: R,
    buffer_size: usize,
    done: bool,
}

impl<R: Readable> ReadableSource<R> {
    /// Create a source whose chunks hold `buffer_size` characters.
    pub fn new(readable: R, buffer_size: usize) -> ReadableSource<R> {
        ReadableSource {
            readable,
            buffer_size: cmp::max(1, buffer_size),
            done: false,
        }
    }

    /// Gets a reference to the underlying readable.
    pub fn get_ref(&self) -> &R {
        &self.readable
    }

    /// Unwraps this source, returning the underlying readable.
    pub fn into_inner(self) -> R {
        self.readable
    }
}

impl<R: Readable> Source for ReadableSource<R> {
    fn new_chunk(&self) -> Chunk {
        Chunk::new(self.buffer_size)
    }

    fn next_chunk(
        &mut self,
        chunk: &mut Chunk,
        carry_from: Option<usize>,
    ) -> io::Result<bool> {
        if self.done {
            return Ok(false);
        }
        let readable = &mut self.readable;
        let n = chunk.fill_with(carry_from, |buf| readable.read(buf))?;
        chunk.set_source_description(self.readable.description());
        trace!(
            source = self.readable.description(),
            read = n,
            carried = chunk.start_position(),
            "filled chunk"
        );
        if n == 0 {
            self.done = true;
        }
        Ok(true)
    }

    fn close(&mut self) -> io::Result<()> {
        self.readable.close()
    }
}

#[cfg(test)]
mod tests {
    use super::{Chunk, ReadableSource, Source};
    use crate::readable::StrReadable;

    fn text(chunk: &Chunk, from: usize, to: usize) -> String {
        chunk.data()[from..to].iter().collect()
    }

    #[test]
    fn fill_without_carry() {
        let mut chunk = Chunk::new(4);
        let n = chunk
            .fill_with(None, |buf| {
                buf[0] = 'a';
                buf[1] = 'b';
                Ok(2)
            })
            .unwrap();
        assert_eq!(2, n);
        assert_eq!(0, chunk.start_position());
        assert_eq!(0, chunk.back_position());
        assert_eq!("ab", text(&chunk, 0, 2));
    }

    #[test]
    fn fill_carries_tail() {
        let mut src = ReadableSource::new(StrReadable::new("t", "abcdefg"), 4);
        let mut chunk = src.new_chunk();
        assert!(src.next_chunk(&mut chunk, None).unwrap());
        assert_eq!("abcd", text(&chunk, 0, 4));

        assert!(src.next_chunk(&mut chunk, Some(2)).unwrap());
        assert_eq!(0, chunk.back_position());
        assert_eq!(2, chunk.start_position());
        assert_eq!(2, chunk.length());
        assert_eq!("cdef", text(&chunk, 0, 4));
        assert_eq!("t", chunk.source_description());
        assert_eq!(4, chunk.max_field_size());
    }

    #[test]
    fn exhausted_source_leaves_chunk_alone() {
        let mut src = ReadableSource::new(StrReadable::new("t", "ab"), 4);
        let mut chunk = src.new_chunk();
        assert!(src.next_chunk(&mut chunk, None).unwrap());
        assert!(src.next_chunk(&mut chunk, Some(2)).unwrap());
        assert_eq!(0, chunk.length());
        assert!(!src.next_chunk(&mut chunk, Some(0)).unwrap());
        assert_eq!(0, chunk.length());
    }

    #[test]
    fn relocate_drops_one() {
        let mut chunk = Chunk::new(4);
        chunk
            .fill_with(None, |buf| {
                buf.copy_from_slice(&['a', '"', '"', 'b']);
                Ok(4)
            })
            .unwrap();
        chunk.relocate(2, 1);
        chunk.relocate(3, 1);
        assert_eq!("a\"b", text(&chunk, 0, 3));
    }
}
