use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;

const BYTE_BUF_SIZE: usize = 1024 * 64;

/// A reader of already decoded characters.
pub trait Readable {
    /// Read characters into `buf`, returning how many were written. Zero
    /// means the end of the input (unless `buf` is empty).
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize>;

    /// A label for the input, such as a file name. It is reported in
    /// diagnostics and a change of label resets line numbering.
    fn description(&self) -> &str;

    /// Release the underlying input.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Readable + ?Sized> Readable for Box<R> {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Characters from an in-memory string.
#[derive(Clone, Debug)]
pub struct StrReadable {
    description: String,
    text: String,
    pos: usize,
}

impl StrReadable {
    /// Create a readable over `text` labelled `description`.
    pub fn new<D, T>(description: D, text: T) -> StrReadable
    where
        D: Into<String>,
        T: Into<String>,
    {
        StrReadable {
            description: description.into(),
            text: text.into(),
            pos: 0,
        }
    }
}

impl Readable for StrReadable {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        for (i, ch) in self.text[self.pos..].char_indices() {
            if n == buf.len() {
                self.pos += i;
                return Ok(n);
            }
            buf[n] = ch;
            n += 1;
        }
        self.pos = self.text.len();
        Ok(n)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Characters decoded from a UTF-8 byte stream.
///
/// Invalid sequences are replaced with `U+FFFD`. A multi-byte sequence that
/// straddles two reads of the underlying reader is decoded whole.
pub struct Utf8Readable<R> {
    rdr: R,
    description: String,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
}

impl<R: io::Read> Utf8Readable<R> {
    /// Create a readable decoding the bytes of `rdr`.
    pub fn new<D: Into<String>>(rdr: R, description: D) -> Utf8Readable<R> {
        Utf8Readable {
            rdr,
            description: description.into(),
            buf: vec![0; BYTE_BUF_SIZE],
            start: 0,
            end: 0,
            eof: false,
        }
    }

    /// Move unread bytes to the front and read more after them.
    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        loop {
            match self.rdr.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(());
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl Utf8Readable<File> {
    /// Open the file at `path`, labelled by its path.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Utf8Readable<File>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Utf8Readable::new(file, path.display().to_string()))
    }
}

impl<R: io::Read> Readable for Utf8Readable<R> {
    fn read(&mut self, out: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        while n < out.len() {
            let avail = &self.buf[self.start..self.end];
            // A UTF-8 sequence is at most 4 bytes, so with fewer than that
            // buffered the next sequence may be incomplete.
            if avail.len() < 4 && !self.eof {
                if n == 0 {
                    self.fill()?;
                    continue;
                }
                // Hand out what we have rather than block for more input.
                match bstr::decode_utf8(avail) {
                    (Some(ch), size) => {
                        out[n] = ch;
                        self.start += size;
                        n += 1;
                        continue;
                    }
                    (None, _) => break,
                }
            }
            if avail.is_empty() {
                break;
            }
            let (ch, size) = bstr::decode_utf8(avail);
            out[n] = ch.unwrap_or('\u{FFFD}');
            self.start += size;
            n += 1;
        }
        Ok(n)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<R> fmt::Debug for Utf8Readable<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Utf8Readable {{ description: {:?}, buffered: {} }}",
            self.description,
            self.end - self.start
        )
    }
}

/// Several readables read back to back.
///
/// If a readable's data does not end with a line break, one `\n` is
/// inserted before the next readable so that records never span inputs.
/// The description is that of the readable the last characters came from.
pub struct MultiReadable {
    current: Option<Box<dyn Readable>>,
    rest: VecDeque<Box<dyn Readable>>,
    description: String,
    last: Option<char>,
}

impl MultiReadable {
    /// Create a readable over `readables`, in order.
    pub fn new<I>(readables: I) -> MultiReadable
    where
        I: IntoIterator<Item = Box<dyn Readable>>,
    {
        let mut rest: VecDeque<_> = readables.into_iter().collect();
        let current = rest.pop_front();
        let description = current
            .as_ref()
            .map(|r| r.description().to_string())
            .unwrap_or_default();
        MultiReadable { current, rest, description, last: None }
    }
}

impl Readable for MultiReadable {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let cur = match self.current {
                None => return Ok(0),
                Some(ref mut cur) => cur,
            };
            let n = cur.read(buf)?;
            if n > 0 {
                if self.description != cur.description() {
                    self.description.clear();
                    self.description.push_str(cur.description());
                }
                self.last = Some(buf[n - 1]);
                return Ok(n);
            }
            match self.last {
                Some(c) if c != '\n' && c != '\r' => {
                    buf[0] = '\n';
                    self.last = Some('\n');
                    return Ok(1);
                }
                _ => {}
            }
            cur.close()?;
            self.current = self.rest.pop_front();
            self.last = None;
            if let Some(ref next) = self.current {
                debug!(next = next.description(), "moving to next readable");
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut cur) = self.current.take() {
            cur.close()?;
        }
        while let Some(mut r) = self.rest.pop_front() {
            r.close()?;
        }
        Ok(())
    }
}

impl fmt::Debug for MultiReadable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MultiReadable {{ description: {:?}, remaining: {} }}",
            self.description,
            self.rest.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{MultiReadable, Readable, StrReadable, Utf8Readable};

    fn read_all<R: Readable>(r: &mut R, chunk: usize) -> String {
        let mut buf = vec!['\0'; chunk];
        let mut out = String::new();
        loop {
            let n = r.read(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend(&buf[..n]);
        }
    }

    /// Hands out bytes a few at a time.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl<'a> io::Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn str_readable_in_pieces() {
        let mut r = StrReadable::new("s", "héllo wörld");
        assert_eq!("héllo wörld", read_all(&mut r, 3));
        assert_eq!("s", r.description());
    }

    #[test]
    fn utf8_split_sequences() {
        let text = "añb€c𝄞d";
        for step in 1..6 {
            let rdr = Trickle { data: text.as_bytes(), step };
            let mut r = Utf8Readable::new(rdr, "bytes");
            assert_eq!(text, read_all(&mut r, 2), "step {}", step);
        }
    }

    #[test]
    fn utf8_invalid_replaced() {
        let data: &[u8] = b"a\xFFb";
        let mut r = Utf8Readable::new(data, "bad");
        assert_eq!("a\u{FFFD}b", read_all(&mut r, 8));
    }

    #[test]
    fn utf8_truncated_at_end() {
        let data: &[u8] = b"a\xE2\x82";
        let mut r = Utf8Readable::new(data, "cut");
        let got = read_all(&mut r, 8);
        assert!(got.starts_with('a'));
        assert!(got[1..].chars().all(|c| c == '\u{FFFD}'));
    }

    #[test]
    fn multi_inserts_newlines() {
        let mut r = MultiReadable::new(vec![
            Box::new(StrReadable::new("one", "a,b")) as Box<dyn Readable>,
            Box::new(StrReadable::new("empty", "")),
            Box::new(StrReadable::new("two", "c\n")),
            Box::new(StrReadable::new("three", "d")),
        ]);
        assert_eq!("a,b\nc\nd\n", read_all(&mut r, 16));
    }

    #[test]
    fn multi_tracks_description() {
        let mut r = MultiReadable::new(vec![
            Box::new(StrReadable::new("one", "a\n")) as Box<dyn Readable>,
            Box::new(StrReadable::new("two", "b\n")),
        ]);
        let mut buf = ['\0'; 16];
        assert_eq!("one", r.description());
        assert_eq!(2, r.read(&mut buf).unwrap());
        assert_eq!("one", r.description());
        assert_eq!(2, r.read(&mut buf).unwrap());
        assert_eq!("two", r.description());
        assert_eq!(0, r.read(&mut buf).unwrap());
        r.close().unwrap();
    }
}
