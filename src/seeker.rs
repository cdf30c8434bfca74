use std::fmt;

use charseek_core::{Extractor, Mark, StringExtractor, Terminator};
use tracing::{debug, trace};

use crate::config::{Configuration, Dialect};
use crate::error::{Error, ErrorKind, Location, QuoteOverrun, Result};
use crate::readable::Readable;
use crate::source::{Chunk, ReadableSource, Source};

const SPACE: char = ' ';
const BACKSLASH: char = '\\';

#[inline]
fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// A streaming field tokenizer.
///
/// A `CharSeeker` pulls characters from a [`Source`](trait.Source.html)
/// one chunk at a time and finds the boundaries of one field per call to
/// `seek`. The field's characters stay in the seeker's buffer; a typed
/// [`Extractor`](trait.Extractor.html) is then applied to them with
/// `extract` or `try_extract`. Nothing is copied unless an extractor copies
/// it, and memory use is bounded by the chunk capacity of the source.
///
/// Quoted fields may contain the delimiter, doubled quotes (`""`) and, when
/// enabled, line breaks and backslash escapes. Empty lines are skipped.
///
/// # Example
///
/// ```
/// use charseek::{CharSeeker, Config, LongExtractor, Mark, StrReadable,
///                StringExtractor};
///
/// # fn example() -> charseek::Result<()> {
/// let data = "id,name\n1,\"Alice, A.\"\n";
/// let config = Config::new();
/// let mut seeker =
///     CharSeeker::from_readable(StrReadable::new("people", data), &config);
///
/// let mut mark = Mark::new();
/// let mut header = vec![];
/// seeker.read_record(',', &mut header)?;
/// assert_eq!(header, vec!["id", "name"]);
///
/// assert!(seeker.seek(&mut mark, ',')?);
/// assert_eq!(1, seeker.extract(&mark, &mut LongExtractor::new())?);
/// assert!(seeker.seek(&mut mark, ',')?);
/// assert_eq!("Alice, A.", seeker.extract(&mark, &mut StringExtractor::new())?);
/// assert!(mark.is_end_of_line());
///
/// assert!(!seeker.seek(&mut mark, ',')?);
/// assert_eq!(2, seeker.line_number());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct CharSeeker<S> {
    source: S,
    chunk: Chunk,
    dialect: Dialect,
    /// Index of the next character to read.
    pos: usize,
    /// Index of the first character read from the source into this chunk.
    chunk_start: usize,
    /// Index just past the last valid character.
    end: usize,
    /// Index where the current record started, if it is still buffered.
    line_start: Option<usize>,
    /// Index where the field being scanned starts.
    field_start: usize,
    line: u64,
    /// The line on which the quote of the field being scanned opened, while
    /// that quote is still open.
    open_quote_line: Option<u64>,
    eof: bool,
    loaded: bool,
    /// Absolute offset of `chunk_start`.
    absolute_chunk_start: u64,
    source_description: Option<String>,
}

impl<R: Readable> CharSeeker<ReadableSource<R>> {
    /// Create a seeker reading from `readable`, with chunks of
    /// `config.buffer_size()` characters.
    pub fn from_readable<C>(
        readable: R,
        config: &C,
    ) -> CharSeeker<ReadableSource<R>>
    where
        C: Configuration + ?Sized,
    {
        let source = ReadableSource::new(readable, config.buffer_size());
        CharSeeker::new(source, config)
    }
}

impl<S: Source> CharSeeker<S> {
    /// Create a seeker over `source`.
    ///
    /// The dialect options are read from `config` once and never change.
    pub fn new<C>(source: S, config: &C) -> CharSeeker<S>
    where
        C: Configuration + ?Sized,
    {
        let chunk = source.new_chunk();
        CharSeeker {
            source,
            chunk,
            dialect: Dialect::from_config(config),
            pos: 0,
            chunk_start: 0,
            end: 0,
            line_start: Some(0),
            field_start: 0,
            line: 0,
            open_quote_line: None,
            eof: false,
            loaded: false,
            absolute_chunk_start: 0,
            source_description: None,
        }
    }

    /// Find the next field, ended by `delimiter`, a line break or the end
    /// of input, and describe it in `mark`.
    ///
    /// Returns `false`, with `mark` set to the exhausted sentinel, when
    /// there are no more fields. The positions in `mark` are only valid
    /// until the next call to `seek`.
    ///
    /// # Errors
    ///
    /// Any error leaves the seeker in an unspecified state. It should not
    /// be used for further seeking.
    pub fn seek(&mut self, mark: &mut Mark, delimiter: char) -> Result<bool> {
        if self.eof {
            mark.set_exhausted();
            return Ok(false);
        }

        // Kept as a member since a refill in `next_char` rebases it.
        self.field_start = self.pos;
        self.open_quote_line = None;
        let quote = self.dialect.quote;
        let mut skipped = 0;
        let mut quote_depth = 0u32;
        let mut quoted = false;
        // The unescaped length of a quoted field, once its quote closes.
        let mut quoted_len = None;
        let mut at_line_break = false;

        while let Some(ch) = self.next_char(skipped)? {
            if quote_depth == 0 {
                if self.dialect.trim && ch == SPACE && ch != delimiter {
                    if self.field_start == self.pos - 1 {
                        self.field_start += 1;
                    }
                } else if ch == quote
                    && !quoted
                    && self.field_start == self.pos - 1
                {
                    quote_depth += 1;
                    quoted = true;
                    self.field_start += 1;
                    self.open_quote_line = Some(self.line);
                } else if is_line_break(ch) {
                    if self.line_start == Some(self.pos - 1) {
                        // Nothing read on this line yet, so it's empty.
                        self.field_start = self.pos;
                        self.line_start = Some(self.pos);
                        continue;
                    }
                    at_line_break = true;
                    break;
                } else if ch == delimiter {
                    let end = self.field_end(self.pos - 1, quoted_len);
                    mark.set(
                        self.field_start,
                        end,
                        Terminator::Delimiter(ch),
                        quoted,
                    );
                    return Ok(true);
                } else if quoted {
                    return Err(self.malformed_field());
                }
            } else if ch == quote {
                match self.peek_char()? {
                    Some(next) if next == quote => {
                        self.drop_escape(&mut skipped);
                    }
                    _ => {
                        quote_depth -= 1;
                        self.open_quote_line = None;
                        quoted_len =
                            Some(self.pos - 1 - skipped - self.field_start);
                    }
                }
            } else if is_line_break(ch) {
                if !self.dialect.multiline {
                    return Err(Error::new(ErrorKind::IllegalMultilineField {
                        loc: self.location(),
                    }));
                }
                if ch == '\n' {
                    self.line += 1;
                }
            } else if ch == BACKSLASH && self.dialect.legacy_escapes {
                match self.peek_char()? {
                    Some(next) if next == quote || next == BACKSLASH => {
                        self.drop_escape(&mut skipped);
                    }
                    _ => {}
                }
            }
        }

        if let Some(start_line) = self.open_quote_line {
            return Err(Error::new(ErrorKind::UnterminatedQuote {
                loc: self.location(),
                start_line,
                cause: QuoteOverrun::EndOfStream,
            }));
        }
        if !at_line_break
            && self.pos == self.field_start
            && self.line_start == Some(self.field_start)
        {
            mark.set_exhausted();
            return Ok(false);
        }

        let term = if at_line_break { self.pos - 1 } else { self.pos };
        let end = self.field_end(term, quoted_len);
        self.line += 1;
        self.line_start = Some(self.pos);
        mark.set(self.field_start, end, Terminator::EndOfLine, quoted);
        Ok(true)
    }

    /// Apply `extractor` to the field described by `mark`.
    ///
    /// Returns whatever the extractor decides: `false` means the field has
    /// no value, which is not an error.
    pub fn try_extract<E>(&self, mark: &Mark, extractor: &mut E) -> Result<bool>
    where
        E: Extractor + ?Sized,
    {
        let field = self.chunk.data().get(mark.range()).unwrap_or(&[]);
        extractor.extract(field, mark.is_quoted()).map_err(|err| {
            Error::new(ErrorKind::Extract { loc: self.location(), err })
        })
    }

    /// Apply `extractor` to the field described by `mark` and return the
    /// value.
    ///
    /// # Errors
    ///
    /// If the extractor finds no value, a `MissingMandatoryValue` error is
    /// returned. Use `try_extract` for optional values.
    pub fn extract<E: Extractor>(
        &self,
        mark: &Mark,
        extractor: &mut E,
    ) -> Result<E::Value> {
        if !self.try_extract(mark, extractor)? {
            return Err(Error::new(ErrorKind::MissingMandatoryValue {
                loc: self.location(),
                extractor: extractor.name(),
                mark: mark.clone(),
            }));
        }
        Ok(extractor.value())
    }

    /// Read every field of the next record as a string into `record`.
    ///
    /// Fields without a value become empty strings. Returns `false` when no
    /// records remain.
    pub fn read_record(
        &mut self,
        delimiter: char,
        record: &mut Vec<String>,
    ) -> Result<bool> {
        record.clear();
        let mut mark = Mark::new();
        let mut ex = StringExtractor::new();
        loop {
            if !self.seek(&mut mark, delimiter)? {
                return Ok(!record.is_empty());
            }
            if self.try_extract(&mark, &mut ex)? {
                record.push(ex.value());
            } else {
                record.push(String::new());
            }
            if mark.is_end_of_line() {
                return Ok(true);
            }
        }
    }

    /// The absolute number of characters read so far.
    pub fn position(&self) -> u64 {
        self.absolute_chunk_start + (self.pos - self.chunk_start) as u64
    }

    /// The label of the source currently being read.
    ///
    /// This is `None` until the first chunk has been read.
    pub fn source_description(&self) -> Option<&str> {
        self.source_description.as_deref()
    }

    /// The number of lines completed in the current source.
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// A snapshot of the source, position and line number.
    pub fn location(&self) -> Location {
        Location::new(
            self.source_description.clone(),
            self.position(),
            self.line,
        )
    }

    /// Close the underlying source.
    pub fn close(mut self) -> Result<()> {
        debug!(
            source = self.source_description(),
            position = self.position(),
            line = self.line,
            "closing seeker"
        );
        self.source.close()?;
        Ok(())
    }

    /// The end of a field ending just before `term`, trimming trailing
    /// spaces from unquoted fields when asked to.
    fn field_end(&self, term: usize, quoted_len: Option<usize>) -> usize {
        if let Some(len) = quoted_len {
            return self.field_start + len;
        }
        let mut end = term;
        if self.dialect.trim {
            while end > self.field_start && self.chunk.get(end - 1) == SPACE {
                end -= 1;
            }
        }
        end
    }

    fn malformed_field(&self) -> Error {
        let field = self.chunk.data()[self.field_start..self.pos]
            .iter()
            .collect();
        Error::new(ErrorKind::MalformedField { loc: self.location(), field })
    }

    /// Read the next character, moving it back by `skipped` places to close
    /// the gap left by dropped escape characters.
    #[inline]
    fn next_char(&mut self, skipped: usize) -> Result<Option<char>> {
        if self.pos >= self.end && !self.fill()? {
            return Ok(None);
        }
        let ch = self.chunk.get(self.pos);
        if skipped > 0 {
            self.chunk.relocate(self.pos, skipped);
        }
        self.pos += 1;
        Ok(Some(ch))
    }

    /// Look at the next character without consuming it. This refills at
    /// most once.
    #[inline]
    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.pos >= self.end && !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.chunk.get(self.pos)))
    }

    /// Drop the escape character just read, keeping the peeked character
    /// that follows it as a literal.
    #[inline]
    fn drop_escape(&mut self, skipped: &mut usize) {
        *skipped += 1;
        self.chunk.relocate(self.pos, *skipped);
        self.pos += 1;
    }

    /// Read the next chunk, carrying over the field being scanned.
    ///
    /// Returns `false` once the input is exhausted.
    fn fill(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        let carried = self.pos - self.field_start;
        let carry_from = if self.loaded {
            let max_field_size = self.chunk.max_field_size();
            if carried >= max_field_size {
                let loc = self.location();
                let kind = match self.open_quote_line {
                    Some(start_line) => ErrorKind::UnterminatedQuote {
                        loc,
                        start_line,
                        cause: QuoteOverrun::BufferFull { max_field_size },
                    },
                    None => ErrorKind::FieldTooLarge { loc, max_field_size },
                };
                return Err(Error::new(kind));
            }
            Some(self.field_start)
        } else {
            None
        };
        if !self.source.next_chunk(&mut self.chunk, carry_from)? {
            self.eof = true;
            return Ok(false);
        }

        if self.loaded {
            self.absolute_chunk_start += (self.end - self.chunk_start) as u64;
        }
        let back = self.chunk.back_position();
        self.line_start = if self.loaded {
            let field_start = self.field_start;
            self.line_start
                .and_then(|start| (start + back).checked_sub(field_start))
        } else {
            Some(back)
        };
        self.field_start = back;
        self.pos = self.chunk.start_position();
        self.chunk_start = self.pos;
        self.end = self.pos + self.chunk.length();
        debug_assert_eq!(carried, self.pos - self.field_start);

        if self.source_description() != Some(self.chunk.source_description())
        {
            debug!(
                from = self.source_description(),
                to = self.chunk.source_description(),
                "source changed, resetting line number"
            );
            self.line = 0;
            self.source_description =
                Some(self.chunk.source_description().to_string());
        }
        self.loaded = true;
        trace!(
            position = self.position(),
            carried,
            length = self.chunk.length(),
            "read chunk"
        );
        if self.chunk.length() == 0 {
            self.eof = true;
            return Ok(false);
        }
        Ok(true)
    }
}

impl<S> fmt::Display for CharSeeker<S>
where
    S: Source,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CharSeeker[source:{}, position:{}, line:{}]",
            self.source_description().unwrap_or("<none>"),
            self.position(),
            self.line_number()
        )
    }
}

impl<S> fmt::Debug for CharSeeker<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CharSeeker")
            .field("dialect", &self.dialect)
            .field("pos", &self.pos)
            .field("end", &self.end)
            .field("field_start", &self.field_start)
            .field("line_start", &self.line_start)
            .field("line", &self.line)
            .field("eof", &self.eof)
            .field("source_description", &self.source_description)
            .finish()
    }
}
