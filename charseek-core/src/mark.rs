use core::fmt;
use core::ops::Range;

/// What ended a scanned field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// The field was ended by the delimiter given to `seek`.
    Delimiter(char),
    /// The field was the last one of its record, ended by `\r`, `\n` or the
    /// end of the stream.
    EndOfLine,
}

impl Terminator {
    /// Returns true if and only if this terminator ends a record.
    pub fn is_end_of_line(&self) -> bool {
        match *self {
            Terminator::EndOfLine => true,
            Terminator::Delimiter(_) => false,
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::EndOfLine
    }
}

impl PartialEq<char> for Terminator {
    #[inline]
    fn eq(&self, &other: &char) -> bool {
        match *self {
            Terminator::Delimiter(c) => other == c,
            Terminator::EndOfLine => other == '\r' || other == '\n',
        }
    }
}

/// The boundaries of one scanned field.
///
/// A `Mark` is filled in by a seeker and then handed back to it to extract
/// a value. The positions index into the seeker's internal buffer, so they
/// are only valid until the next call to `seek`, which may refill and
/// relocate that buffer. A single `Mark` is meant to be reused for every
/// field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mark {
    start: usize,
    end: usize,
    terminator: Terminator,
    quoted: bool,
    exhausted: bool,
}

impl Mark {
    /// Create a new mark that describes no field.
    pub fn new() -> Mark {
        Mark::default()
    }

    /// Set the boundaries of the field `[start, end)`.
    ///
    /// This is called by the seeker that owns the buffer the positions
    /// refer to.
    #[doc(hidden)]
    pub fn set(
        &mut self,
        start: usize,
        end: usize,
        terminator: Terminator,
        quoted: bool,
    ) {
        debug_assert!(start <= end);
        self.start = start;
        self.end = end;
        self.terminator = terminator;
        self.quoted = quoted;
        self.exhausted = false;
    }

    /// Turn this mark into the sentinel returned once no fields remain.
    #[doc(hidden)]
    pub fn set_exhausted(&mut self) {
        self.start = 0;
        self.end = 0;
        self.terminator = Terminator::EndOfLine;
        self.quoted = false;
        self.exhausted = true;
    }

    /// The buffer position of the first character of the field.
    pub fn start_position(&self) -> usize {
        self.start
    }

    /// The buffer position just past the last character of the field.
    pub fn position(&self) -> usize {
        self.end
    }

    /// The buffer range spanned by the field.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The number of characters in the field, after unescaping.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the field has no characters.
    ///
    /// Note that an empty field may still be quoted (`""`).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// What ended the field.
    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// Returns true if this field was the last one in its record.
    pub fn is_end_of_line(&self) -> bool {
        self.terminator.is_end_of_line()
    }

    /// Returns true if the field was enclosed in quotes.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Returns true if this is the sentinel mark produced when the stream
    /// has no more fields.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.exhausted {
            return write!(f, "Mark[exhausted]");
        }
        write!(
            f,
            "Mark[from:{}, to:{}, quoted:{}, eol:{}]",
            self.start,
            self.end,
            self.quoted,
            self.is_end_of_line()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Mark, Terminator};

    #[test]
    fn new_mark_is_empty() {
        let mark = Mark::new();
        assert!(mark.is_empty());
        assert!(mark.is_end_of_line());
        assert!(!mark.is_quoted());
        assert!(!mark.is_exhausted());
    }

    #[test]
    fn set_replaces_everything() {
        let mut mark = Mark::new();
        mark.set(3, 7, Terminator::Delimiter(','), true);
        assert_eq!(3, mark.start_position());
        assert_eq!(7, mark.position());
        assert_eq!(4, mark.len());
        assert_eq!(3..7, mark.range());
        assert_eq!(Terminator::Delimiter(','), mark.terminator());
        assert!(!mark.is_end_of_line());
        assert!(mark.is_quoted());

        mark.set(10, 10, Terminator::EndOfLine, false);
        assert!(mark.is_empty());
        assert!(mark.is_end_of_line());
        assert!(!mark.is_quoted());
    }

    #[test]
    fn exhausted_is_cleared_by_set() {
        let mut mark = Mark::new();
        mark.set(1, 2, Terminator::Delimiter('\t'), true);
        mark.set_exhausted();
        assert!(mark.is_exhausted());
        assert!(mark.is_empty());
        assert!(!mark.is_quoted());
        assert_eq!("Mark[exhausted]", mark.to_string());

        mark.set(0, 1, Terminator::EndOfLine, false);
        assert!(!mark.is_exhausted());
    }

    #[test]
    fn terminator_matches_chars() {
        assert!(Terminator::Delimiter(';') == ';');
        assert!(Terminator::Delimiter(';') != ',');
        assert!(Terminator::EndOfLine == '\n');
        assert!(Terminator::EndOfLine == '\r');
        assert!(Terminator::EndOfLine != ',');
    }

    #[test]
    fn display() {
        let mut mark = Mark::new();
        mark.set(2, 5, Terminator::Delimiter(','), false);
        assert_eq!("Mark[from:2, to:5, quoted:false, eol:false]", mark.to_string());
    }
}
