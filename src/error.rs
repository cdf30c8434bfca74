use std::fmt;
use std::io;
use std::result;

use charseek_core::{ExtractError, Mark};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A type alias for `Result<T, charseek::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// Where in the input something happened.
///
/// `offset` counts characters from the start of the whole stream, across
/// every source. `line` counts completed records (plus line feeds embedded
/// in quoted fields) within the current source only.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    source: Option<String>,
    offset: u64,
    line: u64,
}

impl Location {
    pub(crate) fn new(
        source: Option<String>,
        offset: u64,
        line: u64,
    ) -> Location {
        Location { source, offset, line }
    }

    /// The label of the source being read, if any chunk has been read yet.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The absolute character offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The logical line number within the source.
    pub fn line(&self) -> u64 {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{} (offset {})",
            self.source().unwrap_or("<none>"),
            self.line,
            self.offset
        )
    }
}

/// An error that can occur while seeking or extracting fields.
///
/// Every error is fatal to the field being scanned. The seeker does not try
/// to resynchronize, so after an error the caller should either stop or
/// discard the seeker.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error from the underlying source.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// The location at which the error was detected, if known.
    pub fn location(&self) -> Option<&Location> {
        match *self.0 {
            ErrorKind::Io(_) => None,
            ErrorKind::MalformedField { ref loc, .. }
            | ErrorKind::UnterminatedQuote { ref loc, .. }
            | ErrorKind::IllegalMultilineField { ref loc }
            | ErrorKind::FieldTooLarge { ref loc, .. }
            | ErrorKind::MissingMandatoryValue { ref loc, .. }
            | ErrorKind::Extract { ref loc, .. } => Some(loc),
        }
    }
}

/// The specific type of an error.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading from a source.
    #[error("{0}")]
    Io(#[source] io::Error),
    /// Characters other than spaces followed the closing quote of a field
    /// before its delimiter.
    #[error(
        "field error at {loc}: characters after closing quote in {field:?}"
    )]
    MalformedField {
        /// Where the offending character was read.
        loc: Location,
        /// The field's raw text read so far.
        field: String,
    },
    /// A quoted field never closed: either the stream ended, or the field
    /// outgrew the chunk capacity of the source.
    #[error(
        "field error at {loc}: missing closing quote for field started on \
         line {start_line} ({cause})"
    )]
    UnterminatedQuote {
        /// Where the condition was detected.
        loc: Location,
        /// The line on which the field started.
        start_line: u64,
        /// Why the field could not be completed.
        cause: QuoteOverrun,
    },
    /// A line break was found inside a quoted field, but multi-line fields
    /// are disabled.
    #[error(
        "field error at {loc}: line break inside quotes while multi-line \
         fields are disabled"
    )]
    IllegalMultilineField {
        /// Where the line break was read.
        loc: Location,
    },
    /// An unquoted field grew past the maximum the source can buffer.
    #[error(
        "field error at {loc}: field larger than buffer size {max_field_size}"
    )]
    FieldTooLarge {
        /// Where the condition was detected.
        loc: Location,
        /// The chunk capacity that was exceeded.
        max_field_size: usize,
    },
    /// `extract` was called for a field whose extractor found no value.
    #[error(
        "field error at {loc}: {extractor} extractor found no value for \
         {mark}; use try_extract for optional values"
    )]
    MissingMandatoryValue {
        /// The location of the seeker.
        loc: Location,
        /// The name of the extractor.
        extractor: &'static str,
        /// The mark that was extracted.
        mark: Mark,
    },
    /// An extractor rejected the text of a field.
    #[error("field error at {loc}: {err}")]
    Extract {
        /// The location of the seeker.
        loc: Location,
        /// The underlying extractor error.
        #[source]
        err: ExtractError,
    },
}

/// Why a quoted field could not be completed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteOverrun {
    /// The input ended inside the quotes.
    EndOfStream,
    /// The field grew past the maximum the source can buffer. This is
    /// usually an unterminated quote running on through later lines.
    BufferFull {
        /// The chunk capacity that was exceeded.
        max_field_size: usize,
    },
}

impl fmt::Display for QuoteOverrun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QuoteOverrun::EndOfStream => write!(f, "end of stream"),
            QuoteOverrun::BufferFull { max_field_size } => write!(
                f,
                "field larger than buffer size {}",
                max_field_size
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.0)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, Location, QuoteOverrun};

    fn loc() -> Location {
        Location::new(Some("nodes.csv".to_string()), 42, 3)
    }

    #[test]
    fn location_display() {
        assert_eq!("nodes.csv:3 (offset 42)", loc().to_string());
        assert_eq!("<none>:0 (offset 0)", Location::default().to_string());
    }

    #[test]
    fn unterminated_display() {
        let err = Error::new(ErrorKind::UnterminatedQuote {
            loc: loc(),
            start_line: 1,
            cause: QuoteOverrun::BufferFull { max_field_size: 16 },
        });
        assert_eq!(
            "field error at nodes.csv:3 (offset 42): missing closing quote \
             for field started on line 1 (field larger than buffer size 16)",
            err.to_string()
        );
        assert_eq!(Some(&loc()), err.location());
        assert!(!err.is_io_error());
    }

    #[test]
    fn too_large_display() {
        let err = Error::new(ErrorKind::FieldTooLarge {
            loc: loc(),
            max_field_size: 4,
        });
        assert_eq!(
            "field error at nodes.csv:3 (offset 42): field larger than \
             buffer size 4",
            err.to_string()
        );
        assert_eq!(Some(&loc()), err.location());
    }

    #[test]
    fn io_has_no_location() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        assert!(err.is_io_error());
        assert!(err.location().is_none());
        assert_eq!("disk on fire", err.to_string());
    }
}
