/*!
The `charseek` crate provides a fast streaming tokenizer for delimited text,
built for bulk import of very large CSV-like files.

A [`CharSeeker`](struct.CharSeeker.html) reads characters one chunk at a
time and finds the boundaries of one field per call to
[`seek`](struct.CharSeeker.html#method.seek). The field stays in the
seeker's buffer, described by a [`Mark`](struct.Mark.html), until a typed
[`Extractor`](trait.Extractor.html) converts it. The delimiter is chosen per
call, so a single stream can mix differently delimited parts.

# Overview

* [`Config`](struct.Config.html) and
  [`ConfigBuilder`](struct.ConfigBuilder.html) set the dialect: the quote
  character, whether quoted fields may span lines, whether `\"` escapes are
  recognized, trimming and the chunk size. Any type implementing
  [`Configuration`](trait.Configuration.html) can be used instead.
* [`Readable`](trait.Readable.html) supplies decoded characters.
  [`StrReadable`](struct.StrReadable.html),
  [`Utf8Readable`](struct.Utf8Readable.html) and
  [`MultiReadable`](struct.MultiReadable.html) cover strings, byte streams
  and several inputs read back to back.
* [`Source`](trait.Source.html) hands chunks to the seeker.
  [`ReadableSource`](struct.ReadableSource.html) adapts any `Readable`.
* [`Error`](struct.Error.html) reports failures together with the
  [`Location`](struct.Location.html) they were detected at.

# Example

This reads typed columns from a small input, using a tab for the first
column and a comma for the rest.

```
use charseek::{CharSeeker, Config, IntExtractor, Mark, StrReadable,
               StringExtractor};

# fn example() -> charseek::Result<()> {
let data = "\
1\tAlice,\"Paris, France\"
2\tBob,Oslo
";
let config = Config::builder().trim_strings(true).build();
let mut seeker =
    CharSeeker::from_readable(StrReadable::new("cities", data), &config);

let mut mark = Mark::new();
let mut ids = IntExtractor::new();
let mut text = StringExtractor::new();
let mut rows = vec![];
while seeker.seek(&mut mark, '\t')? {
    let id = seeker.extract(&mark, &mut ids)?;
    seeker.seek(&mut mark, ',')?;
    let name = seeker.extract(&mark, &mut text)?;
    seeker.seek(&mut mark, ',')?;
    let city = seeker.extract(&mark, &mut text)?;
    rows.push((id, name, city));
}
assert_eq!(rows, vec![
    (1, "Alice".to_string(), "Paris, France".to_string()),
    (2, "Bob".to_string(), "Oslo".to_string()),
]);
# Ok(())
# }
# example().unwrap();
```
*/

#![deny(missing_docs)]

pub use charseek_core::{
    BooleanExtractor, CharExtractor, DoubleExtractor, ExtractError,
    ExtractErrorKind, Extractor, IntExtractor, LongArrayExtractor,
    LongExtractor, Mark, StringArrayExtractor, StringExtractor, Terminator,
};

pub use crate::config::{Config, ConfigBuilder, Configuration};
pub use crate::error::{Error, ErrorKind, Location, QuoteOverrun, Result};
pub use crate::readable::{
    MultiReadable, Readable, StrReadable, Utf8Readable,
};
pub use crate::seeker::CharSeeker;
pub use crate::source::{Chunk, ReadableSource, Source};

mod config;
mod error;
mod readable;
mod seeker;
mod source;
