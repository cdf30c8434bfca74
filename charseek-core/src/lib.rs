/*!
`charseek-core` holds the I/O free vocabulary shared by the `charseek`
tokenizer and the code that consumes its output.

A [`Mark`](struct.Mark.html) describes the boundaries of one scanned field
inside a seeker's buffer. An [`Extractor`](trait.Extractor.html) turns the
characters of a field into a value. This crate provides extractors for the
common scalar and array types; anything else can be supported by
implementing the trait.

# Example

```
use charseek_core::{Extractor, LongExtractor};

let field: Vec<char> = "-1234".chars().collect();
let mut ex = LongExtractor::new();
assert!(ex.extract(&field, false).unwrap());
assert_eq!(-1234, ex.value());
```
*/

#![deny(missing_docs)]

pub use crate::extract::{
    BooleanExtractor, CharExtractor, DoubleExtractor, ExtractError,
    ExtractErrorKind, Extractor, IntExtractor, LongArrayExtractor,
    LongExtractor, StringArrayExtractor, StringExtractor,
};
pub use crate::mark::{Mark, Terminator};

mod extract;
mod mark;
