use std::error;
use std::fmt;

/// Converts the characters of one field into a value.
///
/// A seeker calls `extract` with the unescaped characters of a field and
/// whether that field was quoted. The extractor decides whether a value is
/// present: returning `Ok(false)` means the field is legitimately absent
/// (for example, an unquoted empty field), while an `Err` means the text is
/// present but cannot be converted.
///
/// After a successful extraction, `value` returns the converted value.
pub trait Extractor {
    /// The type of value produced.
    type Value;

    /// A short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Convert `field` and remember the result.
    fn extract(
        &mut self,
        field: &[char],
        quoted: bool,
    ) -> Result<bool, ExtractError>;

    /// The value produced by the last successful call to `extract`.
    fn value(&self) -> Self::Value;
}

/// An error that occurs when a field's text cannot be converted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtractError {
    extractor: &'static str,
    kind: ExtractErrorKind,
    text: String,
}

/// The specific kind of an `ExtractError`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExtractErrorKind {
    /// The text is not a number.
    InvalidNumber,
    /// The text is a number that does not fit the target type.
    OutOfRange,
    /// A character was requested but the text has more than one.
    NotSingleCharacter,
}

impl ExtractError {
    /// Create a new error for `text` rejected by the named extractor.
    pub fn new(
        extractor: &'static str,
        kind: ExtractErrorKind,
        text: &[char],
    ) -> ExtractError {
        ExtractError { extractor, kind, text: text.iter().collect() }
    }

    /// The name of the extractor that rejected the text.
    pub fn extractor(&self) -> &'static str {
        self.extractor
    }

    /// The kind of failure.
    pub fn kind(&self) -> ExtractErrorKind {
        self.kind
    }

    /// The rejected text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.kind {
            ExtractErrorKind::InvalidNumber => "not a valid number",
            ExtractErrorKind::OutOfRange => "number out of range",
            ExtractErrorKind::NotSingleCharacter => {
                "expected a single character"
            }
        };
        write!(f, "{} extractor: {}: {:?}", self.extractor, what, self.text)
    }
}

impl error::Error for ExtractError {}

/// Extracts fields as `String`s.
///
/// An unquoted empty field is absent. A quoted empty field (`""`) is the
/// empty string, unless `empty_quoted_as_absent` is set.
#[derive(Clone, Debug, Default)]
pub struct StringExtractor {
    value: String,
    empty_quoted_as_absent: bool,
}

impl StringExtractor {
    /// Create a new string extractor.
    pub fn new() -> StringExtractor {
        StringExtractor::default()
    }

    /// Treat quoted empty fields as absent, like unquoted ones.
    pub fn empty_quoted_as_absent(mut self, yes: bool) -> StringExtractor {
        self.empty_quoted_as_absent = yes;
        self
    }

    /// Borrow the last extracted string without cloning it.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Extractor for StringExtractor {
    type Value = String;

    fn name(&self) -> &'static str {
        "String"
    }

    fn extract(
        &mut self,
        field: &[char],
        quoted: bool,
    ) -> Result<bool, ExtractError> {
        if field.is_empty() && (!quoted || self.empty_quoted_as_absent) {
            return Ok(false);
        }
        self.value.clear();
        self.value.extend(field.iter());
        Ok(true)
    }

    fn value(&self) -> String {
        self.value.clone()
    }
}

/// Extracts fields as `i64`.
#[derive(Clone, Debug, Default)]
pub struct LongExtractor {
    value: i64,
}

impl LongExtractor {
    /// Create a new `i64` extractor.
    pub fn new() -> LongExtractor {
        LongExtractor::default()
    }
}

impl Extractor for LongExtractor {
    type Value = i64;

    fn name(&self) -> &'static str {
        "long"
    }

    fn extract(
        &mut self,
        field: &[char],
        _quoted: bool,
    ) -> Result<bool, ExtractError> {
        if field.is_empty() {
            return Ok(false);
        }
        self.value = parse_long(self.name(), field)?;
        Ok(true)
    }

    fn value(&self) -> i64 {
        self.value
    }
}

/// Extracts fields as `i32`.
#[derive(Clone, Debug, Default)]
pub struct IntExtractor {
    value: i32,
}

impl IntExtractor {
    /// Create a new `i32` extractor.
    pub fn new() -> IntExtractor {
        IntExtractor::default()
    }
}

impl Extractor for IntExtractor {
    type Value = i32;

    fn name(&self) -> &'static str {
        "int"
    }

    fn extract(
        &mut self,
        field: &[char],
        _quoted: bool,
    ) -> Result<bool, ExtractError> {
        if field.is_empty() {
            return Ok(false);
        }
        let n = parse_long(self.name(), field)?;
        if n < i32::MIN as i64 || n > i32::MAX as i64 {
            return Err(ExtractError::new(
                self.name(),
                ExtractErrorKind::OutOfRange,
                field,
            ));
        }
        self.value = n as i32;
        Ok(true)
    }

    fn value(&self) -> i32 {
        self.value
    }
}

/// Extracts fields as `f64`.
#[derive(Clone, Debug, Default)]
pub struct DoubleExtractor {
    value: f64,
    scratch: String,
}

impl DoubleExtractor {
    /// Create a new `f64` extractor.
    pub fn new() -> DoubleExtractor {
        DoubleExtractor::default()
    }
}

impl Extractor for DoubleExtractor {
    type Value = f64;

    fn name(&self) -> &'static str {
        "double"
    }

    fn extract(
        &mut self,
        field: &[char],
        _quoted: bool,
    ) -> Result<bool, ExtractError> {
        if field.is_empty() {
            return Ok(false);
        }
        self.scratch.clear();
        self.scratch.extend(field.iter());
        self.value = self.scratch.parse().map_err(|_| {
            ExtractError::new(
                "double",
                ExtractErrorKind::InvalidNumber,
                field,
            )
        })?;
        Ok(true)
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Extracts fields as `bool`.
///
/// `true` in any letter case is `true`; any other text is `false`.
#[derive(Clone, Debug, Default)]
pub struct BooleanExtractor {
    value: bool,
}

impl BooleanExtractor {
    /// Create a new `bool` extractor.
    pub fn new() -> BooleanExtractor {
        BooleanExtractor::default()
    }
}

impl Extractor for BooleanExtractor {
    type Value = bool;

    fn name(&self) -> &'static str {
        "boolean"
    }

    fn extract(
        &mut self,
        field: &[char],
        _quoted: bool,
    ) -> Result<bool, ExtractError> {
        if field.is_empty() {
            return Ok(false);
        }
        self.value = field.len() == 4
            && field
                .iter()
                .zip("true".chars())
                .all(|(&a, b)| a.to_ascii_lowercase() == b);
        Ok(true)
    }

    fn value(&self) -> bool {
        self.value
    }
}

/// Extracts single-character fields as `char`.
#[derive(Clone, Debug, Default)]
pub struct CharExtractor {
    value: char,
}

impl CharExtractor {
    /// Create a new `char` extractor.
    pub fn new() -> CharExtractor {
        CharExtractor::default()
    }
}

impl Extractor for CharExtractor {
    type Value = char;

    fn name(&self) -> &'static str {
        "char"
    }

    fn extract(
        &mut self,
        field: &[char],
        _quoted: bool,
    ) -> Result<bool, ExtractError> {
        match field {
            [] => Ok(false),
            [c] => {
                self.value = *c;
                Ok(true)
            }
            _ => Err(ExtractError::new(
                self.name(),
                ExtractErrorKind::NotSingleCharacter,
                field,
            )),
        }
    }

    fn value(&self) -> char {
        self.value
    }
}

/// Extracts fields as a list of strings separated by an array delimiter.
#[derive(Clone, Debug)]
pub struct StringArrayExtractor {
    delimiter: char,
    trim: bool,
    value: Vec<String>,
}

impl StringArrayExtractor {
    /// Create a new extractor splitting on `delimiter`.
    pub fn new(delimiter: char) -> StringArrayExtractor {
        StringArrayExtractor { delimiter, trim: false, value: vec![] }
    }

    /// Strip leading and trailing spaces from each element.
    pub fn trim(mut self, yes: bool) -> StringArrayExtractor {
        self.trim = yes;
        self
    }
}

impl Extractor for StringArrayExtractor {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        "String[]"
    }

    fn extract(
        &mut self,
        field: &[char],
        quoted: bool,
    ) -> Result<bool, ExtractError> {
        self.value.clear();
        if field.is_empty() {
            return Ok(quoted);
        }
        let delimiter = self.delimiter;
        for elem in field.split(move |&c| c == delimiter) {
            let elem = if self.trim { trim_spaces(elem) } else { elem };
            self.value.push(elem.iter().collect());
        }
        Ok(true)
    }

    fn value(&self) -> Vec<String> {
        self.value.clone()
    }
}

/// Extracts fields as a list of `i64` separated by an array delimiter.
///
/// Spaces around each element are ignored.
#[derive(Clone, Debug)]
pub struct LongArrayExtractor {
    delimiter: char,
    value: Vec<i64>,
}

impl LongArrayExtractor {
    /// Create a new extractor splitting on `delimiter`.
    pub fn new(delimiter: char) -> LongArrayExtractor {
        LongArrayExtractor { delimiter, value: vec![] }
    }
}

impl Extractor for LongArrayExtractor {
    type Value = Vec<i64>;

    fn name(&self) -> &'static str {
        "long[]"
    }

    fn extract(
        &mut self,
        field: &[char],
        quoted: bool,
    ) -> Result<bool, ExtractError> {
        self.value.clear();
        if field.is_empty() {
            return Ok(quoted);
        }
        let delimiter = self.delimiter;
        for elem in field.split(move |&c| c == delimiter) {
            self.value.push(parse_long("long[]", trim_spaces(elem))?);
        }
        Ok(true)
    }

    fn value(&self) -> Vec<i64> {
        self.value.clone()
    }
}

fn trim_spaces(mut s: &[char]) -> &[char] {
    while let [' ', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., ' '] = s {
        s = rest;
    }
    s
}

/// Parse a base 10 integer with an optional sign.
///
/// Negative numbers are accumulated downwards so that `i64::MIN` parses.
fn parse_long(name: &'static str, field: &[char]) -> Result<i64, ExtractError> {
    let invalid =
        || ExtractError::new(name, ExtractErrorKind::InvalidNumber, field);
    let range =
        || ExtractError::new(name, ExtractErrorKind::OutOfRange, field);

    let (negative, digits) = match field {
        ['-', rest @ ..] => (true, rest),
        ['+', rest @ ..] => (false, rest),
        _ => (false, field),
    };
    if digits.is_empty() {
        return Err(invalid());
    }
    let mut n: i64 = 0;
    for &c in digits {
        let d = c.to_digit(10).ok_or_else(invalid)? as i64;
        n = n.checked_mul(10).ok_or_else(range)?;
        n = if negative { n.checked_sub(d) } else { n.checked_add(d) }
            .ok_or_else(range)?;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;

    use super::*;

    /// Field text in a fixed-capacity buffer, as a seeker's chunk would
    /// hold it.
    fn chars(s: &str) -> ArrayVec<char, 32> {
        s.chars().collect()
    }

    fn run<E: Extractor>(
        ex: &mut E,
        s: &str,
        quoted: bool,
    ) -> Result<Option<E::Value>, ExtractError> {
        if ex.extract(&chars(s), quoted)? {
            Ok(Some(ex.value()))
        } else {
            Ok(None)
        }
    }

    #[test]
    fn string_empty_unquoted_is_absent() {
        let mut ex = StringExtractor::new();
        assert_eq!(None, run(&mut ex, "", false).unwrap());
        assert_eq!(Some(String::new()), run(&mut ex, "", true).unwrap());
        assert_eq!(Some("a b".to_string()), run(&mut ex, "a b", false).unwrap());
        assert_eq!("a b", ex.as_str());
    }

    #[test]
    fn string_empty_quoted_as_absent() {
        let mut ex = StringExtractor::new().empty_quoted_as_absent(true);
        assert_eq!(None, run(&mut ex, "", true).unwrap());
    }

    #[test]
    fn long_values() {
        let mut ex = LongExtractor::new();
        assert_eq!(Some(0), run(&mut ex, "0", false).unwrap());
        assert_eq!(Some(-42), run(&mut ex, "-42", false).unwrap());
        assert_eq!(Some(17), run(&mut ex, "+17", false).unwrap());
        assert_eq!(
            Some(i64::MIN),
            run(&mut ex, "-9223372036854775808", false).unwrap()
        );
        assert_eq!(
            Some(i64::MAX),
            run(&mut ex, "9223372036854775807", false).unwrap()
        );
        assert_eq!(None, run(&mut ex, "", false).unwrap());
    }

    #[test]
    fn long_errors() {
        let mut ex = LongExtractor::new();
        let err = run(&mut ex, "12a", false).unwrap_err();
        assert_eq!(ExtractErrorKind::InvalidNumber, err.kind());
        assert_eq!("12a", err.text());
        assert_eq!("long", err.extractor());

        let err = run(&mut ex, "-", false).unwrap_err();
        assert_eq!(ExtractErrorKind::InvalidNumber, err.kind());

        let err = run(&mut ex, "9223372036854775808", false).unwrap_err();
        assert_eq!(ExtractErrorKind::OutOfRange, err.kind());
    }

    #[test]
    fn int_range() {
        let mut ex = IntExtractor::new();
        assert_eq!(Some(-5), run(&mut ex, "-5", false).unwrap());
        let err = run(&mut ex, "2147483648", false).unwrap_err();
        assert_eq!(ExtractErrorKind::OutOfRange, err.kind());
    }

    #[test]
    fn double_values() {
        let mut ex = DoubleExtractor::new();
        assert_eq!(Some(1.5), run(&mut ex, "1.5", false).unwrap());
        assert_eq!(Some(-2e3), run(&mut ex, "-2e3", false).unwrap());
        assert!(run(&mut ex, "1.5.2", false).is_err());
        assert_eq!(None, run(&mut ex, "", true).unwrap());
    }

    #[test]
    fn boolean_values() {
        let mut ex = BooleanExtractor::new();
        assert_eq!(Some(true), run(&mut ex, "true", false).unwrap());
        assert_eq!(Some(true), run(&mut ex, "TRUE", false).unwrap());
        assert_eq!(Some(false), run(&mut ex, "false", false).unwrap());
        assert_eq!(Some(false), run(&mut ex, "truex", false).unwrap());
        assert_eq!(None, run(&mut ex, "", false).unwrap());
    }

    #[test]
    fn char_values() {
        let mut ex = CharExtractor::new();
        assert_eq!(Some('é'), run(&mut ex, "é", false).unwrap());
        assert_eq!(None, run(&mut ex, "", false).unwrap());
        let err = run(&mut ex, "ab", false).unwrap_err();
        assert_eq!(ExtractErrorKind::NotSingleCharacter, err.kind());
    }

    #[test]
    fn string_arrays() {
        let mut ex = StringArrayExtractor::new(';');
        assert_eq!(
            Some(vec!["a".to_string(), " b".to_string(), "".to_string()]),
            run(&mut ex, "a; b;", false).unwrap()
        );
        assert_eq!(None, run(&mut ex, "", false).unwrap());
        assert_eq!(Some(vec![]), run(&mut ex, "", true).unwrap());

        let mut ex = StringArrayExtractor::new(';').trim(true);
        assert_eq!(
            Some(vec!["a".to_string(), "b".to_string()]),
            run(&mut ex, " a ; b ", false).unwrap()
        );
    }

    #[test]
    fn long_arrays() {
        let mut ex = LongArrayExtractor::new('|');
        assert_eq!(
            Some(vec![1, 2, -3]),
            run(&mut ex, "1| 2 |-3", false).unwrap()
        );

        let err = run(&mut ex, "1||3", false).unwrap_err();
        assert_eq!(ExtractErrorKind::InvalidNumber, err.kind());
        assert_eq!("long[]", err.extractor());
    }

    #[test]
    fn error_display() {
        let err = ExtractError::new(
            "int",
            ExtractErrorKind::OutOfRange,
            &chars("99999999999"),
        );
        assert_eq!(
            "int extractor: number out of range: \"99999999999\"",
            err.to_string()
        );
    }
}
