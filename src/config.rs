#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The options a seeker reads at construction.
///
/// `Config` implements this trait and is what most callers want. The trait
/// exists so that configuration objects owned by a larger import tool can be
/// handed to a seeker directly. Options added after the first release are
/// provided methods returning the defaults of `Config::DEFAULT`, so older
/// implementations keep working without defining them.
pub trait Configuration {
    /// The character that opens and closes quoted fields.
    fn quotation_character(&self) -> char;

    /// Whether raw line breaks are permitted inside quoted fields.
    fn multiline_fields(&self) -> bool;

    /// Whether `\"` and `\\` inside quoted fields are read as escapes.
    fn legacy_style_quoting(&self) -> bool;

    /// Whether leading and trailing spaces are stripped from unquoted
    /// fields.
    fn trim_strings(&self) -> bool {
        Config::DEFAULT.trim_strings
    }

    /// The number of characters each chunk read from a source holds. This
    /// is also the largest field that can be read.
    fn buffer_size(&self) -> usize {
        Config::DEFAULT.buffer_size
    }
}

/// A frozen set of dialect and formatting options.
///
/// Build one with [`ConfigBuilder`](struct.ConfigBuilder.html). Once a seeker
/// is created from a configuration, the options cannot change.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    quotation_character: char,
    multiline_fields: bool,
    legacy_style_quoting: bool,
    trim_strings: bool,
    buffer_size: usize,
}

impl Config {
    /// The default configuration: `"` quotes, no multi-line fields, no
    /// backslash escapes, no trimming and a 4M character buffer.
    pub const DEFAULT: Config = Config {
        quotation_character: '"',
        multiline_fields: false,
        legacy_style_quoting: false,
        trim_strings: false,
        buffer_size: 4 * 1024 * 1024,
    };

    /// Create a configuration with default options.
    pub fn new() -> Config {
        Config::DEFAULT
    }

    /// Create a builder starting from the default options.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::DEFAULT
    }
}

impl Configuration for Config {
    fn quotation_character(&self) -> char {
        self.quotation_character
    }

    fn multiline_fields(&self) -> bool {
        self.multiline_fields
    }

    fn legacy_style_quoting(&self) -> bool {
        self.legacy_style_quoting
    }

    fn trim_strings(&self) -> bool {
        self.trim_strings
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

/// Builds a `Config` with various configuration knobs.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default options.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build the configuration.
    pub fn build(&self) -> Config {
        self.config.clone()
    }

    /// The quote character to use.
    ///
    /// The default is `'"'`.
    pub fn quotation_character(&mut self, quote: char) -> &mut ConfigBuilder {
        self.config.quotation_character = quote;
        self
    }

    /// Allow `\r` and `\n` inside quoted fields.
    ///
    /// This is disabled by default, in which case a line break inside quotes
    /// is an error. Enabling it means an unterminated quote may consume
    /// input up to the buffer size before being detected.
    pub fn multiline_fields(&mut self, yes: bool) -> &mut ConfigBuilder {
        self.config.multiline_fields = yes;
        self
    }

    /// Recognize `\"` and `\\` as escapes inside quoted fields, in addition
    /// to doubled quotes.
    ///
    /// This is disabled by default.
    pub fn legacy_style_quoting(&mut self, yes: bool) -> &mut ConfigBuilder {
        self.config.legacy_style_quoting = yes;
        self
    }

    /// Strip spaces around unquoted fields. Spaces inside quotes are always
    /// kept.
    ///
    /// This is disabled by default.
    pub fn trim_strings(&mut self, yes: bool) -> &mut ConfigBuilder {
        self.config.trim_strings = yes;
        self
    }

    /// The number of characters read per chunk.
    ///
    /// No field may be longer than this. The default is `4 * 1024 * 1024`.
    pub fn buffer_size(&mut self, size: usize) -> &mut ConfigBuilder {
        self.config.buffer_size = size;
        self
    }
}

/// The options a seeker actually uses, copied out of a `Configuration` once.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Dialect {
    pub quote: char,
    pub multiline: bool,
    pub legacy_escapes: bool,
    pub trim: bool,
}

impl Dialect {
    pub fn from_config<C: Configuration + ?Sized>(config: &C) -> Dialect {
        Dialect {
            quote: config.quotation_character(),
            multiline: config.multiline_fields(),
            legacy_escapes: config.legacy_style_quoting(),
            trim: config.trim_strings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Configuration, Dialect};

    struct OldConfig;

    impl Configuration for OldConfig {
        fn quotation_character(&self) -> char {
            '\''
        }

        fn multiline_fields(&self) -> bool {
            true
        }

        fn legacy_style_quoting(&self) -> bool {
            false
        }
    }

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!('"', config.quotation_character());
        assert!(!config.multiline_fields());
        assert!(!config.legacy_style_quoting());
        assert!(!config.trim_strings());
        assert_eq!(4 * 1024 * 1024, config.buffer_size());
    }

    #[test]
    fn builder() {
        let config = Config::builder()
            .quotation_character('\'')
            .multiline_fields(true)
            .legacy_style_quoting(true)
            .trim_strings(true)
            .buffer_size(64)
            .build();
        assert_eq!('\'', config.quotation_character());
        assert!(config.multiline_fields());
        assert!(config.legacy_style_quoting());
        assert!(config.trim_strings());
        assert_eq!(64, config.buffer_size());
    }

    #[test]
    fn older_configuration_falls_back() {
        let dialect = Dialect::from_config(&OldConfig);
        assert_eq!('\'', dialect.quote);
        assert!(dialect.multiline);
        assert_eq!(Config::DEFAULT.trim_strings(), dialect.trim);
        assert_eq!(Config::DEFAULT.buffer_size(), OldConfig.buffer_size());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"trim_strings": true}"#).unwrap();
        assert!(config.trim_strings());
        assert_eq!('"', config.quotation_character());
        assert_eq!(Config::DEFAULT.buffer_size(), config.buffer_size());
    }
}
