//! Transcoding configuration.
use std::{borrow::Cow, env::var, fmt};
use time::UtcOffset;

use crate::{postgres::PgFormat, types::time::parse_offset};

/// Transcoding config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) timezone: UtcOffset,
    pub(crate) param_format: PgFormat,
}

impl Config {
    /// Create config with `UTC` timezone and binary parameter format.
    pub const fn new() -> Config {
        Self { timezone: UtcOffset::UTC, param_format: PgFormat::Binary }
    }

    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `PGTZ`, offset like `UTC`, `+07`, `+05:30` or `-0800`
    /// - `PGFORMAT`, either `text` or `binary`
    ///
    /// Missing or invalid timezone fallback to the process local offset, then `UTC`. Missing
    /// or invalid format fallback to binary.
    pub fn from_env() -> Config {
        let timezone = match var("PGTZ").ok().map(|e| Config::parse_offset(&e)) {
            Some(Ok(ok)) => ok,
            _ => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        };

        let param_format = match var("PGFORMAT").as_deref() {
            Ok("text") => PgFormat::Text,
            _ => PgFormat::Binary,
        };

        Self { timezone, param_format }
    }

    /// Set the offset used for date and time value without time zone.
    pub const fn timezone(mut self, timezone: UtcOffset) -> Config {
        self.timezone = timezone;
        self
    }

    /// Set the default parameter format.
    pub const fn param_format(mut self, format: PgFormat) -> Config {
        self.param_format = format;
        self
    }

    /// Returns the offset used for date and time value without time zone.
    pub const fn get_timezone(&self) -> UtcOffset {
        self.timezone
    }

    /// Returns the default parameter format.
    pub const fn get_param_format(&self) -> PgFormat {
        self.param_format
    }

    /// Parse utc offset.
    ///
    /// ```
    /// use postcode::Config;
    ///
    /// let offset = Config::parse_offset("+05:30").unwrap();
    /// assert_eq!(offset.whole_minutes(), 330);
    /// assert!(Config::parse_offset("UTC").unwrap().is_utc());
    /// assert!(Config::parse_offset("Asia/Jakarta").is_err());
    /// ```
    pub fn parse_offset(offset: &str) -> Result<UtcOffset, ParseError> {
        match offset.trim() {
            "UTC" | "utc" | "GMT" | "Z" => Ok(UtcOffset::UTC),
            offset => parse_offset(offset).ok_or_else(|| ParseError {
                reason: format!("invalid offset {offset:?}").into(),
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when parsing config.
pub struct ParseError {
    pub(crate) reason: Cow<'static,str>,
}

impl std::error::Error for ParseError { }

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse config: {}", self.reason)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offset() {
        let hms = |s| Config::parse_offset(s).unwrap().as_hms();
        assert_eq!(hms("+07"), (7, 0, 0));
        assert_eq!(hms("-0800"), (-8, 0, 0));
        assert_eq!(hms("-03:30"), (-3, -30, 0));
        assert_eq!(hms(" Z "), (0, 0, 0));
        assert!(Config::parse_offset("+99").is_err());
        assert!(Config::parse_offset("7").is_err());

        let err = Config::parse_offset("").unwrap_err();
        assert_eq!(err.to_string(), "failed to parse config: invalid offset \"\"");
    }

    #[test]
    fn builder() {
        let config = Config::new()
            .timezone(UtcOffset::from_hms(7, 0, 0).unwrap())
            .param_format(PgFormat::Text);
        assert_eq!(config.get_timezone().whole_hours(), 7);
        assert_eq!(config.get_param_format(), PgFormat::Text);
        assert_eq!(Config::default(), Config::new());
    }
}
