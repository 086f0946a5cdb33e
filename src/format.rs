//! Numeric formatters for axis ticks and point annotations.

use std::{str::FromStr, sync::LazyLock, time::Duration};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PanelwiseResult};

pub const DEFAULT_PATTERN: &str = "{x:,.0f}";

const SECONDS_PER_HOUR: f64 = 3_600.0;
const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Python-style replacement field around the value `x`, e.g. `"{x:,.2f} ms"`.
static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>[^{}]*)\{x(?::(?P<comma>,)?(?:\.(?P<precision>\d+))?(?P<kind>[fd%])?)?\}(?P<suffix>[^{}]*)$",
    )
    .expect("number format regex is valid")
});

/// How a chart renders numbers.
///
/// `Pattern` understands the subset of Python format specs used for charts: an optional
/// thousands separator (`,`), an optional precision (`.N`) and the types `f`, `%` and `d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Pattern(String),
    /// The value is a number of hours, rendered as `"{days}d {hours}h"`.
    HoursAsDaysHours,
    /// The value is a number of seconds, rendered as `"{days}d {hours}h"`.
    SecondsAsDaysHours,
    /// The value is a number of seconds, rendered like `"1h 30m"`.
    HumanDuration,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::Pattern(DEFAULT_PATTERN.to_string())
    }
}

impl NumberFormat {
    /// # Errors
    /// [`ConfigError::InvalidFormat`] if the pattern cannot be parsed.
    pub fn pattern(pattern: impl Into<String>) -> PanelwiseResult<Self> {
        let pattern = pattern.into();
        PatternSpec::parse(&pattern)?;
        Ok(Self::Pattern(pattern))
    }

    pub fn validate(&self) -> PanelwiseResult<()> {
        match self {
            Self::Pattern(pattern) => PatternSpec::parse(pattern).map(|_| ()),
            Self::HoursAsDaysHours | Self::SecondsAsDaysHours | Self::HumanDuration => Ok(()),
        }
    }

    pub fn format(&self, value: f64) -> PanelwiseResult<String> {
        Ok(match self {
            Self::Pattern(pattern) => PatternSpec::parse(pattern)?.render(value),
            Self::HoursAsDaysHours => days_hours(value * SECONDS_PER_HOUR),
            Self::SecondsAsDaysHours => days_hours(value),
            Self::HumanDuration => human_duration(value),
        })
    }
}

impl FromStr for NumberFormat {
    type Err = crate::error::PanelwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours_as_days_hours" => Ok(Self::HoursAsDaysHours),
            "seconds_as_days_hours" => Ok(Self::SecondsAsDaysHours),
            "human_duration" => Ok(Self::HumanDuration),
            pattern => Self::pattern(pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Fixed,
    Percent,
    Integer,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PatternSpec<'a> {
    prefix: &'a str,
    grouping: bool,
    precision: Option<usize>,
    kind: Kind,
    suffix: &'a str,
}

impl<'a> PatternSpec<'a> {
    fn parse(pattern: &'a str) -> PanelwiseResult<Self> {
        let invalid = || ConfigError::InvalidFormat(pattern.to_string());
        let caps = PATTERN.captures(pattern).ok_or_else(invalid)?;

        let precision = caps
            .name("precision")
            .map(|m| m.as_str().parse::<usize>())
            .transpose()
            .map_err(|_| invalid())?;
        let kind = match caps.name("kind").map(|m| m.as_str()) {
            Some("f") => Kind::Fixed,
            Some("%") => Kind::Percent,
            Some("d") => Kind::Integer,
            _ => Kind::Plain,
        };

        // `.N` needs a float type; integers take no precision.
        if precision.is_some() && matches!(kind, Kind::Integer | Kind::Plain) {
            return Err(invalid().into());
        }

        Ok(Self {
            prefix: caps.name("prefix").map_or("", |m| m.as_str()),
            grouping: caps.name("comma").is_some(),
            precision,
            kind,
            suffix: caps.name("suffix").map_or("", |m| m.as_str()),
        })
    }

    fn render(&self, value: f64) -> String {
        let body = if !value.is_finite() {
            non_finite(value)
        } else {
            match self.kind {
                Kind::Fixed => self.number(value, self.precision.unwrap_or(6)),
                Kind::Percent => {
                    let percent = self.number(value * 100.0, self.precision.unwrap_or(6));
                    format!("{percent}%")
                }
                Kind::Integer => self.number(value.round_ties_even(), 0),
                Kind::Plain => self.plain(value),
            }
        };
        format!("{}{body}{}", self.prefix, self.suffix)
    }

    fn number(&self, value: f64, precision: usize) -> String {
        let digits = format!("{:.*}", precision, value.abs());
        let digits = if self.grouping {
            group_thousands(&digits)
        } else {
            digits
        };
        if value.is_sign_negative() {
            format!("-{digits}")
        } else {
            digits
        }
    }

    /// Shortest round-trip representation, always with a fractional part.
    fn plain(&self, value: f64) -> String {
        let repr = if value.fract() == 0.0 {
            format!("{:.1}", value.abs())
        } else {
            format!("{}", value.abs())
        };
        let repr = if self.grouping {
            group_thousands(&repr)
        } else {
            repr
        };
        if value.is_sign_negative() {
            format!("-{repr}")
        } else {
            repr
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3 + digits.len());
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if let Some(frac) = frac {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_sign_negative() {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

/// Whole days plus the remaining hours, rounded half to even.
fn days_hours(seconds: f64) -> String {
    let micros = (seconds * MICROS_PER_SECOND as f64).round_ties_even();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return non_finite_or_plain(seconds);
    }

    let micros = micros as i64;
    let days = micros.div_euclid(MICROS_PER_DAY);
    let whole_seconds = micros.rem_euclid(MICROS_PER_DAY) / MICROS_PER_SECOND;
    let hours = (whole_seconds as f64 / SECONDS_PER_HOUR).round_ties_even() as i64;

    format!("{days}d {hours}h")
}

fn human_duration(seconds: f64) -> String {
    match Duration::try_from_secs_f64(seconds.round()) {
        Ok(duration) => humantime::format_duration(duration).to_string(),
        Err(_) => non_finite_or_plain(seconds),
    }
}

fn non_finite_or_plain(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        non_finite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================================
    // Patterns
    // ============================================================================================

    #[test]
    fn default_pattern_groups_thousands_without_decimals() {
        let format = NumberFormat::default();
        assert_eq!(format.format(1_234_567.89).unwrap(), "1,234,568");
        assert_eq!(format.format(999.0).unwrap(), "999");
        assert_eq!(format.format(-4_200.0).unwrap(), "-4,200");
        assert_eq!(format.format(0.0).unwrap(), "0");
    }

    #[test]
    fn precision_and_affixes() {
        let format = NumberFormat::pattern("~{x:.2f} ms").unwrap();
        assert_eq!(format.format(3.14159).unwrap(), "~3.14 ms");

        let format = NumberFormat::pattern("{x:,.1f}").unwrap();
        assert_eq!(format.format(12_345.26).unwrap(), "12,345.3");
    }

    #[test]
    fn percent_multiplies_by_one_hundred() {
        let format = NumberFormat::pattern("{x:.1%}").unwrap();
        assert_eq!(format.format(0.987).unwrap(), "98.7%");

        let format = NumberFormat::pattern("{x:%}").unwrap();
        assert_eq!(format.format(0.5).unwrap(), "50.000000%");
    }

    #[test]
    fn integers_and_plain_values() {
        let format = NumberFormat::pattern("{x:,d}").unwrap();
        assert_eq!(format.format(12_345.0).unwrap(), "12,345");

        let format = NumberFormat::pattern("{x}").unwrap();
        assert_eq!(format.format(3.0).unwrap(), "3.0");
        assert_eq!(format.format(0.25).unwrap(), "0.25");
    }

    #[test]
    fn non_finite_values_render_like_python() {
        let format = NumberFormat::default();
        assert_eq!(format.format(f64::NAN).unwrap(), "nan");
        assert_eq!(format.format(f64::NEG_INFINITY).unwrap(), "-inf");
    }

    #[test]
    fn invalid_patterns_are_config_errors() {
        for pattern in ["{y}", "{x:.2d}", "{x:.2}", "{x:q}", "no field", "{x}{x}"] {
            let err = NumberFormat::pattern(pattern).unwrap_err();
            assert!(err.is_config(), "{pattern} should be rejected");
        }
    }

    // ============================================================================================
    // Durations
    // ============================================================================================

    #[test]
    fn hours_as_days_and_hours() {
        let format = NumberFormat::HoursAsDaysHours;
        assert_eq!(format.format(50.0).unwrap(), "2d 2h");
        assert_eq!(format.format(0.5).unwrap(), "0d 0h");
        assert_eq!(format.format(1.5).unwrap(), "0d 2h");
    }

    #[test]
    fn seconds_as_days_and_hours() {
        let format = NumberFormat::SecondsAsDaysHours;
        assert_eq!(format.format(90_000.0).unwrap(), "1d 1h");
        // Negative deltas borrow a whole day.
        assert_eq!(format.format(-3_600.0).unwrap(), "-1d 23h");
    }

    #[test]
    fn human_duration_uses_whole_seconds() {
        let format = NumberFormat::HumanDuration;
        assert_eq!(format.format(5_400.4).unwrap(), "1h 30m");
        assert_eq!(format.format(-1.0).unwrap(), "-1");
    }

    #[test]
    fn parses_keywords_and_patterns() {
        assert_eq!(
            "human_duration".parse::<NumberFormat>().unwrap(),
            NumberFormat::HumanDuration
        );
        assert_eq!(
            "{x:,.0f}".parse::<NumberFormat>().unwrap(),
            NumberFormat::default()
        );
        assert!("{x:z}".parse::<NumberFormat>().is_err());
    }
}
