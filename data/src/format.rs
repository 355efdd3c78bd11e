use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Unsupported format type '{0}'")]
    UnsupportedType(char),
    #[error("Invalid precision in '{0}'")]
    InvalidPrecision(String),
    #[error("Unexpected trailing input in '{0}'")]
    Trailing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notation {
    /// rounded to an integer, precision is ignored
    Integer,
    Fixed,
}

/// Currency formatter built from a d3-style pattern such as `$.1d` or `$,.2f`.
///
/// Grammar: `[$][,][.precision][d|f]`. A missing type means `d`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyFormat {
    pattern: String,
    symbol: bool,
    grouping: bool,
    precision: usize,
    notation: Notation,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            pattern: "$.1d".to_string(),
            symbol: true,
            grouping: false,
            precision: 1,
            notation: Notation::Integer,
        }
    }
}

impl FromStr for CurrencyFormat {
    type Err = FormatError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let mut rest = pattern;

        let symbol = rest.starts_with('$');
        if symbol {
            rest = &rest[1..];
        }

        let grouping = rest.starts_with(',');
        if grouping {
            rest = &rest[1..];
        }

        let mut precision = None;
        if let Some(after_dot) = rest.strip_prefix('.') {
            let digits = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            let parsed = after_dot[..digits]
                .parse::<usize>()
                .map_err(|_| FormatError::InvalidPrecision(pattern.to_string()))?;
            precision = Some(parsed);
            rest = &after_dot[digits..];
        }

        let mut chars = rest.chars();
        let notation = match chars.next() {
            None | Some('d') => Notation::Integer,
            Some('f') => Notation::Fixed,
            Some(other) => return Err(FormatError::UnsupportedType(other)),
        };

        if chars.next().is_some() {
            return Err(FormatError::Trailing(pattern.to_string()));
        }

        Ok(CurrencyFormat {
            pattern: pattern.to_string(),
            symbol,
            grouping,
            precision: precision.unwrap_or(match notation {
                Notation::Integer => 0,
                Notation::Fixed => 6,
            }),
            notation,
        })
    }
}

impl TryFrom<String> for CurrencyFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyFormat> for String {
    fn from(value: CurrencyFormat) -> Self {
        value.pattern
    }
}

impl fmt::Display for CurrencyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl CurrencyFormat {
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "NaN".to_string();
        }

        let body = match self.notation {
            Notation::Integer => format!("{:.0}", value.abs().round()),
            Notation::Fixed => {
                let rounded = round_half_up(value.abs(), self.precision);
                format!("{:.*}", self.precision, rounded)
            }
        };

        let body = if self.grouping {
            group_thousands(&body)
        } else {
            body
        };

        let negative = value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0');
        let sign = if negative { "-" } else { "" };
        let symbol = if self.symbol { "$" } else { "" };

        format!("{sign}{symbol}{body}")
    }
}

fn group_thousands(body: &str) -> String {
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + frac_part.len());
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(frac_part);
    grouped
}

/// Whole-number percentage, e.g. `0.25` -> `25%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.0}%", (fraction * 100.0).round())
}

/// `{:.N}` rounds ties to even; ties here go away from zero.
fn round_half_up(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let scaled = (value * factor).round() / factor;
    if scaled.is_finite() { scaled } else { value }
}

/// Shortens long identifiers to their first 6 and last 4 characters.
pub fn abbreviate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return address.to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_rounds_to_dollars() {
        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format(1000.0), "$1000");
        assert_eq!(fmt.format(1149.6), "$1150");
        assert_eq!(fmt.format(0.0), "$0");
        assert_eq!(fmt, "$.1d".parse().unwrap());
    }

    #[test]
    fn grouping_and_fixed_precision() {
        let fmt: CurrencyFormat = "$,.2f".parse().unwrap();
        assert_eq!(fmt.format(1234567.891), "$1,234,567.89");
        assert_eq!(fmt.format(-12.5), "-$12.50");

        let plain: CurrencyFormat = ",d".parse().unwrap();
        assert_eq!(plain.format(950.0), "950");
        assert_eq!(plain.format(-0.2), "0");
    }

    #[test]
    fn rejects_unsupported_patterns() {
        assert_eq!(
            "$.2e".parse::<CurrencyFormat>(),
            Err(FormatError::UnsupportedType('e'))
        );
        assert!(matches!(
            "$.xd".parse::<CurrencyFormat>(),
            Err(FormatError::InvalidPrecision(_))
        ));
        assert!(matches!(
            "$dd".parse::<CurrencyFormat>(),
            Err(FormatError::Trailing(_))
        ));
    }

    #[test]
    fn serde_uses_the_pattern_string() {
        let fmt: CurrencyFormat = serde_json::from_str("\"$,.1f\"").unwrap();
        assert_eq!(fmt.format(1500.26), "$1,500.3");
        assert_eq!(serde_json::to_string(&fmt).unwrap(), "\"$,.1f\"");
        assert!(serde_json::from_str::<CurrencyFormat>("\"%\"").is_err());
    }

    #[test]
    fn percent_is_rounded() {
        assert_eq!(format_percent(0.25), "25%");
        assert_eq!(format_percent(0.8), "80%");
        assert_eq!(format_percent(0.333), "33%");
        assert_eq!(format_percent(0.125), "13%");
    }

    #[test]
    fn fixed_ties_round_away_from_zero() {
        let fmt: CurrencyFormat = "$.2f".parse().unwrap();
        assert_eq!(fmt.format(1.125), "$1.13");
        assert_eq!(fmt.format(-1.125), "-$1.13");
        assert_eq!(fmt.format(2.5e-7), "$0.00");
    }

    #[test]
    fn long_addresses_are_abbreviated() {
        assert_eq!(
            abbreviate_address("0x14rPtntr7WEawK0jXHpKcRvFVPDfCkGPt"),
            "0x14rP...kGPt"
        );
        assert_eq!(abbreviate_address("0x1234567"), "0x1234567");
        assert_eq!(abbreviate_address(""), "");
    }
}
