use std::error::Error;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Error returned when a persisted enum token is not recognised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenParseError {
    pub kind: &'static str,
    pub token: String,
}

impl fmt::Display for TokenParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} token '{}'", self.kind, self.token)
    }
}

impl Error for TokenParseError {}

/// Storage representation of a column.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ColumnMode {
    #[default]
    Double,
    Integer,
    BigInt,
    Text,
    DateTime,
}

impl ColumnMode {
    pub const ALL: [ColumnMode; 5] = [
        ColumnMode::Double,
        ColumnMode::Integer,
        ColumnMode::BigInt,
        ColumnMode::Text,
        ColumnMode::DateTime,
    ];

    pub fn token(self) -> &'static str {
        match self {
            ColumnMode::Double => "double",
            ColumnMode::Integer => "integer",
            ColumnMode::BigInt => "big_int",
            ColumnMode::Text => "text",
            ColumnMode::DateTime => "date_time",
        }
    }

    /// Double, Integer and BigInt.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnMode::Double | ColumnMode::Integer | ColumnMode::BigInt
        )
    }

    /// Modes that map onto a continuous axis (numeric or date-time).
    pub fn is_plottable(self) -> bool {
        self.is_numeric() || self == ColumnMode::DateTime
    }
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ColumnMode {
    type Err = TokenParseError;

    /// Accepts the textual tokens and the legacy numeric codes
    /// (`0` double, `1` text, `4`/`5`/`6` date-time, `8` integer, `9` bigint).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "double" | "0" => Ok(ColumnMode::Double),
            "text" | "1" => Ok(ColumnMode::Text),
            "date_time" | "datetime" | "4" | "5" | "6" => Ok(ColumnMode::DateTime),
            "integer" | "8" => Ok(ColumnMode::Integer),
            "big_int" | "bigint" | "9" => Ok(ColumnMode::BigInt),
            _ => Err(TokenParseError {
                kind: "column mode",
                token: s.to_string(),
            }),
        }
    }
}

/// Role of a column when it is handed to a plot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PlotDesignation {
    #[default]
    None,
    X,
    Y,
    Z,
    XError,
    XErrorPlus,
    XErrorMinus,
    YError,
    YErrorMinus,
    YErrorPlus,
}

impl PlotDesignation {
    const TOKENS: [(PlotDesignation, &'static str); 10] = [
        (PlotDesignation::None, "none"),
        (PlotDesignation::X, "x"),
        (PlotDesignation::Y, "y"),
        (PlotDesignation::Z, "z"),
        (PlotDesignation::XError, "x_error"),
        (PlotDesignation::XErrorPlus, "x_error_plus"),
        (PlotDesignation::XErrorMinus, "x_error_minus"),
        (PlotDesignation::YError, "y_error"),
        (PlotDesignation::YErrorMinus, "y_error_minus"),
        (PlotDesignation::YErrorPlus, "y_error_plus"),
    ];

    pub fn token(self) -> &'static str {
        Self::TOKENS[self as usize].1
    }
}

impl fmt::Display for PlotDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for PlotDesignation {
    type Err = TokenParseError;

    /// Accepts the textual tokens and the legacy numeric codes `0..=9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        if let Ok(code) = t.parse::<usize>() {
            if let Some((d, _)) = Self::TOKENS.get(code) {
                return Ok(*d);
            }
        }
        Self::TOKENS
            .iter()
            .find(|(_, tok)| *tok == t)
            .map(|(d, _)| *d)
            .ok_or_else(|| TokenParseError {
                kind: "plot designation",
                token: s.to_string(),
            })
    }
}

/// Monotonicity classification of a column's values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Properties {
    /// Not classifiable: text, empty, or containing invalid/masked rows.
    #[default]
    No,
    NonMonotonic,
    Constant,
    MonotonicIncreasing,
    MonotonicDecreasing,
}

impl Properties {
    pub fn is_monotonic(self) -> bool {
        matches!(
            self,
            Properties::MonotonicIncreasing | Properties::MonotonicDecreasing
        )
    }
}
