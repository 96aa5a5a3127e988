use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Strict less-than over lines. Every leaf of a merge must already be
/// sorted under the predicate the merge is built with.
pub type LessThan = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Code-point order, the default.
///
/// UTF-8 byte order and code-point order agree, so this is plain `<`.
pub fn lexicographic() -> LessThan {
    Arc::new(|a: &str, b: &str| a < b)
}

/// Descending code-point order.
pub fn reverse_lexicographic() -> LessThan {
    Arc::new(|a: &str, b: &str| b < a)
}

/// Numeric order on the trimmed line.
///
/// Lines that do not parse as a number (including `NaN`) sort after all
/// numbers, in code-point order among themselves.
pub fn numeric() -> LessThan {
    Arc::new(|a: &str, b: &str| match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x < y,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => a < b,
    })
}

fn parse_number(line: &str) -> Option<f64> {
    line.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Named orderings, as selected from configuration or the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrder {
    #[default]
    Lexicographic,
    Reverse,
    Numeric,
}

impl LineOrder {
    pub fn predicate(self) -> LessThan {
        match self {
            Self::Lexicographic => lexicographic(),
            Self::Reverse => reverse_lexicographic(),
            Self::Numeric => numeric(),
        }
    }
}

impl fmt::Display for LineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lexicographic => "lexicographic",
            Self::Reverse => "reverse",
            Self::Numeric => "numeric",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown [`LineOrder`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown line order `{0}` (expected lexicographic, reverse, or numeric)")]
pub struct UnknownOrder(pub String);

impl FromStr for LineOrder {
    type Err = UnknownOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            "reverse" => Ok(Self::Reverse),
            "numeric" | "num" => Ok(Self::Numeric),
            _ => Err(UnknownOrder(s.to_string())),
        }
    }
}
