//! Enumeration types for constrained report parameters.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Date range rule used by the events report.
///
/// The window always ends at the reference date (inclusive, end of day);
/// the variant decides where it starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    /// From Monday of the reference week.
    Week,
    /// From the first day of the reference month.
    #[default]
    Month,
    /// From January 1 of the reference year.
    Year,
    /// Everything up to the reference date.
    All,
}

impl Period {
    /// Returns the short code accepted by [`Period::from_str`].
    #[inline]
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Week => "W",
            Self::Month => "M",
            Self::Year => "Y",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for Period {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Period {
    type Err = ReportError;

    /// Parses `W`, `M`, `Y` or `ALL` (case-insensitive). Blank input
    /// yields the default month period.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Ok(Self::default());
        }
        match code.to_ascii_uppercase().as_str() {
            "W" => Ok(Self::Week),
            "M" => Ok(Self::Month),
            "Y" => Ok(Self::Year),
            "ALL" => Ok(Self::All),
            _ => Err(ReportError::WrongType(format!(
                "unknown period code {code:?}, expected W, M, Y or ALL"
            ))),
        }
    }
}
