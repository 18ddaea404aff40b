//! Bounds and precondition checks shared by views and cursor buffers
//!
//! Every check site takes the [`CheckMode`] of the object it guards. With
//! [`CheckMode::Unchecked`] nothing is validated: a violated precondition then
//! turns into an out-of-range memory access, exactly like raw pointer code.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructMemError};

/// Environment variable consulted once for the process default mode
pub const CHECKS_ENV_VAR: &str = "STRUCTMEM_CHECKS";

/// Validation level applied by views and buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Skip all checks
    Unchecked,
    /// Validate cursor, index and argument preconditions
    Checked,
    /// Additionally validate struct member bounds
    Strict,
}

lazy_static::lazy_static! {
    static ref PROCESS_DEFAULT: CheckMode = CheckMode::from_env();
}

impl Default for CheckMode {
    fn default() -> Self {
        Self::Checked
    }
}

impl CheckMode {
    /// Parse a mode from its textual form
    ///
    /// Unknown values fall back to [`CheckMode::Checked`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "off" | "no" | "unchecked" => Self::Unchecked,
            "strict" | "debug" => Self::Strict,
            _ => Self::Checked,
        }
    }

    /// Read the mode from `STRUCTMEM_CHECKS`, defaulting to `Checked`
    pub fn from_env() -> Self {
        std::env::var(CHECKS_ENV_VAR)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    /// Process-wide default, read once on first use
    pub fn process_default() -> Self {
        *PROCESS_DEFAULT
    }

    /// Whether ordinary preconditions are validated
    #[inline]
    pub fn enabled(self) -> bool {
        !matches!(self, Self::Unchecked)
    }

    /// Whether member bounds are validated
    #[inline]
    pub fn strict(self) -> bool {
        matches!(self, Self::Strict)
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::Checked => "checked",
            Self::Strict => "strict",
        }
    }
}

/// Fail with `InvalidArgument` unless `condition` holds
#[inline]
pub fn check_argument(mode: CheckMode, condition: bool, parameter: &str, message: &str) -> Result<()> {
    if mode.enabled() && !condition {
        return Err(StructMemError::invalid_argument(parameter, message));
    }
    Ok(())
}

/// Reject the null address
#[inline]
pub fn check_address(mode: CheckMode, address: usize) -> Result<usize> {
    if mode.enabled() && address == 0 {
        return Err(StructMemError::invalid_argument("address", "null address"));
    }
    Ok(address)
}

/// Require `index < limit`
#[inline]
pub fn check_index(mode: CheckMode, index: usize, limit: usize) -> Result<usize> {
    if mode.enabled() && index >= limit {
        return Err(StructMemError::index_out_of_range(index, limit));
    }
    Ok(index)
}

/// Require `offset + size <= sizeof`, strict mode only
#[inline]
pub fn check_member(mode: CheckMode, offset: usize, size: usize, sizeof: usize) -> Result<()> {
    if mode.strict() && offset.checked_add(size).map_or(true, |end| end > sizeof) {
        return Err(StructMemError::invalid_argument(
            "member_offset",
            format!("member at {} of size {} exceeds struct size {}", offset, size, sizeof),
        ));
    }
    Ok(())
}

/// Panic unless a `size`-byte member at `offset` fits in `sizeof` bytes
///
/// Applied in every mode by the safe member accessors.
#[inline]
#[track_caller]
pub fn assert_member(offset: usize, size: usize, sizeof: usize) {
    assert!(
        offset.checked_add(size).map_or(false, |end| end <= sizeof),
        "member at {} of size {} exceeds struct size {}",
        offset,
        size,
        sizeof
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "exceeds struct size")]
    fn test_assert_member_rejects_overrun() {
        assert_member(6, 4, 8);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(CheckMode::parse("false"), CheckMode::Unchecked);
        assert_eq!(CheckMode::parse(" OFF "), CheckMode::Unchecked);
        assert_eq!(CheckMode::parse("debug"), CheckMode::Strict);
        assert_eq!(CheckMode::parse("true"), CheckMode::Checked);
        assert_eq!(CheckMode::parse("whatever"), CheckMode::Checked);
    }

    #[test]
    fn test_unchecked_skips_everything() {
        let mode = CheckMode::Unchecked;
        assert!(check_argument(mode, false, "p", "bad").is_ok());
        assert!(check_address(mode, 0).is_ok());
        assert!(check_index(mode, 10, 2).is_ok());
    }

    #[test]
    fn test_checked_reports_errors() {
        let mode = CheckMode::Checked;
        assert!(matches!(
            check_address(mode, 0),
            Err(StructMemError::InvalidArgument { .. })
        ));
        assert_eq!(
            check_index(mode, 2, 2),
            Err(StructMemError::index_out_of_range(2, 2))
        );
        assert_eq!(check_index(mode, 1, 2), Ok(1));
    }

    #[test]
    fn test_member_check_only_in_strict() {
        assert!(check_member(CheckMode::Checked, 12, 8, 16).is_ok());
        assert!(check_member(CheckMode::Strict, 12, 8, 16).is_err());
        assert!(check_member(CheckMode::Strict, 8, 8, 16).is_ok());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&CheckMode::Strict).unwrap();
        assert_eq!(json, "\"strict\"");
        let mode: CheckMode = serde_json::from_str("\"unchecked\"").unwrap();
        assert_eq!(mode, CheckMode::Unchecked);
    }
}
