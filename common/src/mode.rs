//! Permission modes and integer literal parsing.
//!
//! Modes and numeric ids are accepted in any conventional integer base:
//! `0o755`, `0x1ed`, `0b111101101`, C-style `0755`, or plain decimal `493`.

use crate::error::{FsError, Result};
use std::fmt;
use std::str::FromStr;

/// Highest value accepted as a mode: permission triads plus setuid, setgid
/// and sticky bits.
pub const MAX_MODE: u32 = 0o7777;

/// Parses an unsigned integer literal, honouring base prefixes.
///
/// Returns `None` when the text is not a valid literal in its base.
///
/// # Examples
///
/// ```
/// use provision_common::mode::parse_int_literal;
///
/// assert_eq!(parse_int_literal("0o755"), Some(0o755));
/// assert_eq!(parse_int_literal("0755"), Some(0o755));
/// assert_eq!(parse_int_literal("0x1ed"), Some(0o755));
/// assert_eq!(parse_int_literal("493"), Some(0o755));
/// assert_eq!(parse_int_literal("jboss"), None);
/// ```
#[must_use]
pub fn parse_int_literal(raw: &str) -> Option<u32> {
    let text = raw.trim();
    let (digits, radix) = split_radix(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

fn split_radix(text: &str) -> (&str, u32) {
    let prefixed = [("0o", 8), ("0O", 8), ("0x", 16), ("0X", 16), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in prefixed {
        if let Some(rest) = text.strip_prefix(prefix) {
            return (rest, radix);
        }
    }
    match text.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => (rest, 8),
        _ => (text, 10),
    }
}

/// A validated permission bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    /// Creates a mode from raw bits.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidMode`] when `bits` exceeds [`MAX_MODE`].
    pub fn new(bits: u32) -> Result<Self> {
        if bits > MAX_MODE {
            return Err(FsError::InvalidMode {
                value: format!("{bits:#o}"),
                reason: format!("exceeds maximum {MAX_MODE:#o}"),
            });
        }
        Ok(Self(bits))
    }

    /// Returns the raw permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl FromStr for Mode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = parse_int_literal(s).ok_or_else(|| FsError::InvalidMode {
            value: s.to_owned(),
            reason: "not an integer literal (expected e.g. 0755, 0o755 or 493)".to_owned(),
        })?;
        Self::new(bits).map_err(|_| FsError::InvalidMode {
            value: s.to_owned(),
            reason: format!("exceeds maximum {MAX_MODE:#o}"),
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}
