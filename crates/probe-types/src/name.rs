//! 账户名 `Name`
//!
//! A name packs up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`
//! into a single `u64`: 12 slots of 5 bits from the top of the word, plus a
//! 13th slot holding only the low 4 bits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned by the const encoder when the input is not a valid name.
pub const INVALID_NAME: u64 = u64::MAX;

const INVALID_CHAR: u8 = 0xff;

/// `.12345abcdefghijklmnopqrstuvwxyz`
const CHAR_MAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name too long: {0} bytes (max 13)")]
    TooLong(usize),

    #[error("invalid character {ch:?} at position {pos}")]
    InvalidChar { ch: char, pos: usize },

    #[error("13th character {0:?} must be one of .12345abcdefghij")]
    InvalidLastChar(char),

    #[error("invalid name value")]
    InvalidValue,
}

pub const fn char_to_index(c: u8) -> u8 {
    match c {
        b'a'..=b'z' => c - b'a' + 6,
        b'1'..=b'5' => c - b'1' + 1,
        b'.' => 0,
        _ => INVALID_CHAR,
    }
}

/// Const 版本，出错时返回 `INVALID_NAME`，用于 `name!` 宏
pub const fn static_str_to_name(s: &str) -> u64 {
    match encode(s.as_bytes()) {
        Ok(v) => v,
        Err(_) => INVALID_NAME,
    }
}

const fn encode(s: &[u8]) -> Result<u64, NameError> {
    if s.len() > 13 {
        return Err(NameError::TooLong(s.len()));
    }
    if s.is_empty() {
        return Ok(0);
    }

    let n = if s.len() == 13 { 12 } else { s.len() };
    let mut value: u64 = 0;
    let mut i = 0;
    while i < n {
        let idx = char_to_index(s[i]);
        if idx == INVALID_CHAR {
            return Err(NameError::InvalidChar {
                ch: s[i] as char,
                pos: i,
            });
        }
        value <<= 5;
        value |= idx as u64;
        i += 1;
    }
    value <<= 4 + 5 * (12 - n);

    if s.len() == 13 {
        let idx = char_to_index(s[12]);
        if idx == INVALID_CHAR {
            return Err(NameError::InvalidChar {
                ch: s[12] as char,
                pos: 12,
            });
        }
        if idx > 0x0f {
            return Err(NameError::InvalidLastChar(s[12] as char));
        }
        value |= idx as u64;
    }

    Ok(value)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Name(u64);

impl Name {
    pub const fn raw(value: u64) -> Self {
        Self(value)
    }

    pub fn from_u64(value: u64) -> Result<Self, NameError> {
        if value == INVALID_NAME {
            return Err(NameError::InvalidValue);
        }
        Ok(Self(value))
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        encode(s.as_bytes()).map(Name)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Name> for u64 {
    fn from(name: Name) -> u64 {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            if i == 0 {
                buf[12] = CHAR_MAP[(tmp & 0x0f) as usize];
                tmp >>= 4;
            } else {
                buf[12 - i] = CHAR_MAP[(tmp & 0x1f) as usize];
                tmp >>= 5;
            }
        }

        let end = buf.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHAR_MAP 只包含 ASCII
        for &c in &buf[..end] {
            fmt::Write::write_char(f, c as char)?;
        }
        Ok(())
    }
}

pub const SAME_PAYER: Name = Name(0);
pub const ACTIVE: Name = Name(static_str_to_name("active"));
pub const OWNER: Name = Name(static_str_to_name("owner"));
pub const CODE: Name = Name(static_str_to_name("eosio.code"));

/// Builds a `Name` from a literal at compile time.
///
/// ```
/// let n = probe_types::name!("eosio");
/// assert_eq!(n.to_string(), "eosio");
/// ```
#[macro_export]
macro_rules! name {
    ($s:expr) => {{
        const VALUE: u64 = $crate::name::static_str_to_name($s);
        const _: () = assert!(VALUE != $crate::name::INVALID_NAME, "bad name literal");
        $crate::name::Name::raw(VALUE)
    }};
}
