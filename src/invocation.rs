//! Invocation modes of the collector binary
//!
//! - no argument: collect yesterday once
//! - `manual`: prompt for dates (`YYYYMMDD`) until `q`

use chrono::NaiveDate;
use thiserror::Error;

const MANUAL: &str = "manual";
const QUIT: &str = "q";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Auto,
    Manual,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid argument {0:?}: either leave blank for auto mode, or enter 'manual'")]
pub struct InvalidArgument(pub String);

impl Invocation {
    pub fn parse(mode: Option<&str>) -> Result<Self, InvalidArgument> {
        match mode {
            None => Ok(Invocation::Auto),
            Some(MANUAL) => Ok(Invocation::Manual),
            Some(other) => Err(InvalidArgument(other.to_string())),
        }
    }
}

/// One line typed at the manual prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualEntry {
    Quit,
    Date(NaiveDate),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("invalid entry: expected 8 digits (YYYYMMDD)")]
    Format,

    #[error("invalid entry: {0} is not a calendar date")]
    Calendar(String),
}

impl ManualEntry {
    pub fn parse(input: &str) -> Result<Self, EntryError> {
        let input = input.trim();
        if input == QUIT {
            return Ok(ManualEntry::Quit);
        }
        if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EntryError::Format);
        }
        NaiveDate::parse_from_str(input, "%Y%m%d")
            .map(ManualEntry::Date)
            .map_err(|_| EntryError::Calendar(input.to_string()))
    }
}
