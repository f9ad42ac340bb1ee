//! Conversion of raw ledger records into sorted view models
//!
//! Numeric fields are coerced the way a JavaScript front-end would read them
//! with `Number(...)`: surrounding whitespace is ignored, empty text counts as
//! zero and `0x` text is hexadecimal. Addresses are lower-cased so they can be
//! compared without caring about EIP-55 checksum casing.

use crate::models::{Contestant, NumericLike, Poll, RawContestant, RawPoll};
use ethers::types::U256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Field `{field}` is not a number: {value}")]
    NotANumber { field: &'static str, value: String },

    #[error("Field `{field}` is negative: {value}")]
    Negative { field: &'static str, value: String },

    #[error("Field `{field}` is not a whole number: {value}")]
    Fractional { field: &'static str, value: String },

    #[error("Field `{field}` does not fit in 64 bits: {value}")]
    Overflow { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Polls, newest first by creation timestamp
pub fn structure_polls(polls: Vec<RawPoll>) -> Result<Vec<Poll>> {
    let mut structured = polls
        .into_iter()
        .map(structure_poll)
        .collect::<Result<Vec<_>>>()?;

    structured.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(structured)
}

/// Contestants, highest vote count first
pub fn structure_contestants(contestants: Vec<RawContestant>) -> Result<Vec<Contestant>> {
    let mut structured = contestants
        .into_iter()
        .map(structure_contestant)
        .collect::<Result<Vec<_>>>()?;

    structured.sort_by(|a, b| b.votes.cmp(&a.votes));
    Ok(structured)
}

/// A single poll, unsorted context
pub fn structure_poll(poll: RawPoll) -> Result<Poll> {
    Ok(Poll {
        id: coerce_u64("id", &poll.id)?,
        image: poll.image,
        title: poll.title,
        description: poll.description,
        votes: coerce_u64("votes", &poll.votes)?,
        contestants: coerce_u64("contestants", &poll.contestants)?,
        deleted: poll.deleted,
        director: poll.director.to_lowercase(),
        starts_at: coerce_u64("startsAt", &poll.starts_at)?,
        ends_at: coerce_u64("endsAt", &poll.ends_at)?,
        timestamp: coerce_u64("timestamp", &poll.timestamp)?,
        voters: lowercase_all(poll.voters),
        avatars: poll.avatars,
    })
}

pub fn structure_contestant(contestant: RawContestant) -> Result<Contestant> {
    Ok(Contestant {
        id: coerce_u64("id", &contestant.id)?,
        image: contestant.image,
        name: contestant.name,
        voter: contestant.voter.to_lowercase(),
        votes: coerce_u64("votes", &contestant.votes)?,
        voters: lowercase_all(contestant.voters),
    })
}

fn lowercase_all(addresses: Vec<String>) -> Vec<String> {
    addresses.into_iter().map(|a| a.to_lowercase()).collect()
}

/// Coerce a numeric-like value to `u64`
pub fn coerce_u64(field: &'static str, value: &NumericLike) -> Result<u64> {
    match value {
        NumericLike::Unsigned(v) => Ok(*v),
        NumericLike::Signed(v) => {
            u64::try_from(*v).map_err(|_| NormalizeError::Negative {
                field,
                value: v.to_string(),
            })
        }
        NumericLike::Float(v) => coerce_float(field, *v),
        NumericLike::Big(v) => coerce_big(field, *v),
        NumericLike::Text(text) => coerce_text(field, text),
    }
}

fn coerce_float(field: &'static str, v: f64) -> Result<u64> {
    if !v.is_finite() {
        return Err(NormalizeError::NotANumber {
            field,
            value: v.to_string(),
        });
    }
    if v < 0.0 {
        return Err(NormalizeError::Negative {
            field,
            value: v.to_string(),
        });
    }
    if v.fract() != 0.0 {
        return Err(NormalizeError::Fractional {
            field,
            value: v.to_string(),
        });
    }
    // 2^64 is exactly representable, anything at or above it overflows
    if v >= 18_446_744_073_709_551_616.0 {
        return Err(NormalizeError::Overflow {
            field,
            value: v.to_string(),
        });
    }
    Ok(v as u64)
}

fn coerce_big(field: &'static str, v: U256) -> Result<u64> {
    if v > U256::from(u64::MAX) {
        return Err(NormalizeError::Overflow {
            field,
            value: v.to_string(),
        });
    }
    Ok(v.as_u64())
}

fn coerce_text(field: &'static str, text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        let not_a_number = || NormalizeError::NotANumber {
            field,
            value: text.to_string(),
        };
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(not_a_number());
        }
        let big = U256::from_str_radix(hex, 16).map_err(|_| not_a_number())?;
        return coerce_big(field, big);
    }

    if let Ok(v) = trimmed.parse::<u64>() {
        return Ok(v);
    }

    match trimmed.parse::<f64>() {
        Ok(v) => coerce_float(field, v),
        Err(_) => Err(NormalizeError::NotANumber {
            field,
            value: text.to_string(),
        }),
    }
}
