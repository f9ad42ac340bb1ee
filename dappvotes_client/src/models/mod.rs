//! Poll and contestant view models

pub mod raw;

pub use raw::{NumericLike, RawContestant, RawPoll};

use serde::{Deserialize, Serialize};

/// Where a poll sits in its voting window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PollStatus {
    Upcoming,
    Open,
    Ended,
}

/// Poll snapshot, rebuilt from the ledger on every fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: u64,
    pub image: String,
    pub title: String,
    pub description: String,
    pub votes: u64,
    pub contestants: u64,
    pub deleted: bool,
    /// Lower-cased creator address
    pub director: String,
    /// Milliseconds since the epoch
    pub starts_at: u64,
    /// Milliseconds since the epoch
    pub ends_at: u64,
    /// Creation time in milliseconds
    pub timestamp: u64,
    /// Lower-cased voter addresses
    pub voters: Vec<String>,
    pub avatars: Vec<String>,
}

impl Poll {
    /// Status of the voting window at `now_ms`
    pub fn status(&self, now_ms: u64) -> PollStatus {
        if now_ms < self.starts_at {
            PollStatus::Upcoming
        } else if now_ms < self.ends_at {
            PollStatus::Open
        } else {
            PollStatus::Ended
        }
    }

    /// Case-insensitive check against the voter list
    pub fn has_voted(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.voters.iter().any(|v| *v == address)
    }

    pub fn is_director(&self, address: &str) -> bool {
        self.director == address.to_lowercase()
    }
}

/// Contestant snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    pub id: u64,
    pub image: String,
    pub name: String,
    /// Lower-cased address that registered the contestant
    pub voter: String,
    pub votes: u64,
    pub voters: Vec<String>,
}

/// Arguments of `createPoll` and `updatePoll`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollParams {
    pub image: String,
    pub title: String,
    pub description: String,
    pub starts_at: u64,
    pub ends_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(starts_at: u64, ends_at: u64) -> Poll {
        Poll {
            id: 1,
            image: String::new(),
            title: "Board election".to_string(),
            description: "Pick the next board".to_string(),
            votes: 0,
            contestants: 0,
            deleted: false,
            director: "0xabc0000000000000000000000000000000000001".to_string(),
            starts_at,
            ends_at,
            timestamp: 0,
            voters: vec!["0xdef0000000000000000000000000000000000002".to_string()],
            avatars: Vec::new(),
        }
    }

    #[test]
    fn test_poll_status_window() {
        let p = poll(1_000, 2_000);
        assert_eq!(p.status(999), PollStatus::Upcoming);
        assert_eq!(p.status(1_000), PollStatus::Open);
        assert_eq!(p.status(1_999), PollStatus::Open);
        assert_eq!(p.status(2_000), PollStatus::Ended);
    }

    #[test]
    fn test_address_checks_ignore_case() {
        let p = poll(0, 1);
        assert!(p.has_voted("0xDEF0000000000000000000000000000000000002"));
        assert!(p.is_director("0xABC0000000000000000000000000000000000001"));
        assert!(!p.has_voted("0xabc0000000000000000000000000000000000001"));
    }
}
