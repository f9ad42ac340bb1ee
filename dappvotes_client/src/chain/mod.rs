//! DappVotes contract access
//!
//! Writes resolve once the transaction is included and reject with a
//! [`ChainError`] otherwise. Reads return raw records for the normalizer.

pub mod ethers_contract;
pub mod memory;
pub mod tokens;

pub use ethers_contract::EthersPollContract;
pub use memory::MemoryPollContract;

use crate::models::{PollParams, RawContestant, RawPoll};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inclusion proof handed back to the caller of a write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    /// The contract rejected the call with this reason
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Transaction dropped: {0}")]
    Dropped(String),

    #[error("Unexpected contract data: {0}")]
    Decode(String),

    #[error("No wallet connected")]
    NoSigner,
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// The DappVotes contract as the rest of the client sees it
#[async_trait]
pub trait PollContract: Send + Sync {
    /// Connected wallet address, if any
    fn account(&self) -> Option<String>;

    async fn create_poll(&self, params: &PollParams) -> Result<TxReceipt>;

    async fn update_poll(&self, poll_id: u64, params: &PollParams) -> Result<TxReceipt>;

    async fn delete_poll(&self, poll_id: u64) -> Result<TxReceipt>;

    /// Register a contestant on a poll
    async fn contest_poll(&self, poll_id: u64, name: &str, image: &str) -> Result<TxReceipt>;

    async fn vote(&self, poll_id: u64, contestant_id: u64) -> Result<TxReceipt>;

    async fn get_poll(&self, poll_id: u64) -> Result<RawPoll>;

    /// Every poll that has not been deleted
    async fn get_polls(&self) -> Result<Vec<RawPoll>>;

    async fn get_contestants(&self, poll_id: u64) -> Result<Vec<RawContestant>>;
}
