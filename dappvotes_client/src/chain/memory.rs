//! In-memory DappVotes ledger
//!
//! Applies the same rules as the deployed contract and reverts with the same
//! messages, so forms and the CLI can run without a node. Handles created with
//! [`MemoryPollContract::connect`] share one ledger and differ only in the
//! sending account.

use super::tokens::checksummed;
use super::{ChainError, PollContract, Result, TxReceipt};
use crate::format::now_millis;
use crate::models::{NumericLike, PollParams, RawContestant, RawPoll};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use log::debug;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct PollRecord {
    id: u64,
    image: String,
    title: String,
    description: String,
    votes: u64,
    contestants: u64,
    deleted: bool,
    director: Address,
    starts_at: u64,
    ends_at: u64,
    timestamp: u64,
    voters: Vec<Address>,
    avatars: Vec<String>,
}

#[derive(Debug, Clone)]
struct ContestantRecord {
    id: u64,
    image: String,
    name: String,
    voter: Address,
    votes: u64,
    voters: Vec<Address>,
}

#[derive(Debug, Default)]
struct Ledger {
    polls: BTreeMap<u64, PollRecord>,
    contestants: BTreeMap<u64, Vec<ContestantRecord>>,
    contested: HashSet<(u64, Address)>,
    voted: HashSet<(u64, Address)>,
    total_polls: u64,
    block_number: u64,
    clock_ms: Option<u64>,
}

impl Ledger {
    fn now(&self) -> u64 {
        self.clock_ms.unwrap_or_else(now_millis)
    }

    fn poll_mut(&mut self, poll_id: u64) -> Result<&mut PollRecord> {
        self.polls
            .get_mut(&poll_id)
            .ok_or_else(|| revert("Poll not found"))
    }

    fn poll(&self, poll_id: u64) -> Result<&PollRecord> {
        self.polls.get(&poll_id).ok_or_else(|| revert("Poll not found"))
    }

    /// Mine one block holding a single transaction
    fn include(&mut self, sender: Address, method: &str) -> TxReceipt {
        self.block_number += 1;
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(sender.as_bytes());
        preimage.extend_from_slice(&self.block_number.to_be_bytes());
        preimage.extend_from_slice(method.as_bytes());

        let tx_hash = format!("{:?}", H256::from(keccak256(preimage)));
        debug!("{} included in block {} as {}", method, self.block_number, tx_hash);
        TxReceipt {
            tx_hash,
            block_number: Some(self.block_number),
        }
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Reverted(reason.to_string())
}

fn validate_params(params: &PollParams) -> Result<()> {
    if params.image.is_empty() {
        return Err(revert("Image URL cannot be empty"));
    }
    if params.title.is_empty() {
        return Err(revert("Title cannot be empty"));
    }
    if params.description.is_empty() {
        return Err(revert("Description cannot be empty"));
    }
    if params.starts_at == 0 || params.ends_at <= params.starts_at {
        return Err(revert("End date must be greater than start date"));
    }
    Ok(())
}

/// In-memory stand-in for the deployed contract
#[derive(Clone)]
pub struct MemoryPollContract {
    ledger: Arc<Mutex<Ledger>>,
    sender: Option<Address>,
}

impl MemoryPollContract {
    pub fn new(sender: Address) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            sender: Some(sender),
        }
    }

    /// No wallet: reads work, writes fail
    pub fn disconnected() -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            sender: None,
        }
    }

    /// Another account on the same ledger
    pub fn connect(&self, sender: Address) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            sender: Some(sender),
        }
    }

    /// Pin the ledger clock, in milliseconds
    pub fn set_time(&self, now_ms: u64) {
        self.ledger.lock().clock_ms = Some(now_ms);
    }

    pub fn poll_count(&self) -> u64 {
        self.ledger.lock().total_polls
    }

    fn sender(&self) -> Result<Address> {
        self.sender.ok_or(ChainError::NoSigner)
    }

    fn create_poll_sync(&self, params: &PollParams) -> Result<TxReceipt> {
        let sender = self.sender()?;
        validate_params(params)?;

        let mut ledger = self.ledger.lock();
        ledger.total_polls += 1;
        let id = ledger.total_polls;
        let timestamp = ledger.now();
        ledger.polls.insert(
            id,
            PollRecord {
                id,
                image: params.image.clone(),
                title: params.title.clone(),
                description: params.description.clone(),
                votes: 0,
                contestants: 0,
                deleted: false,
                director: sender,
                starts_at: params.starts_at,
                ends_at: params.ends_at,
                timestamp,
                voters: Vec::new(),
                avatars: Vec::new(),
            },
        );
        Ok(ledger.include(sender, "createPoll"))
    }

    fn update_poll_sync(&self, poll_id: u64, params: &PollParams) -> Result<TxReceipt> {
        let sender = self.sender()?;
        validate_params(params)?;

        let mut ledger = self.ledger.lock();
        let poll = ledger.poll_mut(poll_id)?;
        if poll.deleted {
            return Err(revert("Poll not found"));
        }
        if poll.director != sender {
            return Err(revert("Unauthorized entity"));
        }
        if poll.votes > 0 {
            return Err(revert("Poll has votes already"));
        }

        poll.image = params.image.clone();
        poll.title = params.title.clone();
        poll.description = params.description.clone();
        poll.starts_at = params.starts_at;
        poll.ends_at = params.ends_at;
        Ok(ledger.include(sender, "updatePoll"))
    }

    fn delete_poll_sync(&self, poll_id: u64) -> Result<TxReceipt> {
        let sender = self.sender()?;

        let mut ledger = self.ledger.lock();
        let poll = ledger.poll_mut(poll_id)?;
        if poll.deleted {
            return Err(revert("Poll not found"));
        }
        if poll.director != sender {
            return Err(revert("Unauthorized entity"));
        }
        if poll.votes > 0 {
            return Err(revert("Poll has votes already"));
        }

        poll.deleted = true;
        Ok(ledger.include(sender, "deletePoll"))
    }

    fn contest_sync(&self, poll_id: u64, name: &str, image: &str) -> Result<TxReceipt> {
        let sender = self.sender()?;
        if name.is_empty() {
            return Err(revert("Name cannot be empty"));
        }
        if image.is_empty() {
            return Err(revert("Image URL cannot be empty"));
        }

        let mut ledger = self.ledger.lock();
        {
            let poll = ledger.poll(poll_id)?;
            if poll.deleted {
                return Err(revert("Poll not found"));
            }
            if poll.votes > 0 {
                return Err(revert("Poll has votes already"));
            }
        }
        if ledger.contested.contains(&(poll_id, sender)) {
            return Err(revert("Already contested"));
        }

        let poll = ledger.poll_mut(poll_id)?;
        poll.contestants += 1;
        let id = poll.contestants;

        ledger.contestants.entry(poll_id).or_default().push(ContestantRecord {
            id,
            image: image.to_string(),
            name: name.to_string(),
            voter: sender,
            votes: 0,
            voters: Vec::new(),
        });
        ledger.contested.insert((poll_id, sender));
        Ok(ledger.include(sender, "contest"))
    }

    fn vote_sync(&self, poll_id: u64, contestant_id: u64) -> Result<TxReceipt> {
        let sender = self.sender()?;

        let mut ledger = self.ledger.lock();
        let now = ledger.now();
        {
            let poll = ledger.poll(poll_id)?;
            if poll.deleted {
                return Err(revert("Polling not available"));
            }
            if poll.contestants < 2 {
                return Err(revert("Not enough contestants"));
            }
            if now < poll.starts_at || now >= poll.ends_at {
                return Err(revert("Voting must be in session"));
            }
        }
        if ledger.voted.contains(&(poll_id, sender)) {
            return Err(revert("Already voted"));
        }

        let contestant = ledger
            .contestants
            .get_mut(&poll_id)
            .and_then(|list| list.iter_mut().find(|c| c.id == contestant_id))
            .ok_or_else(|| revert("Contestant not found"))?;
        contestant.votes += 1;
        contestant.voters.push(sender);
        let avatar = contestant.image.clone();

        let poll = ledger.poll_mut(poll_id)?;
        poll.votes += 1;
        poll.voters.push(sender);
        poll.avatars.push(avatar);

        ledger.voted.insert((poll_id, sender));
        Ok(ledger.include(sender, "vote"))
    }
}

fn raw_poll(poll: &PollRecord) -> RawPoll {
    RawPoll {
        id: NumericLike::Big(U256::from(poll.id)),
        image: poll.image.clone(),
        title: poll.title.clone(),
        description: poll.description.clone(),
        votes: NumericLike::Big(U256::from(poll.votes)),
        contestants: NumericLike::Big(U256::from(poll.contestants)),
        deleted: poll.deleted,
        director: checksummed(&poll.director),
        starts_at: NumericLike::Big(U256::from(poll.starts_at)),
        ends_at: NumericLike::Big(U256::from(poll.ends_at)),
        timestamp: NumericLike::Big(U256::from(poll.timestamp)),
        voters: poll.voters.iter().map(checksummed).collect(),
        avatars: poll.avatars.clone(),
    }
}

fn raw_contestant(contestant: &ContestantRecord) -> RawContestant {
    RawContestant {
        id: NumericLike::Big(U256::from(contestant.id)),
        image: contestant.image.clone(),
        name: contestant.name.clone(),
        voter: checksummed(&contestant.voter),
        votes: NumericLike::Big(U256::from(contestant.votes)),
        voters: contestant.voters.iter().map(checksummed).collect(),
    }
}

#[async_trait]
impl PollContract for MemoryPollContract {
    fn account(&self) -> Option<String> {
        self.sender.as_ref().map(checksummed)
    }

    async fn create_poll(&self, params: &PollParams) -> Result<TxReceipt> {
        self.create_poll_sync(params)
    }

    async fn update_poll(&self, poll_id: u64, params: &PollParams) -> Result<TxReceipt> {
        self.update_poll_sync(poll_id, params)
    }

    async fn delete_poll(&self, poll_id: u64) -> Result<TxReceipt> {
        self.delete_poll_sync(poll_id)
    }

    async fn contest_poll(&self, poll_id: u64, name: &str, image: &str) -> Result<TxReceipt> {
        self.contest_sync(poll_id, name, image)
    }

    async fn vote(&self, poll_id: u64, contestant_id: u64) -> Result<TxReceipt> {
        self.vote_sync(poll_id, contestant_id)
    }

    async fn get_poll(&self, poll_id: u64) -> Result<RawPoll> {
        let ledger = self.ledger.lock();
        ledger.poll(poll_id).map(raw_poll)
    }

    async fn get_polls(&self) -> Result<Vec<RawPoll>> {
        let ledger = self.ledger.lock();
        Ok(ledger
            .polls
            .values()
            .filter(|p| !p.deleted)
            .map(raw_poll)
            .collect())
    }

    async fn get_contestants(&self, poll_id: u64) -> Result<Vec<RawContestant>> {
        let ledger = self.ledger.lock();
        Ok(ledger
            .contestants
            .get(&poll_id)
            .map(|list| list.iter().map(raw_contestant).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn params() -> PollParams {
        PollParams {
            image: "https://gw.example/ipfs/QmBanner".to_string(),
            title: "Best language".to_string(),
            description: "Vote for the best systems language".to_string(),
            starts_at: 1_000,
            ends_at: 5_000,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let contract = MemoryPollContract::new(account(0xAB));
        contract.set_time(500);

        let receipt = contract.create_poll(&params()).await.unwrap();
        assert!(receipt.tx_hash.starts_with("0x"));
        assert_eq!(receipt.tx_hash.len(), 66);
        assert_eq!(receipt.block_number, Some(1));

        let poll = contract.get_poll(1).await.unwrap();
        assert_eq!(poll.title, "Best language");
        assert_eq!(poll.timestamp, NumericLike::Big(U256::from(500)));
        assert_eq!(poll.director, checksummed(&account(0xAB)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_window() {
        let contract = MemoryPollContract::new(account(1));
        let mut p = params();
        p.ends_at = p.starts_at;
        assert_eq!(
            contract.create_poll(&p).await.unwrap_err(),
            ChainError::Reverted("End date must be greater than start date".to_string())
        );
        assert_eq!(contract.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_cannot_write() {
        let contract = MemoryPollContract::disconnected();
        assert_eq!(contract.account(), None);
        assert_eq!(
            contract.create_poll(&params()).await.unwrap_err(),
            ChainError::NoSigner
        );
    }

    #[tokio::test]
    async fn test_only_director_updates_or_deletes() {
        let director = MemoryPollContract::new(account(1));
        let stranger = director.connect(account(2));
        director.create_poll(&params()).await.unwrap();

        let mut p = params();
        p.title = "Renamed".to_string();
        assert_eq!(
            stranger.update_poll(1, &p).await.unwrap_err(),
            ChainError::Reverted("Unauthorized entity".to_string())
        );
        director.update_poll(1, &p).await.unwrap();
        assert_eq!(director.get_poll(1).await.unwrap().title, "Renamed");

        assert!(stranger.delete_poll(1).await.is_err());
        director.delete_poll(1).await.unwrap();
        assert!(director.get_polls().await.unwrap().is_empty());
        assert!(director.get_poll(1).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_contest_once_per_account() {
        let alice = MemoryPollContract::new(account(1));
        alice.create_poll(&params()).await.unwrap();

        alice.contest_poll(1, "Rust", "https://gw.example/ipfs/QmRust").await.unwrap();
        assert_eq!(
            alice
                .contest_poll(1, "Rust again", "https://gw.example/ipfs/QmRust")
                .await
                .unwrap_err(),
            ChainError::Reverted("Already contested".to_string())
        );
        assert!(alice.contest_poll(99, "Ghost", "img").await.is_err());
        assert!(alice.contest_poll(1, "", "img").await.is_err());
    }

    #[tokio::test]
    async fn test_vote_rules() {
        let alice = MemoryPollContract::new(account(1));
        let bob = alice.connect(account(2));
        let carol = alice.connect(account(3));
        alice.set_time(500);
        alice.create_poll(&params()).await.unwrap();
        alice.contest_poll(1, "Rust", "https://gw.example/ipfs/QmRust").await.unwrap();

        alice.set_time(2_000);
        assert_eq!(
            carol.vote(1, 1).await.unwrap_err(),
            ChainError::Reverted("Not enough contestants".to_string())
        );

        alice.set_time(500);
        bob.contest_poll(1, "Zig", "https://gw.example/ipfs/QmZig").await.unwrap();
        assert_eq!(
            carol.vote(1, 2).await.unwrap_err(),
            ChainError::Reverted("Voting must be in session".to_string())
        );

        alice.set_time(2_000);
        carol.vote(1, 2).await.unwrap();
        assert_eq!(
            carol.vote(1, 1).await.unwrap_err(),
            ChainError::Reverted("Already voted".to_string())
        );

        let poll = alice.get_poll(1).await.unwrap();
        assert_eq!(poll.votes, NumericLike::Big(U256::from(1)));
        assert_eq!(poll.voters, vec![checksummed(&account(3))]);
        assert_eq!(poll.avatars, vec!["https://gw.example/ipfs/QmZig".to_string()]);

        let contestants = alice.get_contestants(1).await.unwrap();
        assert_eq!(contestants[1].votes, NumericLike::Big(U256::from(1)));

        // contesting closes once voting has started
        let dave = alice.connect(account(4));
        assert_eq!(
            dave.contest_poll(1, "Go", "img").await.unwrap_err(),
            ChainError::Reverted("Poll has votes already".to_string())
        );
    }

    fn reverted(reason: &str) -> ChainError {
        ChainError::Reverted(reason.to_string())
    }

    async fn poll_with_two_contestants() -> (MemoryPollContract, MemoryPollContract) {
        let director = MemoryPollContract::new(account(1));
        let rival = director.connect(account(2));
        director.set_time(500);
        director.create_poll(&params()).await.unwrap();
        director.contest_poll(1, "Rust", "https://gw.example/ipfs/QmRust").await.unwrap();
        rival.contest_poll(1, "Zig", "https://gw.example/ipfs/QmZig").await.unwrap();
        (director, rival)
    }

    #[tokio::test]
    async fn test_create_requires_text_fields() {
        let contract = MemoryPollContract::new(account(1));
        let cases: [(fn(&mut PollParams), &str); 3] = [
            (|p| p.image.clear(), "Image URL cannot be empty"),
            (|p| p.title.clear(), "Title cannot be empty"),
            (|p| p.description.clear(), "Description cannot be empty"),
        ];
        for (blank, reason) in cases {
            let mut p = params();
            blank(&mut p);
            assert_eq!(contract.create_poll(&p).await.unwrap_err(), reverted(reason));
        }
        assert_eq!(contract.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_voted_poll_is_frozen() {
        let (director, rival) = poll_with_two_contestants().await;
        director.set_time(2_000);
        rival.vote(1, 1).await.unwrap();

        let mut p = params();
        p.title = "Too late".to_string();
        assert_eq!(
            director.update_poll(1, &p).await.unwrap_err(),
            reverted("Poll has votes already")
        );
        assert_eq!(
            director.delete_poll(1).await.unwrap_err(),
            reverted("Poll has votes already")
        );
        assert_eq!(director.get_polls().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_vote_on_deleted_poll() {
        let (director, rival) = poll_with_two_contestants().await;
        director.delete_poll(1).await.unwrap();

        director.set_time(2_000);
        assert_eq!(
            rival.vote(1, 1).await.unwrap_err(),
            reverted("Polling not available")
        );
    }

    #[tokio::test]
    async fn test_vote_for_unknown_contestant() {
        let (director, rival) = poll_with_two_contestants().await;
        director.set_time(2_000);

        assert_eq!(
            rival.vote(1, 7).await.unwrap_err(),
            reverted("Contestant not found")
        );
        assert_eq!(director.get_poll(1).await.unwrap().votes, NumericLike::Big(U256::zero()));
        rival.vote(1, 2).await.unwrap();
    }
}
