//! DappVotes contract over JSON-RPC using ethers-rs
//!
//! Reads go through any middleware. Writes need a signer: connect with a
//! private key to get a `SignerMiddleware` that signs locally, otherwise the
//! node is asked to sign with its own accounts.

use super::tokens::{contestants_from_token, poll_from_token, polls_from_token};
use super::{ChainError, PollContract, Result, TxReceipt};
use crate::config::ChainConfig;
use crate::models::{PollParams, RawContestant, RawPoll};
use async_trait::async_trait;
use ethers::abi::{parse_abi, Abi, Token, Tokenize};
use ethers::contract::Contract;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256, U64};
use log::{debug, info};
use std::convert::TryFrom;
use std::sync::Arc;

/// Human-readable ABI of the DappVotes contract
pub const DAPP_VOTES_ABI: &[&str] = &[
    "struct PollStruct { uint256 id; string image; string title; string description; uint256 votes; uint256 contestants; bool deleted; address director; uint256 startsAt; uint256 endsAt; uint256 timestamp; address[] voters; string[] avatars; }",
    "struct ContestantStruct { uint256 id; string image; string name; address voter; uint256 votes; address[] voters; }",
    "function createPoll(string image, string title, string description, uint256 startsAt, uint256 endsAt)",
    "function updatePoll(uint256 id, string image, string title, string description, uint256 startsAt, uint256 endsAt)",
    "function deletePoll(uint256 id)",
    "function contest(uint256 id, string name, string image)",
    "function vote(uint256 id, uint256 cid)",
    "function getPoll(uint256 id) view returns (PollStruct)",
    "function getPolls() view returns (PollStruct[])",
    "function getContestants(uint256 id) view returns (ContestantStruct[])",
];

pub fn dapp_votes_abi() -> Result<Abi> {
    parse_abi(DAPP_VOTES_ABI)
        .map_err(|e| ChainError::Decode(format!("Invalid contract ABI: {}", e)))
}

/// Signing client used for writes
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// DappVotes contract handle
pub struct EthersPollContract<M> {
    contract: Contract<M>,
    account: Option<Address>,
    confirmations: usize,
}

impl<M: Middleware + 'static> EthersPollContract<M> {
    pub fn new(
        client: Arc<M>,
        contract_address: Address,
        account: Option<Address>,
        confirmations: usize,
    ) -> Result<Self> {
        let contract = Contract::new(contract_address, dapp_votes_abi()?, client);
        Ok(Self {
            contract,
            account,
            confirmations: confirmations.max(1),
        })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    async fn read(&self, method: &str, args: impl Tokenize) -> Result<Token> {
        debug!("Calling {} on {:?}", method, self.address());
        self.contract
            .method::<_, Token>(method, args)
            .map_err(|e| ChainError::Contract(format!("{}: {}", method, e)))?
            .call()
            .await
            .map_err(|e| ChainError::Contract(format!("{}: {}", method, e)))
    }

    /// Send a write and wait for `confirmations` blocks
    async fn send(&self, method: &str, args: impl Tokenize) -> Result<TxReceipt> {
        let call = self
            .contract
            .method::<_, ()>(method, args)
            .map_err(|e| ChainError::Contract(format!("{}: {}", method, e)))?;

        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Contract(format!("{}: {}", method, e)))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        info!("{} transaction sent: {}", method, tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| ChainError::Provider(format!("Failed to get confirmation: {}", e)))?;

        match receipt {
            Some(receipt) if receipt.status == Some(U64::from(1)) => {
                let block_number = receipt.block_number.map(|b| b.as_u64());
                info!("{} included in block {:?}", tx_hash, block_number);
                Ok(TxReceipt {
                    tx_hash,
                    block_number,
                })
            }
            Some(_) => Err(ChainError::Reverted(format!(
                "{} transaction {} failed on-chain",
                method, tx_hash
            ))),
            None => Err(ChainError::Dropped(tx_hash)),
        }
    }
}

impl EthersPollContract<Provider<Http>> {
    /// Read-only handle; writes are signed by the node, if at all
    pub fn connect_readonly(rpc_url: &str, contract_address: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Provider(format!("Failed to create HTTP provider: {}", e)))?;
        let address = parse_address(contract_address)?;

        Self::new(Arc::new(provider), address, None, 1)
    }
}

impl EthersPollContract<SignerClient> {
    /// Signing handle; the chain id is fetched from the node
    pub async fn connect_with_wallet(
        rpc_url: &str,
        contract_address: &str,
        private_key: &str,
        confirmations: usize,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Provider(format!("Failed to create HTTP provider: {}", e)))?;
        let address = parse_address(contract_address)?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Provider(format!("Failed to get chain ID: {}", e)))?
            .as_u64();

        let wallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?
            .with_chain_id(chain_id);
        let account = wallet.address();

        info!("Connected to chain {} as {:?}", chain_id, account);
        let client = SignerMiddleware::new(provider, wallet);
        Self::new(Arc::new(client), address, Some(account), confirmations)
    }
}

/// Signing handle when a private key is configured, read-only otherwise
pub async fn connect(config: &ChainConfig) -> Result<Box<dyn PollContract>> {
    match &config.private_key {
        Some(key) => Ok(Box::new(
            EthersPollContract::connect_with_wallet(
                &config.rpc_url,
                &config.contract_address,
                key,
                config.confirmations,
            )
            .await?,
        )),
        None => Ok(Box::new(EthersPollContract::connect_readonly(
            &config.rpc_url,
            &config.contract_address,
        )?)),
    }
}

fn parse_address(raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ChainError::InvalidAddress(format!("{}: {}", raw, e)))
}

#[async_trait]
impl<M: Middleware + 'static> PollContract for EthersPollContract<M> {
    fn account(&self) -> Option<String> {
        self.account.as_ref().map(super::tokens::checksummed)
    }

    async fn create_poll(&self, params: &PollParams) -> Result<TxReceipt> {
        self.send(
            "createPoll",
            (
                params.image.clone(),
                params.title.clone(),
                params.description.clone(),
                U256::from(params.starts_at),
                U256::from(params.ends_at),
            ),
        )
        .await
    }

    async fn update_poll(&self, poll_id: u64, params: &PollParams) -> Result<TxReceipt> {
        self.send(
            "updatePoll",
            (
                U256::from(poll_id),
                params.image.clone(),
                params.title.clone(),
                params.description.clone(),
                U256::from(params.starts_at),
                U256::from(params.ends_at),
            ),
        )
        .await
    }

    async fn delete_poll(&self, poll_id: u64) -> Result<TxReceipt> {
        self.send("deletePoll", U256::from(poll_id)).await
    }

    async fn contest_poll(&self, poll_id: u64, name: &str, image: &str) -> Result<TxReceipt> {
        self.send(
            "contest",
            (U256::from(poll_id), name.to_string(), image.to_string()),
        )
        .await
    }

    async fn vote(&self, poll_id: u64, contestant_id: u64) -> Result<TxReceipt> {
        self.send("vote", (U256::from(poll_id), U256::from(contestant_id)))
            .await
    }

    async fn get_poll(&self, poll_id: u64) -> Result<RawPoll> {
        poll_from_token(self.read("getPoll", U256::from(poll_id)).await?)
    }

    async fn get_polls(&self) -> Result<Vec<RawPoll>> {
        polls_from_token(self.read("getPolls", ()).await?)
    }

    async fn get_contestants(&self, poll_id: u64) -> Result<Vec<RawContestant>> {
        contestants_from_token(self.read("getContestants", U256::from(poll_id)).await?)
    }
}
