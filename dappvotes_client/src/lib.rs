//! DappVotes client
//!
//! Talks to the DappVotes polling contract, pins poll and contestant images
//! on IPFS through Pinata, and normalizes contract records into the shapes
//! the rest of an application works with.

pub mod chain;
pub mod config;
pub mod format;
pub mod forms;
pub mod ipfs;
pub mod models;
pub mod normalize;
pub mod notify;

pub use chain::{ChainError, EthersPollContract, MemoryPollContract, PollContract, TxReceipt};
pub use config::{ChainConfig, ClientConfig, ConfigError, PinataConfig};
pub use forms::{ContestPollForm, CreatePollForm, FormPhase, SubmitOutcome, Wallet};
pub use ipfs::{FileUpload, ImageUploader, PinataClient, UploadOutcome};
pub use models::{Contestant, NumericLike, Poll, PollParams, PollStatus, RawContestant, RawPoll};
pub use normalize::{structure_contestants, structure_polls, NormalizeError};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier};
