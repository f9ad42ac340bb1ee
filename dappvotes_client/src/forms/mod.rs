//! Create-poll and contest-poll forms as explicit state machines
//!
//! ```text
//! Idle -> Editing -> (UploadingImage <-> Editing) -> Submitting -> Closed
//!                                                        \-> Editing (error notice)
//! ```
//!
//! Uploads and submissions take `&mut self`, so a form can never run two of
//! them at once. Dropping one mid-flight leaves the form in `Editing`.

pub mod contest_poll;
pub mod create_poll;

pub use contest_poll::{ContestPollForm, ContestantDraft, ContestantField};
pub use create_poll::{CreatePollForm, PollDraft, PollField};

use crate::chain::{PollContract, TxReceipt};
use crate::ipfs::{FileUpload, ImageUploader, UploadOutcome};
use crate::notify::Notifier;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MSG_IMAGE_UPLOADED: &str = "Image uploaded successfully!";
pub const MSG_IMAGE_FAILED: &str = "Failed to upload image";
pub const MSG_CONNECT_WALLET: &str = "Connect wallet first!";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Editing,
    UploadingImage,
    Submitting,
    Closed,
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormPhase::Idle => "idle",
            FormPhase::Editing => "editing",
            FormPhase::UploadingImage => "uploading image",
            FormPhase::Submitting => "submitting",
            FormPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Cannot {operation} while the form is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: FormPhase,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// What a submit attempt came to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A required field is empty; nothing was sent
    Incomplete,
    /// No wallet; a warning was shown
    WalletDisconnected,
    /// Included on-chain; the form is cleared and closed
    Submitted(TxReceipt),
    /// Rejected or invalid; the form stays open with its input
    Failed(String),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// The wallet the user has connected, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    address: Option<String>,
}

impl Wallet {
    pub fn connected(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            address: (!address.is_empty()).then_some(address),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Whatever account the contract handle signs with
    pub fn from_contract<C: PollContract + ?Sized>(contract: &C) -> Self {
        Self {
            address: contract.account(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

fn expect_phase(
    phase: FormPhase,
    allowed: &[FormPhase],
    operation: &'static str,
) -> Result<(), FormError> {
    if allowed.contains(&phase) {
        Ok(())
    } else {
        Err(FormError::InvalidPhase { operation, phase })
    }
}

/// Holds a busy phase for the duration of an await; drop puts the form back
/// in `Editing`, including when the owning future is cancelled
struct BusyPhase<'a> {
    phase: &'a mut FormPhase,
}

impl<'a> BusyPhase<'a> {
    fn enter(phase: &'a mut FormPhase, busy: FormPhase) -> Self {
        *phase = busy;
        Self { phase }
    }
}

impl Drop for BusyPhase<'_> {
    fn drop(&mut self) {
        *self.phase = FormPhase::Editing;
    }
}

/// Upload flow shared by both forms; `image` only changes on success
async fn upload_into<U: ImageUploader + ?Sized>(
    phase: &mut FormPhase,
    image: &mut String,
    uploader: &U,
    file: FileUpload,
    notifier: &dyn Notifier,
) -> Result<UploadOutcome, FormError> {
    expect_phase(*phase, &[FormPhase::Editing], "upload an image")?;

    let outcome = {
        let _busy = BusyPhase::enter(phase, FormPhase::UploadingImage);
        uploader.upload_file(file).await
    };

    match outcome.pinata_url() {
        Some(url) => {
            *image = url.to_string();
            notifier.success(MSG_IMAGE_UPLOADED);
        }
        None => notifier.error(MSG_IMAGE_FAILED),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_connection() {
        assert!(!Wallet::disconnected().is_connected());
        assert!(!Wallet::connected("").is_connected());

        let wallet = Wallet::connected("0xabc");
        assert!(wallet.is_connected());
        assert_eq!(wallet.address(), Some("0xabc"));
    }

    #[test]
    fn test_invalid_phase_message() {
        let err = expect_phase(FormPhase::Closed, &[FormPhase::Editing], "submit").unwrap_err();
        assert_eq!(err.to_string(), "Cannot submit while the form is closed");
    }

    #[test]
    fn test_busy_phase_resets_on_drop() {
        let mut phase = FormPhase::Editing;
        {
            let busy = BusyPhase::enter(&mut phase, FormPhase::Submitting);
            assert_eq!(*busy.phase, FormPhase::Submitting);
        }
        assert_eq!(phase, FormPhase::Editing);
    }
}
