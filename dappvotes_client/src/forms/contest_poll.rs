//! Form for entering a poll as a contestant

use super::{
    expect_phase, upload_into, BusyPhase, FormError, FormPhase, SubmitOutcome, Wallet,
    MSG_CONNECT_WALLET,
};
use crate::chain::PollContract;
use crate::ipfs::{FileUpload, ImageUploader, UploadOutcome};
use crate::notify::{track_transaction, Notifier, TxMessages};
use std::str::FromStr;
use std::sync::Arc;

pub const MSG_POLL_CONTESTED: &str = "Poll contested successfully 👌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestantField {
    Name,
    Image,
}

impl FromStr for ContestantField {
    type Err = FormError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "name" => Ok(ContestantField::Name),
            "image" => Ok(ContestantField::Image),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContestantDraft {
    pub name: String,
    pub image: String,
}

impl ContestantDraft {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.image.is_empty()
    }
}

pub struct ContestPollForm {
    poll_id: u64,
    draft: ContestantDraft,
    phase: FormPhase,
    notifier: Arc<dyn Notifier>,
}

impl ContestPollForm {
    pub fn new(poll_id: u64, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            poll_id,
            draft: ContestantDraft::default(),
            phase: FormPhase::Idle,
            notifier,
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &ContestantDraft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FormPhase::UploadingImage
    }

    pub fn open(&mut self) -> Result<(), FormError> {
        expect_phase(
            self.phase,
            &[FormPhase::Idle, FormPhase::Closed, FormPhase::Editing],
            "open the form",
        )?;
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        field: ContestantField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        expect_phase(self.phase, &[FormPhase::Editing], "edit a field")?;
        let value = value.into();
        match field {
            ContestantField::Name => self.draft.name = value,
            ContestantField::Image => self.draft.image = value,
        }
        Ok(())
    }

    pub async fn upload_image<U: ImageUploader + ?Sized>(
        &mut self,
        uploader: &U,
        file: FileUpload,
    ) -> Result<UploadOutcome, FormError> {
        upload_into(
            &mut self.phase,
            &mut self.draft.image,
            uploader,
            file,
            self.notifier.as_ref(),
        )
        .await
    }

    pub async fn submit<C: PollContract + ?Sized>(
        &mut self,
        contract: &C,
        wallet: &Wallet,
    ) -> Result<SubmitOutcome, FormError> {
        expect_phase(self.phase, &[FormPhase::Editing], "submit")?;

        if !self.draft.is_complete() {
            return Ok(SubmitOutcome::Incomplete);
        }
        if !wallet.is_connected() {
            self.notifier.warning(MSG_CONNECT_WALLET);
            return Ok(SubmitOutcome::WalletDisconnected);
        }

        let messages = TxMessages::new(MSG_POLL_CONTESTED);
        let result = {
            let _busy = BusyPhase::enter(&mut self.phase, FormPhase::Submitting);
            track_transaction(
                self.notifier.as_ref(),
                &messages,
                contract.contest_poll(self.poll_id, &self.draft.name, &self.draft.image),
            )
            .await
        };

        match result {
            Ok(receipt) => {
                self.draft = ContestantDraft::default();
                self.phase = FormPhase::Closed;
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(e) => {
                self.phase = FormPhase::Editing;
                Ok(SubmitOutcome::Failed(e.to_string()))
            }
        }
    }

    pub fn close(&mut self) {
        self.draft = ContestantDraft::default();
        self.phase = FormPhase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryPollContract;
    use crate::models::PollParams;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use ethers::types::Address;

    async fn contract_with_poll() -> MemoryPollContract {
        let contract = MemoryPollContract::new(Address::from([1u8; 20]));
        contract
            .create_poll(&PollParams {
                image: "https://gw.example/ipfs/QmPoll".to_string(),
                title: "Mascot".to_string(),
                description: "Pick the team mascot".to_string(),
                starts_at: 1_000,
                ends_at: 2_000,
            })
            .await
            .unwrap();
        contract
    }

    fn filled(poll_id: u64, notifier: Arc<RecordingNotifier>) -> ContestPollForm {
        let mut form = ContestPollForm::new(poll_id, notifier);
        form.open().unwrap();
        form.set_field(ContestantField::Name, "Otter").unwrap();
        form.set_field(ContestantField::Image, "https://gw.example/ipfs/QmOtter")
            .unwrap();
        form
    }

    #[tokio::test]
    async fn test_incomplete_draft_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::new());
        let contract = contract_with_poll().await;
        let mut form = ContestPollForm::new(1, notifier.clone());
        form.open().unwrap();
        form.set_field(ContestantField::Name, "Otter").unwrap();

        let outcome = form
            .submit(&contract, &Wallet::from_contract(&contract))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Incomplete);
        assert!(notifier.notices().is_empty());
        assert!(contract.get_contestants(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_wallet_warns() {
        let notifier = Arc::new(RecordingNotifier::new());
        let contract = contract_with_poll().await;
        let mut form = filled(1, notifier.clone());

        let outcome = form.submit(&contract, &Wallet::disconnected()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::WalletDisconnected);
        assert_eq!(form.phase(), FormPhase::Editing);

        let last = notifier.last().unwrap();
        assert_eq!(last.level, NoticeLevel::Warning);
        assert_eq!(last.message, MSG_CONNECT_WALLET);
    }

    #[tokio::test]
    async fn test_second_entry_from_same_account_fails() {
        let notifier = Arc::new(RecordingNotifier::new());
        let contract = contract_with_poll().await;
        let wallet = Wallet::from_contract(&contract);

        let mut first = filled(1, notifier.clone());
        assert!(first.submit(&contract, &wallet).await.unwrap().is_submitted());
        assert_eq!(first.phase(), FormPhase::Closed);

        let mut second = filled(1, notifier.clone());
        let outcome = second.submit(&contract, &wallet).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Failed("Transaction reverted: Already contested".to_string())
        );
        assert_eq!(second.phase(), FormPhase::Editing);
        assert_eq!(second.draft().name, "Otter");
        assert_eq!(notifier.last().unwrap().message, "Encountered error 🤯");
    }
}
