//! Form for creating a poll

use super::{
    expect_phase, upload_into, BusyPhase, FormError, FormPhase, SubmitOutcome, Wallet,
    MSG_CONNECT_WALLET,
};
use crate::chain::PollContract;
use crate::format::parse_datetime_local;
use crate::ipfs::{FileUpload, ImageUploader, UploadOutcome};
use crate::models::PollParams;
use crate::notify::{track_transaction, Notifier, TxMessages};
use std::str::FromStr;
use std::sync::Arc;

pub const MSG_POLL_CREATED: &str = "Poll created successfully 👌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollField {
    Image,
    Title,
    Description,
    StartsAt,
    EndsAt,
}

impl FromStr for PollField {
    type Err = FormError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "image" => Ok(PollField::Image),
            "title" => Ok(PollField::Title),
            "description" => Ok(PollField::Description),
            "startsAt" => Ok(PollField::StartsAt),
            "endsAt" => Ok(PollField::EndsAt),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

/// Raw input; dates are `YYYY-MM-DDTHH:MM` local time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollDraft {
    pub image: String,
    pub title: String,
    pub description: String,
    pub starts_at: String,
    pub ends_at: String,
}

impl PollDraft {
    pub fn is_complete(&self) -> bool {
        ![
            &self.image,
            &self.title,
            &self.description,
            &self.starts_at,
            &self.ends_at,
        ]
        .iter()
        .any(|v| v.is_empty())
    }

    fn field_mut(&mut self, field: PollField) -> &mut String {
        match field {
            PollField::Image => &mut self.image,
            PollField::Title => &mut self.title,
            PollField::Description => &mut self.description,
            PollField::StartsAt => &mut self.starts_at,
            PollField::EndsAt => &mut self.ends_at,
        }
    }

    /// Convert to contract arguments
    pub fn to_params(&self) -> Result<PollParams, crate::format::FormatError> {
        Ok(PollParams {
            image: self.image.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            starts_at: parse_datetime_local(&self.starts_at)?,
            ends_at: parse_datetime_local(&self.ends_at)?,
        })
    }
}

pub struct CreatePollForm {
    draft: PollDraft,
    phase: FormPhase,
    notifier: Arc<dyn Notifier>,
}

impl CreatePollForm {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            draft: PollDraft::default(),
            phase: FormPhase::Idle,
            notifier,
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &PollDraft {
        &self.draft
    }

    /// True while an image upload is in flight
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
        field: PollField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        expect_phase(self.phase, &[FormPhase::Editing], "edit a field")?;
        *self.draft.field_mut(field) = value.into();
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

        let params = match self.draft.to_params() {
            Ok(params) => params,
            Err(e) => {
                let reason = e.to_string();
                self.notifier.error(&reason);
                return Ok(SubmitOutcome::Failed(reason));
            }
        };

        let messages = TxMessages::new(MSG_POLL_CREATED);
        let result = {
            let _busy = BusyPhase::enter(&mut self.phase, FormPhase::Submitting);
            track_transaction(
                self.notifier.as_ref(),
                &messages,
                contract.create_poll(&params),
            )
            .await
        };

        match result {
            Ok(receipt) => {
                self.draft = PollDraft::default();
                self.phase = FormPhase::Closed;
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(e) => {
                self.phase = FormPhase::Editing;
                Ok(SubmitOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Discard input and close
    pub fn close(&mut self) {
        self.draft = PollDraft::default();
        self.phase = FormPhase::Closed;
    }
}
