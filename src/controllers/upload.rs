use crate::api::ApiClient;
use crate::forms::UploadDraft;
use crate::prompt::Prompt;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Rejected locally, nothing was sent.
    Invalid(String),
    Uploaded,
    Failed(String),
}

/// The "create meme" form: a draft, an inline error and a busy flag.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub draft: UploadDraft,
    error: Option<String>,
    busy: bool,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validate and post the draft. On success the draft is reset and
    /// `on_success` runs (parents use it to close the form and refresh their
    /// list). On failure the draft is kept for correction.
    pub async fn submit<F>(
        &mut self,
        client: &ApiClient,
        session: &SessionStore,
        prompt: &dyn Prompt,
        on_success: F,
    ) -> SubmitOutcome
    where
        F: FnOnce(),
    {
        self.error = None;

        let meme = match self.draft.validate(session.is_authenticated()) {
            Ok(meme) => meme,
            Err(e) => {
                let message = e.to_string();
                self.error = Some(message.clone());
                return SubmitOutcome::Invalid(message);
            }
        };

        self.busy = true;
        let result = client.create_meme(meme).await;
        self.busy = false;

        match result {
            Ok(()) => {
                self.draft = UploadDraft::new();
                on_success();
                prompt.alert("Meme uploaded successfully!");
                SubmitOutcome::Uploaded
            }
            Err(e) => {
                tracing::error!("Upload error: {}", e);
                let message = e.user_message("Failed to upload meme");
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}
