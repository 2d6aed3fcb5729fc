use crate::api::ApiClient;
use crate::controllers::feed::FeedStatus;
use crate::forms::EditDraft;
use crate::models::Meme;
use crate::prompt::Prompt;

/// The viewer's own uploads, the only place edit and delete are offered.
/// Every mutation is followed by a full re-fetch of the list.
pub struct MyMemesController {
    client: ApiClient,
    memes: Vec<Meme>,
    status: FeedStatus,
    editing: Option<EditDraft>,
}

impl MyMemesController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            memes: Vec::new(),
            status: FeedStatus::Idle,
            editing: None,
        }
    }

    pub fn memes(&self) -> &[Meme] {
        &self.memes
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn shows_empty_state(&self) -> bool {
        self.status == FeedStatus::Loaded && self.memes.is_empty()
    }

    pub fn editing(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut EditDraft> {
        self.editing.as_mut()
    }

    pub async fn refresh(&mut self) {
        self.status = FeedStatus::Loading;
        match self.client.my_memes().await {
            Ok(memes) => {
                self.memes = memes;
                self.status = FeedStatus::Loaded;
            }
            Err(e) => {
                tracing::error!("Error fetching my memes: {}", e);
                self.status = FeedStatus::Failed(e.user_message("Failed to fetch your memes"));
            }
        }
    }

    /// Open the edit form for a listed meme. Returns `false` if it is not in
    /// the current list.
    pub fn begin_edit(&mut self, id: i64) -> bool {
        match self.memes.iter().find(|m| m.id == id) {
            Some(meme) => {
                self.editing = Some(EditDraft::from_meme(meme));
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub async fn save_edit(&mut self, prompt: &dyn Prompt) -> bool {
        let Some(draft) = self.editing.as_ref() else {
            return false;
        };
        let update = match draft.validate() {
            Ok(update) => update,
            Err(e) => {
                prompt.alert(&e.to_string());
                return false;
            }
        };

        match self.client.update_meme(draft.id, &update).await {
            Ok(()) => {
                self.editing = None;
                self.refresh().await;
                prompt.alert("Meme updated successfully!");
                true
            }
            Err(e) => {
                tracing::error!("Error updating meme: {}", e);
                prompt.alert(&e.user_message("Failed to update meme"));
                false
            }
        }
    }

    pub async fn delete(&mut self, id: i64, prompt: &dyn Prompt) -> bool {
        if !prompt.confirm("Are you sure you want to delete this meme?") {
            return false;
        }

        match self.client.delete_meme(id).await {
            Ok(()) => {
                self.refresh().await;
                prompt.alert("Meme deleted successfully!");
                true
            }
            Err(e) => {
                tracing::error!("Error deleting meme {}: {}", id, e);
                prompt.alert(&e.user_message("Failed to delete meme"));
                false
            }
        }
    }
}
