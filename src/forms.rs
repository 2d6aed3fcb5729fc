//! Client-side draft state and validation for the upload, edit and register
//! forms. Nothing here touches the network.

use std::path::Path;

use bytes::Bytes;

use crate::api::{ImagePayload, NewMeme};
use crate::models::{Category, Meme, MemeUpdate};

pub const CAPTION_MAX_CHARS: usize = 140;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const USERNAME_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Caption is required")]
    CaptionRequired,

    #[error("Caption must be 140 characters or less")]
    CaptionTooLong,

    #[error("Please upload an image or provide an image URL")]
    ImageRequired,

    #[error("Provide either an image file or an image URL, not both")]
    ImageAmbiguous,

    #[error("Please login to upload memes")]
    LoginRequired,

    #[error("Image URL is disabled while a file is selected")]
    UrlLocked,

    #[error("{0} is not an image file")]
    NotAnImage(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,
}

/// A local image picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

/// What the form shows for a picked file before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub file_name: String,
    pub mime: String,
    pub size_bytes: usize,
}

impl ImageFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, ValidationError> {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(ValidationError::NotAnImage(file_name));
        }
        Ok(Self {
            file_name,
            mime: mime.essence_str().to_string(),
            bytes: bytes.into(),
        })
    }

    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(file_name, bytes)?)
    }

    pub fn preview(&self) -> ImagePreview {
        ImagePreview {
            file_name: self.file_name.clone(),
            mime: self.mime.clone(),
            size_bytes: self.bytes.len(),
        }
    }
}

fn check_title_and_caption(title: &str, caption: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if caption.trim().is_empty() {
        return Err(ValidationError::CaptionRequired);
    }
    if caption.chars().count() > CAPTION_MAX_CHARS {
        return Err(ValidationError::CaptionTooLong);
    }
    Ok(())
}

/// Pending new post. The image file and URL are mutually exclusive: picking a
/// file clears and locks the URL field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadDraft {
    pub title: String,
    pub caption: String,
    pub category: Category,
    image_url: String,
    image_file: Option<ImageFile>,
}

impl UploadDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn image_file(&self) -> Option<&ImageFile> {
        self.image_file.as_ref()
    }

    pub fn url_locked(&self) -> bool {
        self.image_file.is_some()
    }

    pub fn select_file(&mut self, file: ImageFile) -> ImagePreview {
        let preview = file.preview();
        self.image_file = Some(file);
        self.image_url.clear();
        preview
    }

    pub fn clear_file(&mut self) {
        self.image_file = None;
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) -> Result<(), ValidationError> {
        if self.url_locked() {
            return Err(ValidationError::UrlLocked);
        }
        self.image_url = url.into();
        Ok(())
    }

    pub fn preview(&self) -> Option<ImagePreview> {
        self.image_file.as_ref().map(ImageFile::preview)
    }

    pub fn caption_counter(&self) -> String {
        format!("{}/{}", self.caption.chars().count(), CAPTION_MAX_CHARS)
    }

    /// Apply the submission rules in order; the first failure wins.
    pub fn validate(&self, authenticated: bool) -> Result<NewMeme, ValidationError> {
        check_title_and_caption(&self.title, &self.caption)?;

        let url = self.image_url.trim();
        let image = match (&self.image_file, url.is_empty()) {
            (Some(_), false) => return Err(ValidationError::ImageAmbiguous),
            (None, true) => return Err(ValidationError::ImageRequired),
            (Some(file), true) => ImagePayload::File {
                file_name: file.file_name.clone(),
                mime: file.mime.clone(),
                bytes: file.bytes.clone(),
            },
            (None, false) => ImagePayload::Url(url.to_string()),
        };

        if !authenticated {
            return Err(ValidationError::LoginRequired);
        }

        Ok(NewMeme {
            title: self.title.trim().to_string(),
            caption: self.caption.trim().to_string(),
            category: self.category,
            image,
        })
    }
}

/// Pending changes to one of the viewer's own posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: i64,
    pub title: String,
    pub caption: String,
    pub category: Category,
}

impl EditDraft {
    pub fn from_meme(meme: &Meme) -> Self {
        Self {
            id: meme.id,
            title: meme.title.clone(),
            caption: meme.caption.clone(),
            category: meme.category,
        }
    }

    pub fn validate(&self) -> Result<MemeUpdate, ValidationError> {
        check_title_and_caption(&self.title, &self.caption)?;
        Ok(MemeUpdate {
            title: self.title.trim().to_string(),
            caption: self.caption.trim().to_string(),
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.username.chars().count() < USERNAME_MIN_CHARS {
            return Err(ValidationError::UsernameTooShort);
        }
        Ok(())
    }
}
