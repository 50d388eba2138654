use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{LocalImage, SavePayload};

/// What the profile backend answers when it processed the request but
/// refused it. An absent or empty `error` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    /// The error indicator, if it carries anything worth showing.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Backend operations on the signed-in user's profile.
///
/// `Err` is reserved for transport failures; a request the backend
/// understood but refused resolves to `Ok` with an error indicator.
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    async fn update_details(&self, payload: &SavePayload) -> Result<ServiceResponse, ServiceError>;

    async fn upload_picture(&self, image: &LocalImage) -> Result<ServiceResponse, ServiceError>;
}
