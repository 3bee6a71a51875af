use block_composer_engine::{Provider, ProviderError};
use serde_json::Value;

/// A provider that answers every request with a recorded model response.
///
/// Lets the full compose pipeline run offline against output captured from a
/// real model.
pub struct ReplayProvider {
    response: String,
}

impl ReplayProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Provider for ReplayProvider {
    fn is_available(&self) -> bool {
        !self.response.trim().is_empty()
    }

    fn generate(&self, system_prompt: &str, user_prompt: &str, _schema: &Value) -> Result<String, ProviderError> {
        log::debug!(
            "Replaying recorded response for {} byte prompt ({} byte system prompt)",
            user_prompt.len(),
            system_prompt.len()
        );
        if self.response.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(self.response.clone())
    }
}
