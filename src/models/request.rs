use serde::{Deserialize, Serialize};

/// Provider/model selection forwarded with a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Request that opens one run on the event source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRequest {
    /// Client-generated run id, echoed on every event of the run
    pub run_id: String,
    /// The user content, attachments already embedded
    pub content: String,
    /// Existing thread to continue - None means create a new thread
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Client-proposed id for a new thread; the backend adopts it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

impl StreamRequest {
    /// Create a request that starts a new thread with the proposed id
    pub fn new_thread(run_id: String, content: String, new_thread_id: String) -> Self {
        Self {
            run_id,
            content,
            thread_id: None,
            new_thread_id: Some(new_thread_id),
            model: None,
        }
    }

    /// Create a request continuing an existing thread
    pub fn with_thread(run_id: String, content: String, thread_id: String) -> Self {
        Self {
            run_id,
            content,
            thread_id: Some(thread_id),
            new_thread_id: None,
            model: None,
        }
    }

    /// Set the model configuration
    pub fn with_model(mut self, model: Option<ModelConfig>) -> Self {
        self.model = model;
        self
    }
}
