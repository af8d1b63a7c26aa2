use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Shown as the bot message whenever the request itself fails.
pub const APOLOGY_TEXT: &str =
    "Sorry, I encountered an error while generating the story. Please try again.";

/// Error description used when the failure carries no better explanation.
pub const GENERIC_ERROR_TEXT: &str = "An error occurred while generating the story";

/// Reply used by the offline responder.
pub const CANNED_REPLY: &str = "This is a simulated response from the chatbot.";

#[derive(Serialize)]
struct StoryRequest<'a> {
    prompt: &'a str,
}

/// Raw shape of the backend's JSON body. The backend also sends fields like
/// `user_id` and `intent` on some statuses; they are ignored here.
#[derive(Deserialize)]
struct RawStoryResponse {
    status: Option<String>,
    story: Option<String>,
    message: Option<String>,
}

/// A settled, well-formed answer from the story endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryReply {
    /// `status: "success"` with generated narrative text.
    Story(String),
    /// Any other status with a human-readable explanation. Covers backend
    /// errors as well as conversational statuses like `proceed` or
    /// `new_user_profiling_required`; all are rendered verbatim.
    Refusal(String),
}

impl StoryReply {
    fn from_raw(raw: RawStoryResponse) -> Result<Self> {
        match raw.status.as_deref() {
            Some("success") => raw
                .story
                .map(StoryReply::Story)
                .ok_or_else(|| anyhow!("success response missing story text")),
            Some(_) => raw
                .message
                .map(StoryReply::Refusal)
                .ok_or_else(|| anyhow!("non-success response missing message")),
            None => Err(anyhow!("response missing status field")),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            StoryReply::Story(s) => s,
            StoryReply::Refusal(m) => m,
        }
    }
}

#[derive(Clone)]
pub struct StoryClient {
    client: Client,
    base_url: String,
}

impl StoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Performs the single POST exchange with the story endpoint.
    ///
    /// Returns `Err` only for transport-level failures: network errors,
    /// timeouts, non-2xx statuses, or bodies matching neither response shape.
    pub async fn tell_story(&self, prompt: &str) -> Result<StoryReply> {
        let url = format!("{}/api/story", self.base_url);
        tracing::debug!(url = %url, "requesting story");

        let response = self
            .client
            .post(&url)
            .json(&StoryRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies may still carry a backend-provided explanation.
            let detail = response
                .json::<RawStoryResponse>()
                .await
                .ok()
                .and_then(|raw| raw.message)
                .unwrap_or_else(|| format!("story request failed with status {}", status));
            tracing::warn!(status = %status, "story request failed");
            return Err(anyhow!(detail));
        }

        let raw: RawStoryResponse = response.json().await?;
        StoryReply::from_raw(raw)
    }
}

/// The two responder variants: the real backend exchange, or the fixed
/// simulated reply of the original static widget (no network call).
#[derive(Clone)]
pub enum Responder {
    Backend(StoryClient),
    Canned,
}
