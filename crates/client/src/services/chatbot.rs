//! Chatbot conversation backed by an external webhook.
//!
//! The webhook lives outside the backend, so requests skip the API
//! envelope and bearer handling. Failures never surface as errors: they
//! become a bot message in the transcript, like any other reply.

use serde::{Deserialize, Serialize};

use bienestar_core::cache::{ChatEntry, ChatTranscript, UserCache, CHAT_NAMESPACE};
use bienestar_core::types::UserId;

use crate::api::ApiClient;
use crate::error::ApiError;

/// Shown when the webhook answers without a `respuesta`.
pub const NO_REPLY_TEXT: &str = "No se obtuvo respuesta";

/// Shown when the webhook cannot be reached.
pub const CONNECTION_ERROR_TEXT: &str = "Error al conectar con el chatbot";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    texto: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatReply {
    #[serde(default)]
    respuesta: Option<String>,
    /// Portal route the bot suggests visiting.
    #[serde(default)]
    ruta: Option<String>,
}

/// One user's conversation, restored from and saved to the [`UserCache`].
pub struct ChatSession<'a> {
    api: &'a ApiClient,
    webhook_url: &'a str,
    cache: &'a UserCache,
    user_id: UserId,
    transcript: ChatTranscript,
}

impl ApiClient {
    pub fn chatbot<'a>(
        &'a self,
        webhook_url: &'a str,
        cache: &'a UserCache,
        user_id: &str,
    ) -> ChatSession<'a> {
        let transcript = cache.load(CHAT_NAMESPACE, user_id);
        ChatSession {
            api: self,
            webhook_url,
            cache,
            user_id: user_id.to_string(),
            transcript,
        }
    }
}

impl ChatSession<'_> {
    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// Send `text` and return the bot's reply entry.
    ///
    /// Blank input is ignored and returns `None`.
    pub async fn ask(&mut self, text: &str) -> Option<ChatEntry> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.transcript.push_user(text);

        match self.call_webhook(text).await {
            Ok(reply) => {
                let answer = reply
                    .respuesta
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| NO_REPLY_TEXT.to_string());
                let route = reply.ruta.filter(|r| !r.trim().is_empty());
                self.transcript.push_bot(answer, route);
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "Chatbot request failed");
                self.transcript.push_bot(CONNECTION_ERROR_TEXT, None);
            }
        }

        self.save();
        self.transcript.last().cloned()
    }

    /// Forget the conversation, in memory and in the cache.
    pub fn clear(&mut self) -> Result<(), ApiError> {
        self.transcript = ChatTranscript::default();
        self.cache.clear(CHAT_NAMESPACE, &self.user_id)?;
        Ok(())
    }

    async fn call_webhook(&self, texto: &str) -> Result<ChatReply, ApiError> {
        let response = self
            .api
            .http()
            .post(self.webhook_url)
            .json(&ChatRequest { texto })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ChatReply>().await?)
    }

    fn save(&self) {
        if let Err(e) = self.cache.store(CHAT_NAMESPACE, &self.user_id, &self.transcript) {
            tracing::warn!(user_id = %self.user_id, error = %e, "Failed to cache chat transcript");
        }
    }
}
