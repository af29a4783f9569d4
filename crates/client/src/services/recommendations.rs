//! Wellbeing recommendations and likes.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use bienestar_core::types::RecordId;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::services::notes::Sentiment;

/// A video or article suggested to students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecordId,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Thumbnail image URL.
    #[serde(default)]
    pub miniatura: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    /// Emotion this recommendation is meant to help with.
    #[serde(default)]
    pub emocion_objetivo: Option<String>,
    #[serde(default)]
    pub sentimiento_objetivo: Option<Sentiment>,
}

/// Recommendations matched to the user's recent notes and likes.
///
/// The detected labels are absent when the user has no history yet and the
/// backend falls back to the general list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PersonalizedRecommendations {
    #[serde(default)]
    pub data: Vec<Recommendation>,
    #[serde(default)]
    pub emocion_detectada: Option<String>,
    #[serde(default)]
    pub sentimiento_detectado: Option<Sentiment>,
}

pub struct RecommendationsApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn recommendations(&self) -> RecommendationsApi<'_> {
        RecommendationsApi { api: self }
    }
}

impl RecommendationsApi<'_> {
    pub async fn all(&self) -> Result<Vec<Recommendation>, ApiError> {
        let rows: Option<Vec<Recommendation>> = self.api.get("/recomendaciones/todas", &[]).await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn personalized(&self, user_id: &str) -> Result<PersonalizedRecommendations, ApiError> {
        self.api
            .get_envelope(&format!("/recomendaciones/{user_id}"), &[])
            .await
    }

    /// Ids of the recommendations `user_id` has liked.
    pub async fn likes(&self, user_id: &str) -> Result<Vec<RecordId>, ApiError> {
        let ids: Option<Vec<RecordId>> = self.api.get(&format!("/likes/{user_id}"), &[]).await?;
        Ok(ids.unwrap_or_default())
    }

    pub async fn add_like(&self, user_id: &str, recommendation_id: RecordId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .api
            .post_empty(&format!("/likes/{user_id}/{recommendation_id}"), &[])
            .await?;
        Ok(())
    }

    pub async fn remove_like(&self, user_id: &str, recommendation_id: RecordId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .api
            .delete(&format!("/likes/{user_id}/{recommendation_id}"), &[])
            .await?;
        Ok(())
    }

    /// Flip the like state. Returns the new state.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        recommendation_id: RecordId,
        is_liked: bool,
    ) -> Result<bool, ApiError> {
        if is_liked {
            self.remove_like(user_id, recommendation_id).await?;
        } else {
            self.add_like(user_id, recommendation_id).await?;
        }
        Ok(!is_liked)
    }

    /// Full records of the liked recommendations.
    pub async fn favourites(&self, user_id: &str) -> Result<Vec<Recommendation>, ApiError> {
        let rows: Option<Vec<Recommendation>> = self
            .api
            .get(&format!("/recomendaciones/favoritos/{user_id}"), &[])
            .await?;
        Ok(rows.unwrap_or_default())
    }
}
