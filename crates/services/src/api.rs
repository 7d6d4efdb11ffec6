use std::env;

use habit_core::model::{Category, Creator, Habit, HabitId, ValidHabit};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute URL.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }
        let token = token.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
        Ok(Self { base_url, token })
    }

    /// Reads `HABIT_API_BASE_URL` (defaults to the local dev server) and the
    /// optional bearer token `HABIT_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the configured base URL is invalid.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = env::var("HABIT_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(base_url, env::var("HABIT_API_TOKEN").ok())
    }
}

/// Client for the habit backend's REST API.
#[derive(Clone)]
pub struct HabitApiClient {
    client: Client,
    config: ApiConfig,
}

impl HabitApiClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "habit API response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status));
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ApiError::HttpStatus { status, message });
        }

        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend rejects it.
    pub async fn public_habits(&self) -> Result<Vec<Habit>, ApiError> {
        self.send(self.client.get(self.url("habits/public"))).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend rejects it.
    pub async fn featured_habits(&self) -> Result<Vec<Habit>, ApiError> {
        self.send(self.client.get(self.url("habits/featured"))).await
    }

    /// Habits owned by the token's user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend rejects it.
    pub async fn my_habits(&self) -> Result<Vec<Habit>, ApiError> {
        self.send(self.client.get(self.url("my-habits"))).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend rejects it.
    pub async fn get_habit(&self, id: &HabitId) -> Result<Habit, ApiError> {
        self.send(self.client.get(self.url(&format!("habits/{id}"))))
            .await
    }

    /// Create a habit; returns the id the backend assigned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAcknowledged` if no id comes back, or any
    /// transport/status error.
    pub async fn create_habit(
        &self,
        fields: &ValidHabit,
        creator: &Creator,
    ) -> Result<HabitId, ApiError> {
        let payload = HabitPayload::new(fields, Some(creator));
        let ack: InsertAck = self
            .send(self.client.post(self.url("habits")).json(&payload))
            .await?;
        ack.inserted_id
            .and_then(|id| HabitId::new(id).ok())
            .ok_or(ApiError::NotAcknowledged("insert"))
    }

    /// Replace the editable fields; returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend rejects it.
    pub async fn update_habit(&self, id: &HabitId, fields: &ValidHabit) -> Result<bool, ApiError> {
        let payload = HabitPayload::new(fields, None);
        let ack: UpdateAck = self
            .send(self.client.put(self.url(&format!("habits/{id}"))).json(&payload))
            .await?;
        Ok(ack.modified_count > 0)
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotAcknowledged` if the backend deleted nothing.
    pub async fn delete_habit(&self, id: &HabitId) -> Result<(), ApiError> {
        let ack: DeleteAck = self
            .send(self.client.delete(self.url(&format!("habits/{id}"))))
            .await?;
        if ack.deleted_count == 0 {
            return Err(ApiError::NotAcknowledged("delete"));
        }
        Ok(())
    }

    /// Mark today complete; returns the updated habit.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpStatus` (with the backend's message) when the
    /// backend refuses, e.g. for a second completion on the same day.
    pub async fn mark_complete(&self, id: &HabitId) -> Result<Habit, ApiError> {
        self.send(self.client.post(self.url(&format!("habits/{id}/complete"))))
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HabitPayload<'a> {
    title: &'a str,
    description: &'a str,
    category: Category,
    reminder_time: String,
    image_url: &'a str,
    is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator_email: Option<&'a str>,
}

impl<'a> HabitPayload<'a> {
    fn new(fields: &'a ValidHabit, creator: Option<&'a Creator>) -> Self {
        Self {
            title: fields.title(),
            description: fields.description(),
            category: fields.category(),
            reminder_time: fields
                .reminder_time()
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            image_url: fields.image_url().map_or("", Url::as_str),
            is_public: fields.is_public(),
            creator_name: creator.and_then(Creator::name),
            creator_email: creator.map(Creator::email),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAck {
    inserted_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAck {
    #[serde(default)]
    modified_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAck {
    #[serde(default)]
    deleted_count: u64,
}
