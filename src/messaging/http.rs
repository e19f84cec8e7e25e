//! [`Messenger`] backed by the gateway bridge REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{InteractionHandle, Member, Messenger, Modal, Reply, UserProfile};
use crate::auth::API_KEY_HEADER;
use crate::errors::AppError;

/// HTTP client for the bridge.
#[derive(Clone)]
pub struct HttpMessenger {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct KickBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl HttpMessenger {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn interaction_url(&self, interaction: &InteractionHandle, action: &str) -> String {
        self.url(&format!(
            "/interactions/{}/{}/{}",
            interaction.id, interaction.token, action
        ))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(), AppError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Gateway bridge rejected request");
            return Err(AppError::Messaging(format!(
                "Gateway bridge returned {}",
                status
            )));
        }
        Ok(())
    }

    /// GET a resource, mapping 404 to `None`.
    async fn fetch_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, AppError> {
        let response = self
            .authorized(self.client.get(self.url(path)))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(AppError::Messaging(format!(
                "Gateway bridge returned {} for {}",
                status, path
            ))),
        }
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn respond(&self, interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError> {
        let url = self.interaction_url(interaction, "response");
        self.execute(self.client.post(url).json(&reply)).await
    }

    async fn followup(
        &self,
        interaction: &InteractionHandle,
        reply: Reply,
    ) -> Result<(), AppError> {
        let url = self.interaction_url(interaction, "followup");
        self.execute(self.client.post(url).json(&reply)).await
    }

    async fn update(&self, interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError> {
        let url = self.interaction_url(interaction, "message");
        self.execute(self.client.patch(url).json(&reply)).await
    }

    async fn edit_original(
        &self,
        interaction: &InteractionHandle,
        reply: Reply,
    ) -> Result<(), AppError> {
        let url = self.interaction_url(interaction, "original");
        self.execute(self.client.patch(url).json(&reply)).await
    }

    async fn send_modal(
        &self,
        interaction: &InteractionHandle,
        modal: Modal,
    ) -> Result<(), AppError> {
        let url = self.interaction_url(interaction, "modal");
        self.execute(self.client.post(url).json(&modal)).await
    }

    async fn send(&self, channel_id: u64, reply: Reply) -> Result<(), AppError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        self.execute(self.client.post(url).json(&reply)).await
    }

    async fn reply_to(
        &self,
        channel_id: u64,
        message_id: u64,
        reply: Reply,
    ) -> Result<(), AppError> {
        let url = self.url(&format!(
            "/channels/{}/messages/{}/replies",
            channel_id, message_id
        ));
        self.execute(self.client.post(url).json(&reply)).await
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, AppError> {
        self.fetch_optional(&format!("/guilds/{}/members/{}", guild_id, user_id))
            .await
    }

    async fn fetch_user(&self, user_id: u64) -> Result<Option<UserProfile>, AppError> {
        self.fetch_optional(&format!("/users/{}", user_id)).await
    }

    async fn kick(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: Option<&str>,
    ) -> Result<(), AppError> {
        let url = self.url(&format!("/guilds/{}/members/{}", guild_id, user_id));
        self.execute(self.client.delete(url).json(&KickBody { reason }))
            .await
    }

    /// Attachment URLs point at the platform CDN, so no bridge key is sent.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Messaging(format!(
                "Attachment download returned {}",
                status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
