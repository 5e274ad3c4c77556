//! `reqwest`-backed implementation of [`RemoteService`].
//!
//! Speaks the board server's JSON API: bearer-token auth, `/api/...`
//! routes, and `{"error": "..."}` rejection bodies.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{
    AuthSession, CardPatch, CardPlacement, MessagePage, NewCard, RemoteError, RemoteService,
};
use crate::config::ClientConfig;
use crate::filter::CardFilter;
use crate::model::{Card, ChatMessage, Project, ProjectDetail, User};

/// Error body the server attaches to non-success responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &ClientConfig, token: Option<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(RemoteError::transport)?;
        Ok(Self {
            client,
            base_url: config.api_base(),
            token,
        })
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "remote request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RemoteError> {
        let response = builder.send().await.map_err(RemoteError::transport)?;
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(RemoteError::decode);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message: body
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").into()),
        })
    }

    /// Fire a request whose response body the caller does not need.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), RemoteError> {
        let _: serde_json::Value = self.send(builder).await?;
        Ok(())
    }

    // ── Auth (CLI only; not part of the engine boundary) ────────────────

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, RemoteError> {
        self.send(
            self.request(Method::POST, "/auth/login")
                .json(&json!({"username": username, "password": password})),
        )
        .await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, RemoteError> {
        self.send(self.request(Method::POST, "/auth/register").json(
            &json!({"username": username, "email": email, "password": password}),
        ))
        .await
    }

    pub async fn me(&self) -> Result<User, RemoteError> {
        self.send(self.request(Method::GET, "/auth/me")).await
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.send(self.request(Method::GET, "/projects")).await
    }

    async fn fetch_project(&self, project_id: i64) -> Result<ProjectDetail, RemoteError> {
        self.send(self.request(Method::GET, &format!("/projects/{project_id}")))
            .await
    }

    async fn reorder_cards(&self, placements: &[CardPlacement]) -> Result<(), RemoteError> {
        self.send_unit(
            self.request(Method::POST, "/cards/reorder")
                .json(&json!({ "cards": placements })),
        )
        .await
    }

    async fn create_card(&self, project_id: i64, card: &NewCard) -> Result<Card, RemoteError> {
        self.send(
            self.request(Method::POST, &format!("/projects/{project_id}/cards"))
                .json(card),
        )
        .await
    }

    async fn update_card(&self, card_id: i64, patch: &CardPatch) -> Result<Card, RemoteError> {
        self.send(
            self.request(Method::PUT, &format!("/cards/{card_id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_card(&self, card_id: i64) -> Result<(), RemoteError> {
        self.send_unit(self.request(Method::DELETE, &format!("/cards/{card_id}")))
            .await
    }

    async fn update_columns(
        &self,
        project_id: i64,
        columns: &[String],
    ) -> Result<Project, RemoteError> {
        self.send(
            self.request(Method::PUT, &format!("/projects/{project_id}/columns"))
                .json(&json!({ "columns": columns })),
        )
        .await
    }

    async fn search_cards(
        &self,
        project_id: i64,
        filter: &CardFilter,
    ) -> Result<Vec<Card>, RemoteError> {
        self.send(
            self.request(Method::GET, &format!("/projects/{project_id}/cards/search"))
                .query(&filter.to_query_pairs()),
        )
        .await
    }

    async fn fetch_messages(&self, project_id: i64) -> Result<MessagePage, RemoteError> {
        self.send(self.request(Method::GET, &format!("/projects/{project_id}/messages")))
            .await
    }

    async fn send_message(
        &self,
        project_id: i64,
        content: &str,
    ) -> Result<ChatMessage, RemoteError> {
        self.send(
            self.request(Method::POST, &format!("/projects/{project_id}/messages"))
                .form(&[("content", content)]),
        )
        .await
    }

    async fn mark_read(&self, project_id: i64) -> Result<(), RemoteError> {
        self.send_unit(self.request(Method::POST, &format!("/projects/{project_id}/read")))
            .await
    }
}
