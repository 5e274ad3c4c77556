//! The remote service boundary.
//!
//! Every network operation the engine performs is expressed against the
//! [`RemoteService`] trait so tests can substitute a scripted
//! implementation. [`http::HttpRemote`] is the production implementation
//! speaking the board server's JSON API.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::CardFilter;
use crate::model::{Card, ChatMessage, Project, ProjectDetail, User};

/// One `(card, column, position)` triple of a reorder batch. A reorder
/// request always carries the complete ordered snapshot of the destination
/// column, never a single-card delta: position is relative, and a partial
/// update would desynchronize siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlacement {
    pub id: i64,
    pub column: String,
    pub position: i64,
}

/// Fields for card creation. The id (and the top-of-column position) are
/// server-assigned, which is why creation is never optimistic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCard {
    pub title: String,
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<crate::model::ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<i64>>,
}

/// Partial card update. Absent fields are left untouched by the server;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<crate::model::ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<i64>>,
}

impl CardPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Default::default()
        }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self {
            column: Some(name.into()),
            ..Default::default()
        }
    }
}

/// One page of chat history, oldest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total: u64,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}

/// Failures at the remote boundary.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a server verdict (connect, timeout, I/O).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status and, when it supplied
    /// one, its own message.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("not authenticated")]
    Unauthorized,

    #[error("malformed server response: {0}")]
    Decode(String),

    #[error("push channel closed")]
    ChannelClosed,
}

impl RemoteError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// The project/card/column/message service the engine talks to. Wire
/// format is the implementation's concern; the engine depends only on
/// these contracts.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError>;

    async fn fetch_project(&self, project_id: i64) -> Result<ProjectDetail, RemoteError>;

    /// Submit a complete column snapshot of `(card, column, position)`
    /// triples. The response carries nothing the engine needs beyond
    /// success or failure.
    async fn reorder_cards(&self, placements: &[CardPlacement]) -> Result<(), RemoteError>;

    async fn create_card(&self, project_id: i64, card: &NewCard) -> Result<Card, RemoteError>;

    /// Returns the canonical card; the server owns denormalized fields
    /// such as resolved assignee and category objects.
    async fn update_card(&self, card_id: i64, patch: &CardPatch) -> Result<Card, RemoteError>;

    async fn delete_card(&self, card_id: i64) -> Result<(), RemoteError>;

    /// Replace the project's ordered column-name list; returns the updated
    /// project (the server validates card-reference fallout).
    async fn update_columns(
        &self,
        project_id: i64,
        columns: &[String],
    ) -> Result<Project, RemoteError>;

    /// Full replacement card list for the given filter.
    async fn search_cards(
        &self,
        project_id: i64,
        filter: &CardFilter,
    ) -> Result<Vec<Card>, RemoteError>;

    async fn fetch_messages(&self, project_id: i64) -> Result<MessagePage, RemoteError>;

    async fn send_message(&self, project_id: i64, content: &str)
    -> Result<ChatMessage, RemoteError>;

    /// Reset the caller's unread counter for the project.
    async fn mark_read(&self, project_id: i64) -> Result<(), RemoteError>;
}
