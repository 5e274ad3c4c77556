//! Wire-shaped domain types shared by the engine, the remote boundary and
//! the push channel.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Project summary as listed on the dashboard. `columns` is the committed
/// ordered column-name list; names are unique and non-blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: i64,
    pub columns: Vec<String>,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full project payload returned when a project is opened: the summary
/// plus its card and category sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Body content kind of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    #[default]
    Markdown,
    Plain,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(Self::Markdown),
            "plain" => Ok(Self::Plain),
            _ => Err(format!("Invalid content kind: {}", s)),
        }
    }
}

/// A work item. `position` is the integer ordering key within `column`:
/// unique per column after each successful reorder, but not required to be
/// contiguous (the server inserts new cards at the top as `min - 1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: ContentKind,
    pub column: String,
    pub position: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Due state relative to `now`: overdue, due within 24h, or neither.
    pub fn due_state(&self, now: DateTime<Utc>) -> DueState {
        match self.due_date {
            None => DueState::None,
            Some(due) if due < now => DueState::Overdue,
            Some(due) if due - now < chrono::Duration::hours(24) => DueState::Soon,
            Some(_) => DueState::Later,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    None,
    Overdue,
    Soon,
    Later,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Declared kind of an attached file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Text,
    Word,
    Excel,
    Powerpoint,
    Pdf,
    Image,
    #[default]
    Other,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::Powerpoint => "powerpoint",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Other => "other",
        }
    }

    /// Classify a filename by its extension.
    pub fn from_filename(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Other,
        };
        match ext.as_str() {
            "txt" | "md" => Self::Text,
            "doc" | "docx" => Self::Word,
            "xls" | "xlsx" => Self::Excel,
            "ppt" | "pptx" => Self::Powerpoint,
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "gif" => Self::Image,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "word" => Ok(Self::Word),
            "excel" => Ok(Self::Excel),
            "powerpoint" => Ok(Self::Powerpoint),
            "pdf" => Ok(Self::Pdf),
            "image" => Ok(Self::Image),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid file kind: {}", s)),
        }
    }
}

/// Attachment summary carried on a card. Contents and conversion are the
/// file service's concern; the client only tracks identity and kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub card_id: i64,
    pub filename: String,
    pub original_filename: String,
    #[serde(default)]
    pub file_type: FileKind,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// One entry of an attachment's ordered version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVersion {
    pub id: i64,
    pub attachment_id: i64,
    pub version_number: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub edited_by: Option<User>,
    #[serde(default)]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A chat message. Append-only from the client's perspective; either
/// `content`, a file reference, or both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn sender_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("unknown")
    }
}
