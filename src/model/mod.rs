//! Domain model for the board client.
//!
//! `types` holds the wire-shaped domain structs; `board` is the in-memory
//! ordered collection the engine mutates.

pub mod board;
pub mod types;

pub use board::BoardModel;
pub use types::{
    Attachment, Card, Category, ChatMessage, ContentKind, DueState, FileKind, FileVersion,
    Project, ProjectDetail, User,
};
