//! Per-project session state.
//!
//! `Session` is the single application-state object for the open project:
//! the committed project record, the board model, the category list, and
//! the bookkeeping the mutation engine needs to reconcile asynchronous
//! completions — a [`ProjectContext`] tag for detecting stale completions
//! and per-column sequence numbers for the snapshot-supersedes reorder
//! contract. All mutation goes through the engine's operations; rendering
//! code gets read access only.
//!
//! Staging and completion are synchronous state transitions, so every
//! interleaving of overlapping requests can be driven explicitly in tests.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::PreconditionError;
use crate::model::{BoardModel, Card, Category, Project, ProjectDetail};
use crate::remote::CardPlacement;

/// Identifies the project session a request was issued for. Completions
/// whose context no longer matches the active session are dropped rather
/// than mutating a model that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectContext {
    pub project_id: i64,
    pub generation: u64,
}

/// An in-flight reorder: the outbound placement batch plus everything
/// needed to roll the optimistic application back.
#[derive(Debug)]
pub struct ReorderTicket {
    pub context: ProjectContext,
    pub column: String,
    pub placements: Vec<CardPlacement>,
    seq: u64,
    snapshot: Vec<Card>,
}

/// How a reorder completion was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderResolution {
    /// Success; the optimistic state is the committed state.
    Accepted,
    /// Failure; the snapshot was restored.
    RolledBack,
    /// Failure of a request a later reorder of the same column superseded;
    /// nothing was rolled back (the later full snapshot is authoritative).
    Superseded,
    /// The session the request was issued for is gone; completion dropped.
    Stale,
}

#[derive(Debug)]
pub struct Session {
    project: Project,
    board: BoardModel,
    categories: Vec<Category>,
    context: ProjectContext,
    reorder_seq: HashMap<String, u64>,
}

impl Session {
    pub fn open(detail: ProjectDetail, generation: u64) -> Self {
        let context = ProjectContext {
            project_id: detail.project.id,
            generation,
        };
        Self {
            project: detail.project,
            board: BoardModel::new(detail.cards),
            categories: detail.categories,
            context,
            reorder_seq: HashMap::new(),
        }
    }

    pub fn context(&self) -> ProjectContext {
        self.context
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn board(&self) -> &BoardModel {
        &self.board
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Adopt the server-returned project record (column commit, rename).
    /// The server is the source of truth for the committed column list.
    pub fn adopt_project(&mut self, project: Project) {
        self.project = project;
    }

    pub fn bump_unread(&mut self) {
        self.project.unread_count = self.project.unread_count.saturating_add(1);
    }

    pub fn clear_unread(&mut self) {
        self.project.unread_count = 0;
    }

    // ── Reorder staging ─────────────────────────────────────────────────

    /// Optimistically drop `card_id` into `column` at visual index `index`.
    ///
    /// Recomputes the destination column's full order, assigns dense
    /// 0-based positions to every card in it (including unmoved siblings),
    /// applies the result to the board, and returns the ticket carrying
    /// the complete placement batch and the rollback snapshot.
    pub fn stage_reorder(
        &mut self,
        card_id: i64,
        column: &str,
        index: usize,
    ) -> Result<ReorderTicket, PreconditionError> {
        if !self.project.columns.iter().any(|c| c == column) {
            return Err(PreconditionError::UnknownColumn {
                column: column.to_string(),
            });
        }
        if self.board.get(card_id).is_none() {
            return Err(PreconditionError::UnknownCard { id: card_id });
        }

        let mut order: Vec<i64> = self
            .board
            .cards_in_column(column)
            .iter()
            .map(|c| c.id)
            .filter(|id| *id != card_id)
            .collect();
        let index = index.min(order.len());
        order.insert(index, card_id);

        let placements: Vec<CardPlacement> = order
            .iter()
            .enumerate()
            .map(|(position, id)| CardPlacement {
                id: *id,
                column: column.to_string(),
                position: position as i64,
            })
            .collect();

        // Snapshot every affected card before touching it; the moving
        // card's entry also preserves its source column.
        let snapshot: Vec<Card> = order
            .iter()
            .filter_map(|id| self.board.get(*id).cloned())
            .collect();

        for placement in &placements {
            if let Some(card) = self.board.get_mut(placement.id) {
                card.column.clone_from(&placement.column);
                card.position = placement.position;
            }
        }

        let seq = {
            let entry = self.reorder_seq.entry(column.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        debug!(card = card_id, column, index, seq, "staged reorder");

        Ok(ReorderTicket {
            context: self.context,
            column: column.to_string(),
            placements,
            seq,
            snapshot,
        })
    }

    /// The server confirmed the batch; local and intended-remote state are
    /// identical by construction, so there is nothing to read back.
    pub fn accept_reorder(&mut self, ticket: ReorderTicket) -> ReorderResolution {
        if ticket.context != self.context {
            return ReorderResolution::Stale;
        }
        ReorderResolution::Accepted
    }

    /// The server rejected the batch. Restores the snapshot unless a later
    /// reorder of the same column has superseded this ticket, in which
    /// case the later request owns the column's state.
    pub fn reject_reorder(&mut self, ticket: ReorderTicket) -> ReorderResolution {
        if ticket.context != self.context {
            return ReorderResolution::Stale;
        }
        if self.reorder_seq.get(&ticket.column) != Some(&ticket.seq) {
            debug!(column = %ticket.column, "reorder failure superseded; keeping later state");
            return ReorderResolution::Superseded;
        }
        for card in ticket.snapshot {
            self.board.upsert(card);
        }
        ReorderResolution::RolledBack
    }

    // ── Non-reorder mutations ───────────────────────────────────────────

    /// Replace (or insert) a card with the canonical server object.
    pub fn apply_card(&mut self, card: Card) {
        self.board.upsert(card);
    }

    /// Optimistically remove a card ahead of its delete request.
    pub fn stage_delete(&mut self, card_id: i64) -> Result<Card, PreconditionError> {
        self.board
            .remove(card_id)
            .ok_or(PreconditionError::UnknownCard { id: card_id })
    }

    /// Wholesale replacement of the working card set (search response).
    pub fn replace_cards(&mut self, cards: Vec<Card>) {
        self.board.replace(cards);
    }
}
