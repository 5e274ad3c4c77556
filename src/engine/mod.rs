//! The optimistic mutation engine.
//!
//! [`BoardClient`] translates every user mutation into an immediate local
//! model update (where the operation's [`MutationKind`] allows it), the
//! corresponding remote request, and the reconciliation of the response
//! back into the session. Rollback behavior is a declared property of
//! each operation, not ad hoc per-callback logic:
//!
//! | Operation        | Kind                     | On failure              |
//! |------------------|--------------------------|-------------------------|
//! | Reorder/move     | `OptimisticWithSnapshot` | Snapshot restored       |
//! | Card field edit  | `NonOptimistic`          | Local state untouched   |
//! | Card creation    | `NonOptimistic`          | Local state untouched   |
//! | Card deletion    | `FireAndForget`          | Warned, not rolled back |
//! | Mark read        | `FireAndForget`          | Warned, not rolled back |
//!
//! Staging (`stage_*`) and resolution (`resolve_*`) are public so tests —
//! and any UI that drives its own scheduler — can interleave overlapping
//! requests explicitly; the `async` wrappers run the common path.

pub mod session;

pub use session::{ProjectContext, ReorderResolution, ReorderTicket, Session};

use tracing::{debug, info, warn};

use crate::errors::{EngineError, PreconditionError, ValidationError};
use crate::filter::CardFilter;
use crate::model::{Card, ChatMessage, Project};
use crate::remote::{CardPatch, MessagePage, NewCard, RemoteService};

/// How a mutation interacts with local state relative to its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Applied locally first; a snapshot is held for rollback on failure.
    OptimisticWithSnapshot,
    /// Applied locally only once the canonical server object arrives.
    NonOptimistic,
    /// Applied locally immediately and never rolled back; failures are
    /// surfaced as warnings only.
    FireAndForget,
}

/// The engine's mutation vocabulary, each with its declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Reorder,
    EditCard,
    CreateCard,
    DeleteCard,
    MarkRead,
}

impl MutationOp {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Reorder => MutationKind::OptimisticWithSnapshot,
            Self::EditCard | Self::CreateCard => MutationKind::NonOptimistic,
            Self::DeleteCard | Self::MarkRead => MutationKind::FireAndForget,
        }
    }
}

/// The board client: owns the active [`Session`] and the remote service,
/// and is the only writer of board state besides the push merger.
pub struct BoardClient<R: RemoteService> {
    remote: R,
    session: Option<Session>,
    generation: u64,
}

impl<R: RemoteService> BoardClient<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            session: None,
            generation: 0,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Mutable session access for the push merger — with the engine, the
    /// only writer of board state.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    fn active(&mut self) -> Result<&mut Session, PreconditionError> {
        self.session
            .as_mut()
            .ok_or(PreconditionError::NoActiveProject)
    }

    /// The active session, only if it still matches the context a request
    /// was issued for. `None` means the completion must be dropped.
    pub(crate) fn session_for(&mut self, context: ProjectContext) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.context() == context)
    }

    // ── Project lifecycle ───────────────────────────────────────────────

    /// Load a project and make it the active session. Any completions
    /// still in flight for a previous session become stale.
    pub async fn open_project(&mut self, project_id: i64) -> Result<&Session, EngineError> {
        let detail = self.remote.fetch_project(project_id).await?;
        self.generation += 1;
        info!(project_id, generation = self.generation, "opening project");
        Ok(self.session.insert(Session::open(detail, self.generation)))
    }

    /// Discard the active session; in-flight completions for it no-op.
    pub fn close_project(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(project_id = session.project().id, "closing project");
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, EngineError> {
        Ok(self.remote.list_projects().await?)
    }

    // ── Reorder (OptimisticWithSnapshot) ────────────────────────────────

    /// Stage the optimistic move of `card_id` into `column` at `index`.
    pub fn stage_move(
        &mut self,
        card_id: i64,
        column: &str,
        index: usize,
    ) -> Result<ReorderTicket, EngineError> {
        Ok(self.active()?.stage_reorder(card_id, column, index)?)
    }

    /// Reconcile a reorder completion against the session it belongs to.
    /// On failure the snapshot is restored (unless superseded or stale)
    /// and the error is propagated for surfacing.
    pub fn resolve_move(
        &mut self,
        ticket: ReorderTicket,
        outcome: Result<(), crate::remote::RemoteError>,
    ) -> Result<ReorderResolution, EngineError> {
        let Some(session) = self.session_for(ticket.context) else {
            debug!("dropping reorder completion for inactive project");
            return Ok(ReorderResolution::Stale);
        };
        match outcome {
            Ok(()) => Ok(session.accept_reorder(ticket)),
            Err(err) => {
                let resolution = session.reject_reorder(ticket);
                warn!(%err, ?resolution, "reorder rejected by server");
                Err(EngineError::Remote(err))
            }
        }
    }

    /// Drop `card_id` into `column` at `index`: stage, send the complete
    /// placement batch for that column, reconcile.
    pub async fn move_card(
        &mut self,
        card_id: i64,
        column: &str,
        index: usize,
    ) -> Result<ReorderResolution, EngineError> {
        let ticket = self.stage_move(card_id, column, index)?;
        let outcome = self.remote.reorder_cards(&ticket.placements).await;
        self.resolve_move(ticket, outcome)
    }

    // ── Card field edits and creation (NonOptimistic) ───────────────────

    /// Edit card fields. Nothing is applied locally until the canonical
    /// card arrives; `Ok(None)` means the completion was stale-dropped.
    pub async fn edit_card(
        &mut self,
        card_id: i64,
        patch: &CardPatch,
    ) -> Result<Option<Card>, EngineError> {
        if let Some(title) = patch.title.as_deref() {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyCardTitle.into());
            }
        }
        let session = self.active()?;
        if session.board().get(card_id).is_none() {
            return Err(PreconditionError::UnknownCard { id: card_id }.into());
        }
        let context = session.context();

        let card = self.remote.update_card(card_id, patch).await?;
        match self.session_for(context) {
            Some(session) => {
                session.apply_card(card.clone());
                Ok(Some(card))
            }
            None => {
                debug!(card_id, "dropping edit completion for inactive project");
                Ok(None)
            }
        }
    }

    /// Create a card; appended locally only after the server assigns its
    /// id. `Ok(None)` means the completion was stale-dropped.
    pub async fn create_card(&mut self, card: &NewCard) -> Result<Option<Card>, EngineError> {
        if card.title.trim().is_empty() {
            return Err(ValidationError::EmptyCardTitle.into());
        }
        let session = self.active()?;
        if !session.project().columns.iter().any(|c| *c == card.column) {
            return Err(PreconditionError::UnknownColumn {
                column: card.column.clone(),
            }
            .into());
        }
        let context = session.context();

        let created = self.remote.create_card(context.project_id, card).await?;
        match self.session_for(context) {
            Some(session) => {
                session.apply_card(created.clone());
                Ok(Some(created))
            }
            None => Ok(None),
        }
    }

    // ── Deletion and mark-read (FireAndForget) ──────────────────────────

    /// Remove the card locally and issue the delete. The caller has
    /// already confirmed; a remote failure is surfaced but the local
    /// removal stands (the delete is treated as idempotent).
    pub async fn delete_card(&mut self, card_id: i64) -> Result<(), EngineError> {
        let removed = self.active()?.stage_delete(card_id)?;
        debug!(card_id = removed.id, "optimistically removed card");
        if let Err(err) = self.remote.delete_card(card_id).await {
            warn!(%err, card_id, "delete request failed; local removal stands");
            return Err(EngineError::Remote(err));
        }
        Ok(())
    }

    /// Zero the unread counter locally and notify the server.
    pub async fn mark_read(&mut self) -> Result<(), EngineError> {
        let session = self.active()?;
        session.clear_unread();
        let project_id = session.project().id;
        if let Err(err) = self.remote.mark_read(project_id).await {
            warn!(%err, project_id, "mark-read request failed; local counter stands");
            return Err(EngineError::Remote(err));
        }
        Ok(())
    }

    // ── Filter view ─────────────────────────────────────────────────────

    /// Run a search and replace the working card set wholesale. Returns
    /// `false` when the response was stale-dropped.
    pub async fn apply_search(&mut self, filter: &CardFilter) -> Result<bool, EngineError> {
        let context = self.active()?.context();
        let cards = self.remote.search_cards(context.project_id, filter).await?;
        match self.session_for(context) {
            Some(session) => {
                session.replace_cards(cards);
                Ok(true)
            }
            None => {
                debug!("dropping search response for inactive project");
                Ok(false)
            }
        }
    }

    // ── Chat requests (history + send; delivery arrives via push) ───────

    pub async fn fetch_messages(&mut self) -> Result<MessagePage, EngineError> {
        let project_id = self.active()?.project().id;
        Ok(self.remote.fetch_messages(project_id).await?)
    }

    pub async fn send_message(&mut self, content: &str) -> Result<ChatMessage, EngineError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let project_id = self.active()?.project().id;
        Ok(self.remote.send_message(project_id, content).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_kinds_are_declared_per_operation() {
        assert_eq!(
            MutationOp::Reorder.kind(),
            MutationKind::OptimisticWithSnapshot
        );
        assert_eq!(MutationOp::EditCard.kind(), MutationKind::NonOptimistic);
        assert_eq!(MutationOp::CreateCard.kind(), MutationKind::NonOptimistic);
        assert_eq!(MutationOp::DeleteCard.kind(), MutationKind::FireAndForget);
        assert_eq!(MutationOp::MarkRead.kind(), MutationKind::FireAndForget);
    }
}
