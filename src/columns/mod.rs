//! Column lifecycle management.
//!
//! [`ColumnDraft`] is the working copy of the committed column list edited
//! in the column-manager dialog: `Closed -> Editing -> Closed` with the
//! draft discarded on cancel and sent as one full ordered list on commit.
//! The committed flows (draft commit, direct add/delete, and
//! rename-with-migration) live on [`BoardClient`] so they can pair the
//! remote requests with session reconciliation.

use tracing::{debug, info, warn};

use crate::engine::BoardClient;
use crate::errors::{EngineError, PreconditionError, ValidationError};
use crate::model::BoardModel;
use crate::remote::{CardPatch, RemoteService};

/// Transient ordered list of column names, decoupled from the committed
/// project until commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDraft {
    entries: Vec<String>,
}

impl ColumnDraft {
    pub fn from_committed(columns: &[String]) -> Self {
        Self {
            entries: columns.to_vec(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a trimmed, non-blank name. Duplicates (case-sensitive exact
    /// match) are rejected without mutating the draft.
    pub fn add(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankColumnName);
        }
        if self.entries.iter().any(|e| e == name) {
            return Err(ValidationError::DuplicateColumnName {
                name: name.to_string(),
            });
        }
        self.entries.push(name.to_string());
        Ok(())
    }

    /// In-place text replacement of a slot. No uniqueness check until
    /// commit; blank input leaves the slot unchanged.
    pub fn rename(&mut self, index: usize, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        match self.entries.get_mut(index) {
            Some(entry) => {
                *entry = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Delete a slot. The draft must retain at least one column, and a
    /// column that still owns cards in the committed model cannot be
    /// deleted — committing that draft would orphan them.
    pub fn remove(&mut self, index: usize, board: &BoardModel) -> Result<String, PreconditionError> {
        let Some(name) = self.entries.get(index).cloned() else {
            return Err(PreconditionError::UnknownColumn {
                column: format!("#{index}"),
            });
        };
        if self.entries.len() <= 1 {
            return Err(PreconditionError::LastColumn);
        }
        let cards = board.count_in_column(&name);
        if cards > 0 {
            return Err(PreconditionError::ColumnNotEmpty { column: name, cards });
        }
        Ok(self.entries.remove(index))
    }

    /// Move a slot by offset; always legal, out-of-range moves clamp.
    pub fn shift(&mut self, index: usize, offset: isize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        let target = (index as isize + offset).clamp(0, self.entries.len() as isize - 1) as usize;
        if target == index {
            return false;
        }
        let entry = self.entries.remove(index);
        self.entries.insert(target, entry);
        true
    }

    /// Free-form reorder from a drag interaction.
    pub fn set_order(&mut self, entries: Vec<String>) {
        self.entries = entries;
    }

    /// Commit-time validation: no blank entries, no duplicate names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.trim().is_empty() {
                return Err(ValidationError::BlankColumnName);
            }
            if self.entries[..i].contains(entry) {
                return Err(ValidationError::DuplicateColumnName {
                    name: entry.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The dialog-lifetime state machine around the draft.
#[derive(Debug, Default)]
pub struct ColumnManager {
    draft: Option<ColumnDraft>,
}

impl ColumnManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Open (or reopen) the editor with a copy of the committed columns.
    pub fn open(&mut self, committed: &[String]) -> &mut ColumnDraft {
        self.draft.insert(ColumnDraft::from_committed(committed))
    }

    pub fn draft(&self) -> Option<&ColumnDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ColumnDraft> {
        self.draft.as_mut()
    }

    /// Discard the draft; the committed columns are untouched.
    pub fn cancel(&mut self) -> bool {
        self.draft.take().is_some()
    }

    fn close(&mut self) {
        self.draft = None;
    }
}

impl<R: RemoteService> BoardClient<R> {
    /// Commit the open draft as the project's new column list. Validation
    /// failures send nothing and keep the draft open; remote rejection
    /// also keeps it open so the user can retry or cancel.
    pub async fn commit_columns(&mut self, manager: &mut ColumnManager) -> Result<(), EngineError> {
        let session = self
            .session()
            .ok_or(PreconditionError::NoActiveProject)?;
        let Some(draft) = manager.draft() else {
            return Ok(());
        };
        draft.validate()?;
        let context = session.context();
        let entries = draft.entries().to_vec();

        let project = self.remote().update_columns(context.project_id, &entries).await?;
        if let Some(session) = self.session_for(context) {
            session.adopt_project(project);
        }
        manager.close();
        info!(columns = entries.len(), "committed column list");
        Ok(())
    }

    /// Direct add affordance outside the draft editor: validate against
    /// the committed list, then commit `columns + [name]` in one request.
    pub async fn add_column(&mut self, name: &str) -> Result<(), EngineError> {
        let session = self
            .session()
            .ok_or(PreconditionError::NoActiveProject)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankColumnName.into());
        }
        if session.project().columns.iter().any(|c| c == name) {
            return Err(ValidationError::DuplicateColumnName {
                name: name.to_string(),
            }
            .into());
        }
        let context = session.context();
        let mut columns = session.project().columns.clone();
        columns.push(name.to_string());

        let project = self.remote().update_columns(context.project_id, &columns).await?;
        if let Some(session) = self.session_for(context) {
            session.adopt_project(project);
        }
        Ok(())
    }

    /// The direct-delete precondition, checked from local state before
    /// the caller's confirmation prompt ever fires: the column must exist
    /// and hold no cards.
    pub fn precheck_delete_column(&self, name: &str) -> Result<(), EngineError> {
        let session = self
            .session()
            .ok_or(PreconditionError::NoActiveProject)?;
        if !session.project().columns.iter().any(|c| c == name) {
            return Err(PreconditionError::UnknownColumn {
                column: name.to_string(),
            }
            .into());
        }
        let cards = session.board().count_in_column(name);
        if cards > 0 {
            return Err(PreconditionError::ColumnNotEmpty {
                column: name.to_string(),
                cards,
            }
            .into());
        }
        Ok(())
    }

    /// Direct single-column delete affordance outside the draft editor;
    /// the request carries the remaining full column list.
    pub async fn delete_column(&mut self, name: &str) -> Result<(), EngineError> {
        self.precheck_delete_column(name)?;
        let session = self
            .session()
            .ok_or(PreconditionError::NoActiveProject)?;
        let context = session.context();
        let columns: Vec<String> = session
            .project()
            .columns
            .iter()
            .filter(|c| *c != name)
            .cloned()
            .collect();

        let project = self.remote().update_columns(context.project_id, &columns).await?;
        if let Some(session) = self.session_for(context) {
            session.adopt_project(project);
        }
        Ok(())
    }

    /// Rename a committed column, migrating its cards: one card-update
    /// request per referencing card, then the column-list commit, in that
    /// order. A failure partway leaves the known inconsistency window —
    /// no compensation is attempted; the error reports how far it got.
    pub async fn rename_column(&mut self, old: &str, new: &str) -> Result<(), EngineError> {
        let session = self
            .session()
            .ok_or(PreconditionError::NoActiveProject)?;
        let new = new.trim();
        if new.is_empty() {
            return Err(ValidationError::BlankColumnName.into());
        }
        if new == old {
            return Ok(());
        }
        if !session.project().columns.iter().any(|c| c == old) {
            return Err(PreconditionError::UnknownColumn {
                column: old.to_string(),
            }
            .into());
        }
        if session.project().columns.iter().any(|c| c == new) {
            return Err(ValidationError::DuplicateColumnName {
                name: new.to_string(),
            }
            .into());
        }
        let context = session.context();
        let columns: Vec<String> = session
            .project()
            .columns
            .iter()
            .map(|c| if c == old { new.to_string() } else { c.clone() })
            .collect();
        let card_ids: Vec<i64> = session
            .board()
            .cards_in_column(old)
            .iter()
            .map(|c| c.id)
            .collect();
        let total = card_ids.len();

        let patch = CardPatch::column(new);
        for (migrated, card_id) in card_ids.into_iter().enumerate() {
            let updated = self.remote().update_card(card_id, &patch).await;
            match updated {
                Ok(card) => {
                    if let Some(session) = self.session_for(context) {
                        session.apply_card(card);
                    }
                }
                Err(source) => {
                    warn!(card_id, migrated, total, "rename migration stopped partway");
                    return Err(EngineError::RenameMigration {
                        column: old.to_string(),
                        migrated,
                        total,
                        source,
                    });
                }
            }
        }

        let committed = self.remote().update_columns(context.project_id, &columns).await;
        match committed {
            Ok(project) => {
                if let Some(session) = self.session_for(context) {
                    session.adopt_project(project);
                }
                debug!(old, new, total, "renamed column");
                Ok(())
            }
            Err(source) => Err(EngineError::RenameMigration {
                column: old.to_string(),
                migrated: total,
                total,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;

    fn card(id: i64, column: &str) -> Card {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "project_id": 1,
            "title": format!("card-{id}"),
            "column": column,
            "position": 0,
        }))
        .unwrap()
    }

    fn committed() -> Vec<String> {
        vec!["待办".to_string(), "进行中".to_string(), "已完成".to_string()]
    }

    #[test]
    fn add_trims_and_appends() {
        let mut draft = ColumnDraft::from_committed(&committed());
        draft.add("  评审  ").unwrap();
        assert_eq!(draft.entries().last().unwrap(), "评审");
    }

    #[test]
    fn add_rejects_blank_without_change() {
        let mut draft = ColumnDraft::from_committed(&committed());
        assert_eq!(draft.add("   "), Err(ValidationError::BlankColumnName));
        assert_eq!(draft.len(), 3);
    }

    #[test]
    fn add_rejects_case_sensitive_duplicate_without_change() {
        let mut draft = ColumnDraft::from_committed(&["Todo".to_string()]);
        assert!(matches!(
            draft.add("Todo"),
            Err(ValidationError::DuplicateColumnName { .. })
        ));
        assert_eq!(draft.entries(), &["Todo".to_string()]);
        // Differing case is a different name.
        draft.add("todo").unwrap();
        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn rename_is_unchecked_until_commit() {
        let mut draft = ColumnDraft::from_committed(&committed());
        assert!(draft.rename(0, "进行中"));
        assert_eq!(draft.entries()[0], "进行中");
        // Duplicate only surfaces at commit time.
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::DuplicateColumnName { .. })
        ));
    }

    #[test]
    fn rename_ignores_blank_and_out_of_range() {
        let mut draft = ColumnDraft::from_committed(&committed());
        assert!(!draft.rename(0, "  "));
        assert!(!draft.rename(9, "x"));
        assert_eq!(draft.entries(), committed().as_slice());
    }

    #[test]
    fn remove_blocks_on_cards_in_committed_model() {
        let board = BoardModel::new(vec![card(1, "待办"), card(2, "待办")]);
        let mut draft = ColumnDraft::from_committed(&committed());
        let err = draft.remove(0, &board).unwrap_err();
        assert_eq!(
            err,
            PreconditionError::ColumnNotEmpty {
                column: "待办".to_string(),
                cards: 2
            }
        );
        assert_eq!(draft.len(), 3);
    }

    #[test]
    fn remove_requires_a_remaining_column() {
        let board = BoardModel::default();
        let mut draft = ColumnDraft::from_committed(&["待办".to_string()]);
        assert_eq!(draft.remove(0, &board), Err(PreconditionError::LastColumn));
    }

    #[test]
    fn remove_succeeds_for_empty_column() {
        let board = BoardModel::new(vec![card(1, "待办")]);
        let mut draft = ColumnDraft::from_committed(&committed());
        assert_eq!(draft.remove(2, &board).unwrap(), "已完成");
        assert_eq!(draft.entries(), &["待办".to_string(), "进行中".to_string()]);
    }

    #[test]
    fn shift_moves_and_clamps() {
        let mut draft = ColumnDraft::from_committed(&committed());
        assert!(draft.shift(2, -1));
        assert_eq!(
            draft.entries(),
            &[
                "待办".to_string(),
                "已完成".to_string(),
                "进行中".to_string()
            ]
        );
        // Clamped at the edge: no change reported.
        assert!(!draft.shift(0, -1));
    }

    #[test]
    fn validate_catches_blanks_and_duplicates() {
        let mut draft = ColumnDraft::from_committed(&committed());
        draft.set_order(vec!["待办".to_string(), " ".to_string()]);
        assert_eq!(draft.validate(), Err(ValidationError::BlankColumnName));

        draft.set_order(vec!["待办".to_string(), "待办".to_string()]);
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::DuplicateColumnName { .. })
        ));

        draft.set_order(committed());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn manager_round_trip_cancel_leaves_committed_untouched() {
        let committed = committed();
        let mut manager = ColumnManager::new();
        assert!(!manager.is_editing());

        let draft = manager.open(&committed);
        draft.shift(0, 2);
        draft.add("评审").unwrap();
        assert!(manager.is_editing());

        assert!(manager.cancel());
        assert!(!manager.is_editing());
        assert!(manager.draft().is_none());
        // The source list the draft was opened from is unaffected.
        assert_eq!(committed, vec!["待办", "进行中", "已完成"]);
    }
}
