//! Integration tests for the board client.
//!
//! Engine flows run end-to-end against a scripted in-memory remote that
//! records every request; CLI basics run against the built binary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use lanes::columns::ColumnManager;
use lanes::engine::{BoardClient, ReorderResolution};
use lanes::errors::{EngineError, PreconditionError};
use lanes::filter::CardFilter;
use lanes::model::{Card, ChatMessage, Project, ProjectDetail};
use lanes::remote::{
    CardPatch, CardPlacement, MessagePage, NewCard, RemoteError, RemoteService,
};

// =============================================================================
// Scripted remote
// =============================================================================

/// Every request the engine issued, in order.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    FetchProject(i64),
    Reorder(Vec<CardPlacement>),
    CreateCard { project: i64, title: String },
    UpdateCard { card: i64, column: Option<String> },
    DeleteCard(i64),
    UpdateColumns { project: i64, columns: Vec<String> },
    Search(i64),
    FetchMessages(i64),
    SendMessage { project: i64, content: String },
    MarkRead(i64),
}

#[derive(Default)]
struct MockRemote {
    calls: Mutex<Vec<Call>>,
    /// Successive fetch_project responses; the last one repeats.
    details: Mutex<Vec<ProjectDetail>>,
    /// Server-side card store backing canonical update responses.
    cards: Mutex<HashMap<i64, Card>>,
    next_card_id: Mutex<i64>,
    search_results: Mutex<Vec<Card>>,
    fail_reorder: Mutex<bool>,
    fail_update_cards: Mutex<Vec<i64>>,
    fail_delete: Mutex<bool>,
    fail_update_columns: Mutex<bool>,
}

impl MockRemote {
    fn with_detail(detail: ProjectDetail) -> Self {
        let remote = Self::default();
        {
            let mut cards = remote.cards.lock().unwrap();
            for card in &detail.cards {
                cards.insert(card.id, card.clone());
            }
        }
        *remote.next_card_id.lock().unwrap() = 1000;
        remote.details.lock().unwrap().push(detail);
        remote
    }

    fn push_detail(&self, detail: ProjectDetail) {
        self.details.lock().unwrap().push(detail);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn rejected() -> RemoteError {
        RemoteError::Rejected {
            status: 400,
            message: "rejected by test".to_string(),
        }
    }
}

#[async_trait]
impl RemoteService for MockRemote {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        Ok(self
            .details
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.project.clone())
            .collect())
    }

    async fn fetch_project(&self, project_id: i64) -> Result<ProjectDetail, RemoteError> {
        self.record(Call::FetchProject(project_id));
        let mut details = self.details.lock().unwrap();
        if details.len() > 1 {
            Ok(details.remove(0))
        } else {
            details.first().cloned().ok_or_else(|| RemoteError::Rejected {
                status: 404,
                message: "no project scripted".to_string(),
            })
        }
    }

    async fn reorder_cards(&self, placements: &[CardPlacement]) -> Result<(), RemoteError> {
        self.record(Call::Reorder(placements.to_vec()));
        if *self.fail_reorder.lock().unwrap() {
            return Err(Self::rejected());
        }
        let mut cards = self.cards.lock().unwrap();
        for placement in placements {
            if let Some(card) = cards.get_mut(&placement.id) {
                card.column.clone_from(&placement.column);
                card.position = placement.position;
            }
        }
        Ok(())
    }

    async fn create_card(&self, project_id: i64, card: &NewCard) -> Result<Card, RemoteError> {
        self.record(Call::CreateCard {
            project: project_id,
            title: card.title.clone(),
        });
        let mut next_id = self.next_card_id.lock().unwrap();
        *next_id += 1;
        let created: Card = serde_json::from_value(serde_json::json!({
            "id": *next_id,
            "project_id": project_id,
            "title": card.title,
            "column": card.column,
            "position": -1,
        }))
        .unwrap();
        self.cards.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_card(&self, card_id: i64, patch: &CardPatch) -> Result<Card, RemoteError> {
        self.record(Call::UpdateCard {
            card: card_id,
            column: patch.column.clone(),
        });
        if self.fail_update_cards.lock().unwrap().contains(&card_id) {
            return Err(Self::rejected());
        }
        let mut cards = self.cards.lock().unwrap();
        let card = cards.get_mut(&card_id).ok_or_else(|| RemoteError::Rejected {
            status: 404,
            message: "card not found".to_string(),
        })?;
        if let Some(title) = &patch.title {
            card.title.clone_from(title);
        }
        if let Some(column) = &patch.column {
            card.column.clone_from(column);
        }
        if let Some(completed) = patch.completed {
            card.completed = completed;
        }
        Ok(card.clone())
    }

    async fn delete_card(&self, card_id: i64) -> Result<(), RemoteError> {
        self.record(Call::DeleteCard(card_id));
        if *self.fail_delete.lock().unwrap() {
            return Err(Self::rejected());
        }
        self.cards.lock().unwrap().remove(&card_id);
        Ok(())
    }

    async fn update_columns(
        &self,
        project_id: i64,
        columns: &[String],
    ) -> Result<Project, RemoteError> {
        self.record(Call::UpdateColumns {
            project: project_id,
            columns: columns.to_vec(),
        });
        if *self.fail_update_columns.lock().unwrap() {
            return Err(Self::rejected());
        }
        let details = self.details.lock().unwrap();
        let mut project = details
            .first()
            .map(|d| d.project.clone())
            .ok_or_else(Self::rejected)?;
        project.columns = columns.to_vec();
        Ok(project)
    }

    async fn search_cards(
        &self,
        project_id: i64,
        _filter: &CardFilter,
    ) -> Result<Vec<Card>, RemoteError> {
        self.record(Call::Search(project_id));
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn fetch_messages(&self, project_id: i64) -> Result<MessagePage, RemoteError> {
        self.record(Call::FetchMessages(project_id));
        Ok(MessagePage::default())
    }

    async fn send_message(
        &self,
        project_id: i64,
        content: &str,
    ) -> Result<ChatMessage, RemoteError> {
        self.record(Call::SendMessage {
            project: project_id,
            content: content.to_string(),
        });
        Ok(serde_json::from_value(serde_json::json!({
            "id": 1,
            "project_id": project_id,
            "user_id": 1,
            "content": content,
        }))
        .unwrap())
    }

    async fn mark_read(&self, project_id: i64) -> Result<(), RemoteError> {
        self.record(Call::MarkRead(project_id));
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn card(id: i64, column: &str, position: i64) -> Card {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "project_id": 1,
        "title": format!("card-{id}"),
        "column": column,
        "position": position,
    }))
    .unwrap()
}

fn detail(cards: Vec<Card>) -> ProjectDetail {
    serde_json::from_value(serde_json::json!({
        "id": 1,
        "name": "发布计划",
        "owner_id": 1,
        "columns": ["待办", "进行中", "已完成"],
        "cards": cards,
        "categories": [],
    }))
    .unwrap()
}

async fn open_client(remote: MockRemote) -> BoardClient<MockRemote> {
    let mut client = BoardClient::new(remote);
    client.open_project(1).await.unwrap();
    client
}

fn column_ids(client: &BoardClient<MockRemote>, column: &str) -> Vec<i64> {
    client
        .session()
        .unwrap()
        .board()
        .cards_in_column(column)
        .iter()
        .map(|c| c.id)
        .collect()
}

// =============================================================================
// Reorder flows
// =============================================================================

mod reorder {
    use super::*;

    #[tokio::test]
    async fn cross_column_move_submits_full_destination_batch() {
        // Card X (1) in 待办 at 0; Y (2) in 进行中 at 0. Dropping X at
        // index 1 must submit Y too, unmoved.
        let remote = MockRemote::with_detail(detail(vec![
            card(1, "待办", 0),
            card(2, "进行中", 0),
        ]));
        let mut client = open_client(remote).await;

        let resolution = client.move_card(1, "进行中", 1).await.unwrap();
        assert_eq!(resolution, ReorderResolution::Accepted);

        let calls = client.remote().calls();
        assert_eq!(
            calls[1],
            Call::Reorder(vec![
                CardPlacement {
                    id: 2,
                    column: "进行中".to_string(),
                    position: 0
                },
                CardPlacement {
                    id: 1,
                    column: "进行中".to_string(),
                    position: 1
                },
            ])
        );

        // Dense 0-based positions matching the submitted order.
        let positions: Vec<i64> = client
            .session()
            .unwrap()
            .board()
            .cards_in_column("进行中")
            .iter()
            .map(|c| c.position)
            .collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[tokio::test]
    async fn failed_reorder_rolls_back_to_known_good_state() {
        let remote = MockRemote::with_detail(detail(vec![
            card(1, "待办", 0),
            card(2, "进行中", 0),
        ]));
        *remote.fail_reorder.lock().unwrap() = true;
        let mut client = open_client(remote).await;

        let err = client.move_card(1, "进行中", 1).await.unwrap_err();
        assert!(matches!(err, EngineError::Remote(_)));

        assert_eq!(column_ids(&client, "待办"), vec![1]);
        assert_eq!(column_ids(&client, "进行中"), vec![2]);
    }

    #[tokio::test]
    async fn repeated_reorder_is_idempotent() {
        let remote =
            MockRemote::with_detail(detail(vec![card(1, "待办", 0), card(2, "待办", 1)]));
        let mut client = open_client(remote).await;

        client.move_card(2, "待办", 0).await.unwrap();
        let after_first = column_ids(&client, "待办");

        client.move_card(2, "待办", 0).await.unwrap();
        assert_eq!(column_ids(&client, "待办"), after_first);

        let calls = client.remote().calls();
        assert_eq!(calls[1], calls[2]);
    }

    #[tokio::test]
    async fn completions_for_a_closed_project_are_dropped() {
        let remote = MockRemote::with_detail(detail(vec![card(1, "待办", 0)]));
        remote.push_detail(detail(vec![card(9, "待办", 0)]));
        let mut client = open_client(remote).await;

        let ticket = client.stage_move(1, "进行中", 0).unwrap();

        // The user switches projects while the request is in flight.
        client.open_project(1).await.unwrap();

        let resolution = client.resolve_move(ticket, Ok(())).unwrap();
        assert_eq!(resolution, ReorderResolution::Stale);
        assert_eq!(column_ids(&client, "待办"), vec![9]);
    }
}

// =============================================================================
// Card edits, creation, deletion
// =============================================================================

mod cards {
    use super::*;

    #[tokio::test]
    async fn edit_applies_canonical_card_on_success() {
        let remote = MockRemote::with_detail(detail(vec![card(1, "待办", 0)]));
        let mut client = open_client(remote).await;

        let updated = client
            .edit_card(1, &CardPatch::completed(true))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.completed);
        assert!(client.session().unwrap().board().get(1).unwrap().completed);
    }

    #[tokio::test]
    async fn failed_edit_leaves_local_card_untouched() {
        let remote = MockRemote::with_detail(detail(vec![card(1, "待办", 0)]));
        remote.fail_update_cards.lock().unwrap().push(1);
        let mut client = open_client(remote).await;

        let err = client
            .edit_card(1, &CardPatch::completed(true))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Remote(_)));
        assert!(!client.session().unwrap().board().get(1).unwrap().completed);
    }

    #[tokio::test]
    async fn create_appends_only_after_server_assigns_id() {
        let remote = MockRemote::with_detail(detail(vec![]));
        let mut client = open_client(remote).await;

        let created = client
            .create_card(&NewCard {
                title: "写周报".to_string(),
                column: "待办".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id, 1001);
        assert_eq!(column_ids(&client, "待办"), vec![1001]);
    }

    #[tokio::test]
    async fn create_rejects_blank_title_before_any_request() {
        let remote = MockRemote::with_detail(detail(vec![]));
        let mut client = open_client(remote).await;

        let err = client
            .create_card(&NewCard {
                title: "  ".to_string(),
                column: "待办".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(client.remote().calls().len(), 1); // fetch_project only
    }

    #[tokio::test]
    async fn failed_delete_is_not_rolled_back() {
        let remote = MockRemote::with_detail(detail(vec![card(1, "待办", 0)]));
        *remote.fail_delete.lock().unwrap() = true;
        let mut client = open_client(remote).await;

        let err = client.delete_card(1).await.unwrap_err();
        assert!(matches!(err, EngineError::Remote(_)));
        // Fire-and-forget: the optimistic removal stands.
        assert!(client.session().unwrap().board().get(1).is_none());
    }
}

// =============================================================================
// Column lifecycle
// =============================================================================

mod columns {
    use super::*;

    #[tokio::test]
    async fn draft_commit_sends_full_ordered_list_once() {
        let remote = MockRemote::with_detail(detail(vec![]));
        let mut client = open_client(remote).await;

        let mut manager = ColumnManager::new();
        let committed = client.session().unwrap().project().columns.clone();
        let draft = manager.open(&committed);
        draft.add("评审").unwrap();
        draft.shift(3, -2);

        client.commit_columns(&mut manager).await.unwrap();
        assert!(!manager.is_editing());

        let calls = client.remote().calls();
        assert_eq!(
            calls[1],
            Call::UpdateColumns {
                project: 1,
                columns: vec![
                    "待办".to_string(),
                    "评审".to_string(),
                    "进行中".to_string(),
                    "已完成".to_string(),
                ],
            }
        );
        assert_eq!(
            client.session().unwrap().project().columns[1],
            "评审".to_string()
        );
    }

    #[tokio::test]
    async fn invalid_draft_sends_nothing_and_stays_open() {
        let remote = MockRemote::with_detail(detail(vec![]));
        let mut client = open_client(remote).await;

        let mut manager = ColumnManager::new();
        let committed = client.session().unwrap().project().columns.clone();
        let draft = manager.open(&committed);
        draft.rename(0, "进行中");

        let err = client.commit_columns(&mut manager).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(manager.is_editing());
        assert_eq!(client.remote().calls().len(), 1); // fetch_project only
    }

    #[tokio::test]
    async fn delete_precheck_blocks_non_empty_column_without_request() {
        let remote =
            MockRemote::with_detail(detail(vec![card(1, "待办", 0), card(2, "待办", 1)]));
        let mut client = open_client(remote).await;

        let err = client.precheck_delete_column("待办").unwrap_err();
        match err {
            EngineError::Precondition(PreconditionError::ColumnNotEmpty { cards, .. }) => {
                assert_eq!(cards, 2)
            }
            other => panic!("Expected ColumnNotEmpty, got {other:?}"),
        }
        let err = client.delete_column("待办").await.unwrap_err();
        assert!(matches!(err, EngineError::Precondition(_)));

        assert_eq!(client.remote().calls().len(), 1); // fetch_project only
        assert_eq!(client.session().unwrap().project().columns.len(), 3);
    }

    #[tokio::test]
    async fn rename_migrates_every_card_before_committing_columns() {
        let remote = MockRemote::with_detail(detail(vec![
            card(1, "进行中", 0),
            card(2, "进行中", 1),
            card(3, "待办", 0),
        ]));
        let mut client = open_client(remote).await;

        client.rename_column("进行中", "处理中").await.unwrap();

        let calls = client.remote().calls();
        assert_eq!(
            &calls[1..],
            &[
                Call::UpdateCard {
                    card: 1,
                    column: Some("处理中".to_string())
                },
                Call::UpdateCard {
                    card: 2,
                    column: Some("处理中".to_string())
                },
                Call::UpdateColumns {
                    project: 1,
                    columns: vec![
                        "待办".to_string(),
                        "处理中".to_string(),
                        "已完成".to_string(),
                    ],
                },
            ]
        );
        assert_eq!(column_ids(&client, "处理中"), vec![1, 2]);
    }

    #[tokio::test]
    async fn rename_partial_failure_reports_progress_and_stops() {
        let remote = MockRemote::with_detail(detail(vec![
            card(1, "进行中", 0),
            card(2, "进行中", 1),
        ]));
        remote.fail_update_cards.lock().unwrap().push(2);
        let mut client = open_client(remote).await;

        let err = client.rename_column("进行中", "处理中").await.unwrap_err();
        match err {
            EngineError::RenameMigration {
                migrated, total, ..
            } => {
                assert_eq!(migrated, 1);
                assert_eq!(total, 2);
            }
            other => panic!("Expected RenameMigration, got {other:?}"),
        }

        // The column-list commit never fired.
        assert!(!client
            .remote()
            .calls()
            .iter()
            .any(|c| matches!(c, Call::UpdateColumns { .. })));
        // Known inconsistency window: card 1 migrated, card 2 did not.
        assert_eq!(
            client.session().unwrap().board().get(1).unwrap().column,
            "处理中"
        );
        assert_eq!(
            client.session().unwrap().board().get(2).unwrap().column,
            "进行中"
        );
    }
}

// =============================================================================
// Filter view
// =============================================================================

mod filter_view {
    use super::*;

    #[tokio::test]
    async fn search_replaces_the_working_set_wholesale() {
        let remote =
            MockRemote::with_detail(detail(vec![card(1, "待办", 0), card(2, "进行中", 0)]));
        *remote.search_results.lock().unwrap() = vec![card(2, "进行中", 0)];
        let mut client = open_client(remote).await;

        let applied = client
            .apply_search(&CardFilter {
                query: "card-2".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(applied);
        assert!(client.session().unwrap().board().get(1).is_none());
        assert_eq!(column_ids(&client, "进行中"), vec![2]);
    }
}

// =============================================================================
// CLI basics
// =============================================================================

mod cli_basics {
    use assert_cmd::Command;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    fn lanes() -> Command {
        cargo_bin_cmd!("lanes")
    }

    #[test]
    fn test_lanes_help() {
        lanes()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("project board"));
    }

    #[test]
    fn test_lanes_version() {
        lanes().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        lanes().arg("frobnicate").assert().failure();
    }
}
