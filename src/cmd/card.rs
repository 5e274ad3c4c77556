//! Card mutations — `lanes add`, `lanes move`, `lanes done`, `lanes delete`.

use anyhow::{Result, anyhow};
use dialoguer::Confirm;

use lanes::config::ClientConfig;
use lanes::remote::{CardPatch, NewCard};
use lanes::ui::Notice;

use super::authenticated_client;

pub async fn cmd_add(
    config: &ClientConfig,
    project: i64,
    title: &str,
    column: Option<&str>,
) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    let column = match column {
        Some(column) => column.to_string(),
        None => client
            .session()
            .and_then(|s| s.project().columns.first().cloned())
            .ok_or_else(|| anyhow!("project has no columns"))?,
    };

    let card = NewCard {
        title: title.to_string(),
        column,
        ..Default::default()
    };
    match client.create_card(&card).await {
        Ok(Some(created)) => {
            Notice::success(format!("Created card {} in {}", created.id, created.column)).emit();
        }
        Ok(None) => {}
        Err(err) => Notice::from_engine_error(&err).emit(),
    }
    Ok(())
}

pub async fn cmd_move(
    config: &ClientConfig,
    project: i64,
    card: i64,
    column: &str,
    index: usize,
) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    match client.move_card(card, column, index).await {
        Ok(_) => Notice::success(format!("Moved card {card} to {column}[{index}]")).emit(),
        Err(err) => Notice::from_engine_error(&err).emit(),
    }
    Ok(())
}

pub async fn cmd_done(config: &ClientConfig, project: i64, card: i64) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    let completed = client
        .session()
        .and_then(|s| s.board().get(card))
        .map(|c| c.completed)
        .ok_or_else(|| anyhow!("card {card} not found"))?;

    match client.edit_card(card, &CardPatch::completed(!completed)).await {
        Ok(Some(updated)) => {
            let verb = if updated.completed { "done" } else { "reopened" };
            Notice::success(format!("Card {} marked {}", updated.id, verb)).emit();
        }
        Ok(None) => {}
        Err(err) => Notice::from_engine_error(&err).emit(),
    }
    Ok(())
}

pub async fn cmd_delete(config: &ClientConfig, project: i64, card: i64, yes: bool) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    let title = client
        .session()
        .and_then(|s| s.board().get(card))
        .map(|c| c.title.clone())
        .ok_or_else(|| anyhow!("card {card} not found"))?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete card \"{title}\"?"))
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    // Fire-and-forget: the local removal stands even if the request fails.
    match client.delete_card(card).await {
        Ok(()) => Notice::success(format!("Deleted card {card}")).emit(),
        Err(err) => Notice::from_engine_error(&err).emit(),
    }
    Ok(())
}
