//! Project listing and board view — `lanes projects`, `lanes board`.

use anyhow::Result;

use lanes::config::ClientConfig;
use lanes::filter::{CardFilter, StatusFilter};
use lanes::ui;

use super::authenticated_client;

pub async fn cmd_projects(config: &ClientConfig) -> Result<()> {
    let client = authenticated_client(config)?;
    let projects = client.list_projects().await?;
    ui::print_projects(&projects);
    Ok(())
}

pub async fn cmd_board(
    config: &ClientConfig,
    project: i64,
    query: Option<&str>,
    status: &str,
    include_attachments: bool,
) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    let filter = CardFilter {
        query: query.unwrap_or("").to_string(),
        status: status.parse::<StatusFilter>().map_err(anyhow::Error::msg)?,
        include_attachments,
        ..Default::default()
    };
    if !filter.is_empty() || filter.include_attachments {
        client.apply_search(&filter).await?;
    }

    let session = client
        .session()
        .ok_or_else(|| anyhow::anyhow!("project session unavailable"))?;
    ui::print_board(session);
    Ok(())
}
