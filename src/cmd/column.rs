//! Column management — `lanes columns <project> ...`.

use anyhow::Result;
use dialoguer::Confirm;

use lanes::config::ClientConfig;
use lanes::ui::Notice;

use super::authenticated_client;
use crate::ColumnCommands;

pub async fn cmd_columns(
    config: &ClientConfig,
    project: i64,
    command: &ColumnCommands,
) -> Result<()> {
    let mut client = authenticated_client(config)?;
    client.open_project(project).await?;

    match command {
        ColumnCommands::List => {
            if let Some(session) = client.session() {
                for (i, column) in session.project().columns.iter().enumerate() {
                    let count = session.board().count_in_column(column);
                    println!("{:>3}  {}  ({count} cards)", i, column);
                }
            }
        }
        ColumnCommands::Add { name } => match client.add_column(name).await {
            Ok(()) => Notice::success(format!("Added column \"{}\"", name.trim())).emit(),
            Err(err) => Notice::from_engine_error(&err).emit(),
        },
        ColumnCommands::Delete { name, yes } => {
            // The no-cards precondition runs before the prompt, so the
            // user is never asked to confirm a doomed deletion.
            if let Err(err) = client.precheck_delete_column(name) {
                Notice::from_engine_error(&err).emit();
                return Ok(());
            }
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete column \"{name}\"?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    return Ok(());
                }
            }
            match client.delete_column(name).await {
                Ok(()) => Notice::success(format!("Deleted column \"{name}\"")).emit(),
                Err(err) => Notice::from_engine_error(&err).emit(),
            }
        }
        ColumnCommands::Rename { old, new } => match client.rename_column(old, new).await {
            Ok(()) => Notice::success(format!("Renamed \"{old}\" to \"{new}\"")).emit(),
            Err(err) => Notice::from_engine_error(&err).emit(),
        },
    }
    Ok(())
}
