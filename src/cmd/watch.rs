//! Live project view — `lanes watch`: join the push channel, stream chat
//! and typing notices, send messages from stdin.

use std::time::Instant;

use anyhow::Result;
use console::style;
use tokio::io::AsyncBufReadExt;

use lanes::config::ClientConfig;
use lanes::push::{PushChannel, PushEvent, PushMerger};
use lanes::ui::{self, Notice};

use super::authenticated_client;

pub async fn cmd_watch(config: &ClientConfig, project: i64) -> Result<()> {
    let mut client = authenticated_client(config)?;
    let user = client.remote().me().await?;
    client.open_project(project).await?;

    if client
        .session()
        .map(|s| s.project().unread_count > 0)
        .unwrap_or(false)
    {
        if let Err(err) = client.mark_read().await {
            Notice::from_engine_error(&err).emit();
        }
    }

    // Connect first, then fetch history: events racing the fetch are
    // merged by id when the history lands.
    let mut channel = PushChannel::connect(&config.ws_endpoint(), project, user.id).await?;
    let mut merger = PushMerger::new();
    merger.set_chat_open(true);

    let history = client.fetch_messages().await?;
    merger.chat.load_history(history.messages);
    for message in merger.chat.messages() {
        ui::print_message(message);
    }
    println!(
        "{}",
        style("-- connected; type a message, Ctrl-D to leave --").dim()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let typing_deadline = merger
            .typing
            .deadline()
            .map(tokio::time::Instant::from_std);

        tokio::select! {
            event = channel.recv() => {
                let Some(event) = event else {
                    Notice::warning("Push channel closed.").emit();
                    break;
                };
                let now = Instant::now();
                let was_typing = merger.typing.visible_at(now).is_some();
                if let Some(session) = client.session_mut() {
                    merger.ingest(session, event.clone(), now);
                }
                match event {
                    PushEvent::NewMessage(message) => ui::print_message(&message),
                    PushEvent::UserTyping { username } => {
                        if !was_typing {
                            println!("{}", style(format!("{username} is typing…")).dim());
                        }
                    }
                }
            }

            line = lines.next_line() => {
                match line? {
                    Some(line) if !line.trim().is_empty() => {
                        if let Err(err) = channel.send_typing(&user.username).await {
                            Notice::warning(err.to_string()).emit();
                        }
                        if let Err(err) = client.send_message(line.trim()).await {
                            Notice::from_engine_error(&err).emit();
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            }

            _ = async {
                match typing_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                merger.typing.expire(Instant::now());
            }
        }
    }

    channel.disconnect().await;
    client.close_project();
    Ok(())
}
