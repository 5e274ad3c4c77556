//! Terminal rendering for the CLI: the board view, project listings and
//! chat lines. Presentation only — no state lives here.

pub mod notice;

pub use notice::{Notice, NoticeLevel};

use chrono::Utc;
use console::style;

use crate::engine::Session;
use crate::model::{Card, ChatMessage, DueState, Project};

/// One line per project, with the unread badge when relevant.
pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects yet.");
        return;
    }
    for project in projects {
        let unread = if project.unread_count > 0 {
            format!(" {}", style(format!("[{} unread]", project.unread_count)).red())
        } else {
            String::new()
        };
        println!(
            "{:>4}  {}{}  {}",
            style(project.id).dim(),
            style(&project.name).bold(),
            unread,
            style(project.description.as_deref().unwrap_or("")).dim(),
        );
    }
}

/// Render the full board: each committed column in order with its cards
/// sorted by position.
pub fn print_board(session: &Session) {
    let project = session.project();
    println!("{}", style(&project.name).bold().underlined());
    if let Some(desc) = project.description.as_deref() {
        if !desc.is_empty() {
            println!("{}", style(desc).dim());
        }
    }
    println!();

    let now = Utc::now();
    for column in &project.columns {
        let cards = session.board().cards_in_column(column);
        println!("{} {}", style(column).cyan().bold(), style(cards.len()).dim());
        for card in cards {
            print_card_line(card, now);
        }
        println!();
    }
}

fn print_card_line(card: &Card, now: chrono::DateTime<Utc>) {
    let check = if card.completed {
        style("[x]").green()
    } else {
        style("[ ]").dim()
    };
    let due = match card.due_state(now) {
        DueState::Overdue => format!(" {}", style("overdue").red()),
        DueState::Soon => format!(" {}", style("due soon").yellow()),
        _ => String::new(),
    };
    let attachments = if card.attachments.is_empty() {
        String::new()
    } else {
        format!(" ({} files)", card.attachments.len())
    };
    println!(
        "  {} {:>4}  {}{}{}",
        check,
        style(card.id).dim(),
        card.title,
        due,
        style(attachments).dim(),
    );
}

/// One chat line: `[time] sender: text (file)`.
pub fn print_message(message: &ChatMessage) {
    let time = message
        .created_at
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let file = message
        .file_name
        .as_deref()
        .map(|name| format!(" {}", style(format!("<{name}>")).magenta()))
        .unwrap_or_default();
    println!(
        "{} {}: {}{}",
        style(format!("[{time}]")).dim(),
        style(message.sender_name()).bold(),
        message.content.as_deref().unwrap_or(""),
        file,
    );
}
