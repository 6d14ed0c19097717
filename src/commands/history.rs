use crate::cli::HistoryCommand;
use crate::error::{ChatError, Result};
use crate::storage::{Role, SqliteStorage};
use colored::Colorize;
use prettytable::{format, Table};

const TITLE_COLUMN_CHARS: usize = 40;

/// Handle history commands
pub fn handle_history(command: HistoryCommand, storage: &SqliteStorage) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let sessions = storage.list_sessions()?;

            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for session in sessions {
                let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();
                table.add_row(prettytable::row![
                    session.session_id.cyan(),
                    shorten_title(&session.title),
                    session.message_count,
                    updated
                ]);
            }

            println!("\nChat Sessions:");
            table.printstd();
            println!();
            println!(
                "Use {} to read a session.",
                "chatrelay history show <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let session = storage
                .get_session(&id)?
                .ok_or_else(|| ChatError::NotFound(format!("Session not found: {}", id)))?;

            println!(
                "\n{} {}",
                session.title.bold(),
                format!("({} messages)", session.message_count).dimmed()
            );
            println!();

            for message in storage.list_messages(Some(&id))? {
                let speaker = match message.role {
                    Role::User => "you".green().bold(),
                    Role::Ai => "ai".blue().bold(),
                };
                let at = message.created_at.format("%H:%M:%S").to_string();
                println!("[{}] {}: {}", at.dimmed(), speaker, message.content);
            }
            println!();
        }
        HistoryCommand::Delete { id } => {
            if storage.get_session(&id)?.is_none() {
                println!("{}", format!("No session with id {}", id).yellow());
                return Ok(());
            }
            storage.delete_session(&id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
    }

    Ok(())
}

/// Fit a title into the list table
fn shorten_title(title: &str) -> String {
    if title.chars().count() > TITLE_COLUMN_CHARS {
        let head: String = title.chars().take(TITLE_COLUMN_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
