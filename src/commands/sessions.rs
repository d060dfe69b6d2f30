use crate::chat::ChatStore;
use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::{ChatBridgeError, Result};
use crate::storage::{ChatMessage, Role, SqliteStorage};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle session management commands
pub fn handle_sessions(command: SessionCommand, config: &Config) -> Result<()> {
    let mut store = super::open_store(config)?;

    match command {
        SessionCommand::List => list_sessions(&store),
        SessionCommand::New => {
            let session = store.create_session();
            println!(
                "{} {} ({})",
                "Created".green(),
                session.name,
                session.id.cyan()
            );
            Ok(())
        }
        SessionCommand::Rename { id, name } => {
            if !store.rename_session(&id, &name) {
                return Err(ChatBridgeError::InvalidRequest(format!("Unknown session: {}", id)).into());
            }
            println!("{}", format!("Renamed session {} to {}", id, name).green());
            Ok(())
        }
        SessionCommand::Delete { id } => {
            if !store.delete_session(&id) {
                println!("{}", format!("Session {} not found.", id).yellow());
                return Ok(());
            }
            println!("{}", format!("Deleted session {}", id).green());
            Ok(())
        }
        SessionCommand::Show { id } => {
            let id = super::select_session(&mut store, id.as_deref())?;
            print_history(&id, store.history());
            Ok(())
        }
    }
}

fn list_sessions(store: &ChatStore<SqliteStorage>) -> Result<()> {
    let sessions = store.sessions_by_recency();

    if sessions.is_empty() {
        println!("{}", "No chat sessions found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let name = if session.name.chars().count() > 40 {
            format!("{}...", session.name.chars().take(37).collect::<String>())
        } else {
            session.name.clone()
        };
        let messages = store.peek_history(&session.id).len();
        let updated = session
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![session.id.cyan(), name, messages, updated]);
    }

    println!("\nChat Sessions:");
    table.printstd();
    println!();
    println!(
        "Use {} to continue a session.",
        "chatbridge chat --session <ID> send <MESSAGE>".cyan()
    );
    println!();
    Ok(())
}

fn print_history(session_id: &str, history: &[ChatMessage]) {
    println!("\nSession {}\n", session_id.cyan());

    if history.is_empty() {
        println!("{}", "No messages yet.".yellow());
        return;
    }

    for message in history {
        let label = match message.role {
            Role::User => "you".green().bold(),
            Role::Assistant => "assistant".blue().bold(),
        };
        println!(
            "[{}] {} {}",
            message.timestamp.with_timezone(&chrono::Local).format("%H:%M"),
            label,
            message.id.dimmed()
        );
        println!("{}\n", message.content);
    }
}
