use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config;
use crate::models::{Conversation, Message, MessageStatus, Role};
use crate::services::export;
use crate::services::simulator::{self, SimulationHandle};
use crate::services::store::ChatStore;

/// Line-oriented terminal front end over an injected [`ChatStore`].
///
/// Bare input is submitted as a user message; `/`-prefixed input drives
/// the sidebar. One simulated reply may be live at a time — the shell
/// serializes submissions, the store does not.
pub struct App {
    store: ChatStore,
    active_stream: Option<SimulationHandle>,
}

impl App {
    pub fn new(store: ChatStore) -> Self {
        Self {
            store,
            active_stream: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{} — type a message, or /help for commands.", config::APP_NAME);
        self.render_sidebar();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if !self.handle_line(&line) {
                break;
            }
        }

        // Let a cancelled reply finalize before the process exits.
        if let Some(handle) = self.active_stream.take() {
            handle.cancel();
            handle.finished().await;
        }

        Ok(())
    }

    /// Dispatch one line of input. Returns `false` to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // Blank input never reaches the store; it just refreshes the
            // timeline, which is how streamed chunks become visible.
            self.render_timeline();
            return true;
        }

        if let Some(rest) = trimmed.strip_prefix('/') {
            let (command, argument) = match rest.split_once(char::is_whitespace) {
                Some((command, argument)) => (command, argument.trim()),
                None => (rest, ""),
            };
            return self.handle_command(command, argument);
        }

        self.submit(trimmed);
        true
    }

    fn handle_command(&mut self, command: &str, argument: &str) -> bool {
        match command {
            "quit" | "q" => return false,
            "help" => print_help(),
            "list" => self.render_sidebar(),
            "new" => {
                self.store.start_new_conversation();
                self.render_sidebar();
            }
            "open" => self.open(argument),
            "search" => {
                self.store.update_search_term(argument);
                self.render_sidebar();
            }
            "clear" => {
                self.store.clear_search();
                self.render_sidebar();
            }
            "pin" => self.pin(argument),
            "rename" => self.rename(argument),
            "export" => self.export(argument),
            "stop" => self.stop(),
            other => println!("Unknown command /{other} — try /help."),
        }
        true
    }

    fn submit(&mut self, text: &str) {
        if self
            .active_stream
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            println!("The assistant is still responding — /stop to interrupt it.");
            return;
        }

        let conversation_id = match self.store.selected_id() {
            Some(id) => id,
            None => self.store.start_new_conversation().id,
        };

        self.store
            .append_message(&conversation_id, Message::user(text));
        let handle = simulator::simulate_assistant_response(&self.store, &conversation_id, text);
        self.active_stream = Some(handle);

        println!("…assistant is thinking. Press Enter to refresh the view.");
    }

    fn stop(&mut self) {
        match self.active_stream.take() {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                tracing::debug!(
                    "stopped reply in conversation {}",
                    handle.conversation_id()
                );
                println!("Stopped.");
            }
            _ => println!("Nothing is streaming."),
        }
    }

    fn open(&mut self, argument: &str) {
        let conversations = self.store.conversations();
        let target = argument
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| conversations.get(index));

        match target {
            Some(conversation) => {
                self.store.select_conversation(&conversation.id);
                self.render_timeline();
            }
            None => println!("Usage: /open <number from /list>"),
        }
    }

    fn pin(&mut self, argument: &str) {
        let target = if argument.is_empty() {
            self.store.selected_id()
        } else {
            let conversations = self.store.conversations();
            argument
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| conversations.get(index))
                .map(|conversation| conversation.id.clone())
        };

        match target {
            Some(id) if self.store.toggle_pin(&id) => self.render_sidebar(),
            _ => println!("Nothing to pin."),
        }
    }

    fn rename(&mut self, argument: &str) {
        let Some(conversation) = self.store.active_conversation() else {
            println!("No active conversation.");
            return;
        };

        let title = argument.trim();
        // Empty and unchanged titles revert without touching the store.
        if title.is_empty() || title == conversation.title {
            return;
        }
        self.store.update_conversation_title(&conversation.id, title);
        self.render_sidebar();
    }

    fn export(&mut self, argument: &str) {
        let Some(conversation) = self.store.active_conversation() else {
            println!("No active conversation.");
            return;
        };

        if argument == "json" {
            match export::export_to_json(&conversation) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("Failed to export conversation: {}", e),
            }
        } else {
            println!("{}", export::export_to_text(&conversation));
        }
    }

    fn render_sidebar(&self) {
        let conversations = self.store.conversations();
        let term = self.store.search_term();
        if !term.trim().is_empty() {
            println!("Search: {term}");
        }
        if conversations.is_empty() {
            println!("No conversations.");
            return;
        }

        let selected = self.store.selected_id();
        let selected = selected.as_deref();

        if conversations.iter().any(|c| c.pinned) {
            println!("Pinned");
            for (index, conversation) in conversations.iter().enumerate() {
                if conversation.pinned {
                    print_row(index, conversation, selected);
                }
            }
            println!("Recent");
        }
        for (index, conversation) in conversations.iter().enumerate() {
            if !conversation.pinned {
                print_row(index, conversation, selected);
            }
        }
    }

    fn render_timeline(&self) {
        let Some(conversation) = self.store.active_conversation() else {
            println!("No active conversation — type a message to start one.");
            return;
        };

        println!("— {} —", conversation.title);
        for message in &conversation.messages {
            match message.role {
                Role::User => println!("you: {}", message.content),
                Role::Assistant => {
                    for note in &message.reasoning {
                        println!("  · {note}");
                    }
                    if message.content.is_empty() {
                        println!("assistant: {}", config::THINKING_PREVIEW);
                    } else if message.status == MessageStatus::Thinking {
                        println!("assistant (typing): {}", message.content);
                    } else {
                        println!("assistant: {}", message.content);
                    }
                }
                Role::System => println!("system: {}", message.content),
            }
        }
    }
}

fn print_row(index: usize, conversation: &Conversation, selected: Option<&str>) {
    let marker = if selected == Some(conversation.id.as_str()) {
        '>'
    } else {
        ' '
    };
    println!(
        "{marker} {:>2}. {} — {}",
        index + 1,
        conversation.title,
        truncate_line(&conversation.preview, 56),
    );
}

/// Clip text to one line of at most `max` characters for sidebar rows.
fn truncate_line(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    if first_line.chars().count() > max {
        let head: String = first_line.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    } else {
        first_line.to_string()
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <text>             send a message in the active conversation");
    println!("  <enter>            refresh the active conversation view");
    println!("  /new               start a new conversation");
    println!("  /list              show the sidebar");
    println!("  /open <n>          open conversation n from the sidebar");
    println!("  /search <term>     filter the sidebar by title or preview");
    println!("  /clear             clear the search filter");
    println!("  /pin [n]           pin or unpin a conversation");
    println!("  /rename <title>    rename the active conversation");
    println!("  /export [json]     print the active conversation");
    println!("  /stop              stop the current reply");
    println!("  /quit              exit");
}
