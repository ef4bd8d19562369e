use anyhow::Result;

use crate::models::{Conversation, MessageStatus, Role};

/// Render a conversation as a plain-text transcript.
pub fn export_to_text(conversation: &Conversation) -> String {
    let mut output = format!("# {}\n\n", conversation.title);
    output.push_str(&format!(
        "> Last activity: {}\n\n",
        conversation.last_activity_at.format("%Y-%m-%d %H:%M")
    ));
    output.push_str("---\n\n");

    for message in &conversation.messages {
        let role_label = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        output.push_str(&format!("### {}\n\n", role_label));

        for note in &message.reasoning {
            output.push_str(&format!("> {}\n", note));
        }
        if !message.reasoning.is_empty() {
            output.push('\n');
        }

        if message.content.is_empty() && message.status == MessageStatus::Thinking {
            output.push_str("_(still thinking)_\n\n");
        } else {
            output.push_str(&format!("{}\n\n", message.content));
        }
    }

    output
}

pub fn export_to_json(conversation: &Conversation) -> Result<String> {
    Ok(serde_json::to_string_pretty(conversation)?)
}
