use chrono::{DateTime, Duration, Utc};

use crate::models::{Conversation, Message, MessageStatus, Role};

fn seeded_message(id: &str, role: Role, content: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        created_at,
        status: MessageStatus::Ready,
        reasoning: Vec::new(),
    }
}

/// Hand-authored conversations preloaded at startup so the sidebar is
/// not empty. Timestamps are assigned relative to process start.
pub fn sample_conversations() -> Vec<Conversation> {
    let now = Utc::now();

    vec![
        Conversation {
            id: "conv-1".to_string(),
            title: "Ideate launch messaging".to_string(),
            pinned: true,
            last_activity_at: now - Duration::minutes(3),
            preview: "Let’s draft a product announcement that feels human and warm…"
                .to_string(),
            messages: vec![
                seeded_message(
                    "conv-1-msg-1",
                    Role::Assistant,
                    "Absolutely! Let’s craft a launch announcement that feels personal yet \
                     polished. What tone do you want to lead with?",
                    now - Duration::minutes(5),
                ),
                seeded_message(
                    "conv-1-msg-2",
                    Role::User,
                    "Friendly and confident. Highlight the new canvas workflow and real-time \
                     collaboration.",
                    now - Duration::minutes(3),
                ),
            ],
        },
        Conversation {
            id: "conv-2".to_string(),
            title: "React performance review".to_string(),
            pinned: false,
            last_activity_at: now - Duration::hours(2),
            preview: "Profiling shows hydration costs. Suggest streaming UI tactics…"
                .to_string(),
            messages: vec![
                seeded_message(
                    "conv-2-msg-1",
                    Role::User,
                    "I’m seeing hydration taking ~250ms on the marketing page. How can I \
                     improve it without losing fidelity?",
                    now - Duration::hours(4),
                ),
                seeded_message(
                    "conv-2-msg-2",
                    Role::Assistant,
                    "Consider server components for static copy and progressively hydrate the \
                     hero animation. Also, lazy-load the analytics widget.",
                    now - Duration::hours(2),
                ),
            ],
        },
        Conversation {
            id: "conv-3".to_string(),
            title: "Weekend meal planner".to_string(),
            pinned: false,
            last_activity_at: now - Duration::days(1),
            preview: "Finalize grocery list with seasonal vegetables and easy prep…"
                .to_string(),
            messages: vec![
                seeded_message(
                    "conv-3-msg-1",
                    Role::Assistant,
                    "Here’s a cozy weekend plan: roasted squash soup, citrus salad, and a \
                     no-fuss pasta bake. Want a shopping list?",
                    now - Duration::days(1) - Duration::minutes(10),
                ),
                seeded_message(
                    "conv-3-msg-2",
                    Role::User,
                    "Yes please, include dessert ideas that aren’t too sweet.",
                    now - Duration::days(1),
                ),
            ],
        },
    ]
}
