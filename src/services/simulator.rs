use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::{Message, MessageStatus};
use crate::services::store::{ChatStore, MessagePatch};

/// Base spacing between streamed chunks.
const BASE_DELAY: Duration = Duration::from_millis(320);
/// Upper bound (exclusive) on the random jitter added to each chunk delay.
/// Must stay below `BASE_DELAY` so the schedule is strictly increasing.
const DELAY_VARIANCE: Duration = Duration::from_millis(180);
/// Longest prompt excerpt echoed back in the reasoning and opening lines.
const PROMPT_PREVIEW_LIMIT: usize = 180;

const CLOSING_OFFER: &str =
    "Let me know if you want me to go deeper on any part or take action on it.";

/// A scripted reply, pre-chunked with its delivery schedule. The text is
/// deterministic for a given prompt; only the delays are random.
#[derive(Debug, Clone)]
pub struct ResponseDraft {
    pub reasoning: Vec<String>,
    pub chunks: Vec<String>,
    pub delays: Vec<Duration>,
}

/// Handle to one in-flight simulated reply.
///
/// Dropping the handle cancels whatever chunks have not been delivered
/// yet; call [`SimulationHandle::detach`] to let delivery run
/// unsupervised instead. Cancellation finalizes the message with the
/// content streamed so far.
pub struct SimulationHandle {
    message_id: String,
    conversation_id: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    detached: bool,
}

impl SimulationHandle {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Stop any remaining chunk deliveries.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait until every scheduled chunk has been applied (or the
    /// simulation was cancelled).
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.detached = true;
    }

    /// Give up supervision: deliveries continue on schedule even after
    /// the handle is gone, landing on the conversation they were
    /// addressed to regardless of what is selected by then.
    pub fn detach(mut self) {
        self.detached = true;
        self.task.take();
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        if !self.detached {
            self.cancel.cancel();
        }
    }
}

/// Append a placeholder assistant message to the conversation and stream
/// a scripted reply into it chunk by chunk.
///
/// The placeholder (empty content, `Thinking`, reasoning attached) is
/// visible as soon as this returns; the chunks land asynchronously on a
/// strictly increasing schedule. Concurrent calls are independent: each
/// creates its own message and its own timer chain.
pub fn simulate_assistant_response(
    store: &ChatStore,
    conversation_id: &str,
    prompt: &str,
) -> SimulationHandle {
    let draft = build_draft(prompt);

    let message = Message::assistant_thinking(draft.reasoning.clone());
    let message_id = message.id.clone();
    store.append_message(conversation_id, message);
    store.set_streaming_message(Some(message_id.clone()));

    tracing::debug!(
        "streaming {} chunks into conversation {}",
        draft.chunks.len(),
        conversation_id
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(deliver_chunks(
        store.clone(),
        conversation_id.to_string(),
        message_id.clone(),
        draft,
        cancel.clone(),
    ));

    SimulationHandle {
        message_id,
        conversation_id: conversation_id.to_string(),
        cancel,
        task: Some(task),
        detached: false,
    }
}

async fn deliver_chunks(
    store: ChatStore,
    conversation_id: String,
    message_id: String,
    draft: ResponseDraft,
    cancel: CancellationToken,
) {
    let started = Instant::now();
    let total = draft.chunks.len();
    let mut assembled = String::new();

    for (index, chunk) in draft.chunks.into_iter().enumerate() {
        tokio::select! {
            _ = cancel.cancelled() => {
                finalize_cancelled(&store, &conversation_id, &message_id);
                return;
            }
            _ = tokio::time::sleep_until(started + draft.delays[index]) => {}
        }

        assembled.push_str(&chunk);
        let last = index + 1 == total;
        store.update_message(
            &conversation_id,
            &message_id,
            MessagePatch {
                content: Some(assembled.trim().to_string()),
                status: Some(if last {
                    MessageStatus::Ready
                } else {
                    MessageStatus::Thinking
                }),
                created_at: Some(Utc::now()),
                reasoning: None,
            },
        );

        if last {
            store.set_streaming_message(None);
            tracing::debug!("finished streaming message {}", message_id);
        }
    }
}

/// Close out a cancelled stream: keep whatever content has arrived, mark
/// the message ready, and release the streaming marker if it is ours.
fn finalize_cancelled(store: &ChatStore, conversation_id: &str, message_id: &str) {
    store.update_message(
        conversation_id,
        message_id,
        MessagePatch {
            content: None,
            status: Some(MessageStatus::Ready),
            created_at: Some(Utc::now()),
            reasoning: None,
        },
    );
    if store.streaming_message_id().as_deref() == Some(message_id) {
        store.set_streaming_message(None);
    }
    tracing::debug!("cancelled streaming message {}", message_id);
}

/// Build the canned reasoning trace and reply for a prompt, split into
/// sentence-level chunks with a randomized delivery schedule.
pub fn build_draft(prompt: &str) -> ResponseDraft {
    let normalized = prompt.trim();
    let shortened = shorten_prompt(normalized);

    let reasoning = vec![
        format!("Confirm intent by restating the request: \"{shortened}\""),
        "Gather the relevant context, resources, and edge cases to cover".to_string(),
        "Plan the response so it's concise, actionable, and easy to iterate on".to_string(),
    ];

    let opener = if normalized.is_empty() {
        "Here’s what I can help with right now:".to_string()
    } else {
        format!("Here’s how we can handle “{shortened}” right now:")
    };

    let response = [
        opener.as_str(),
        "1. Capture the objective and constraints in a quick summary.",
        "2. Outline the steps to get to a first useful result.",
        "3. Flag any decisions or validations we should confirm before shipping.",
        CLOSING_OFFER,
    ]
    .join("\n\n");

    let segments: Vec<&str> = response
        .split("\n\n")
        .flat_map(split_sentences)
        .collect();

    // Every chunk after the first carries one leading space so plain
    // concatenation reconstructs natural spacing.
    let chunks: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            if index == 0 {
                (*segment).to_string()
            } else {
                format!(" {segment}")
            }
        })
        .collect();

    let mut rng = rand::thread_rng();
    let delays = (0..chunks.len())
        .map(|index| {
            let jitter = rng.gen_range(0..DELAY_VARIANCE.as_millis() as u64);
            BASE_DELAY * (index as u32 + 1) + Duration::from_millis(jitter)
        })
        .collect();

    ResponseDraft {
        reasoning,
        chunks,
        delays,
    }
}

fn shorten_prompt(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_PREVIEW_LIMIT {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_LIMIT - 3).collect();
        format!("{head}…")
    } else {
        prompt.to_string()
    }
}

/// Split a paragraph into sentences: a boundary is `.`, `!`, or `?`
/// followed by whitespace. The punctuation stays with its sentence and
/// the whitespace run is consumed.
fn split_sentences(block: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;

    let mut iter = block.char_indices().peekable();
    while let Some((index, ch)) = iter.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let followed_by_space = iter.peek().is_some_and(|(_, next)| next.is_whitespace());
        if !followed_by_space {
            continue;
        }

        segments.push(&block[start..index + ch.len_utf8()]);
        start = block.len();
        while let Some(&(next_index, next_ch)) = iter.peek() {
            if next_ch.is_whitespace() {
                iter.next();
            } else {
                start = next_index;
                break;
            }
        }
    }

    if start < block.len() {
        segments.push(&block[start..]);
    }
    segments.retain(|segment| !segment.is_empty());
    segments
}
