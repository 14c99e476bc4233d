use crate::providers::ChatMessage;

pub const DEFAULT_TOKEN_BUDGET: usize = 2000;

/// Approximate token count: whitespace-separated word count, not a real
/// tokenizer. Good enough for history trimming.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the longest suffix of `messages` whose summed token count fits the
/// budget. Scans newest to oldest and stops at the first message that would
/// overflow; messages are never partially cut, so a single over-budget
/// newest message yields an empty result. Output stays in chronological
/// order, and already-fitting input is returned unchanged.
pub fn trim_messages_to_token_limit(
    messages: &[ChatMessage],
    max_tokens: usize,
) -> Vec<ChatMessage> {
    let mut kept = Vec::new();
    let mut total = 0;

    for message in messages.iter().rev() {
        let tokens = count_tokens(&message.content.extract_text());
        if total + tokens > max_tokens {
            break;
        }
        total += tokens;
        kept.push(message.clone());
    }

    kept.reverse();
    kept
}
