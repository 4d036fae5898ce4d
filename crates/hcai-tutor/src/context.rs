//! Message assembly for a completion request.

use crate::Message;
use crate::agent::session::Turn;

/// Build the request for one turn: the system prompt, then `history` in
/// order, then `new_user_text` as the final user message.
///
/// The result always has `history.len() + 2` messages. `history` is not
/// touched; recording the new turn is the caller's job.
///
/// ```
/// use hcai_tutor::MessageRole;
/// use hcai_tutor::agent::session::Turn;
/// use hcai_tutor::context::build_messages;
///
/// let history = [Turn::user("hi"), Turn::assistant("hello")];
/// let messages = build_messages("SYS", &history, "bye");
///
/// let flat: Vec<String> = messages
///     .iter()
///     .map(|m| format!("{}:{}", m.role, m.content))
///     .collect();
/// assert_eq!(flat, ["system:SYS", "user:hi", "assistant:hello", "user:bye"]);
/// assert_eq!(messages[0].role, MessageRole::System);
/// ```
pub fn build_messages(system_prompt: &str, history: &[Turn], new_user_text: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().map(Message::from));
    messages.push(Message::user(new_user_text));
    messages
}
