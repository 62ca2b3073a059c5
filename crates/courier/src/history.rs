use std::ops::Index;

use serde::Serialize;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;

/// Append-only log of one session's conversation.
///
/// The first entry is always the system message given at construction. Messages are never
/// edited or removed once pushed, and every tool result must answer a pending request of the
/// latest assistant turn.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MessageHistory {
    messages: Vec<Message>,
}

impl MessageHistory {
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) -> AgentResult<()> {
        match message.role {
            Role::System => {
                return Err(AgentError::InvalidHistory(
                    "the history already starts with a system message".into(),
                ));
            }
            Role::Tool => {
                let id = message.tool_call_id.as_deref().ok_or_else(|| {
                    AgentError::InvalidHistory("tool result without a tool_call_id".into())
                })?;
                if !self.pending_tool_call_ids().contains(&id) {
                    return Err(AgentError::InvalidHistory(format!(
                        "tool result '{}' does not answer a pending tool call",
                        id
                    )));
                }
            }
            Role::User | Role::Assistant => {}
        }

        self.messages.push(message);
        Ok(())
    }

    /// Ids requested by the latest assistant turn that have no result yet
    pub fn pending_tool_call_ids(&self) -> Vec<&str> {
        let mut answered = Vec::new();
        for message in self.messages.iter().rev() {
            match message.role {
                Role::Tool => {
                    if let Some(id) = message.tool_call_id.as_deref() {
                        answered.push(id);
                    }
                }
                Role::Assistant => {
                    return message
                        .tool_calls
                        .iter()
                        .map(|call| call.id.as_str())
                        .filter(|id| !answered.contains(id))
                        .collect();
                }
                _ => break,
            }
        }
        Vec::new()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true, the system message is always present
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl Index<usize> for MessageHistory {
    type Output = Message;

    fn index(&self, index: usize) -> &Message {
        &self.messages[index]
    }
}

impl<'a> IntoIterator for &'a MessageHistory {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
