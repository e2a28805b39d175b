use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identifiers::{SessionId, VaultId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Assistant,
    ToolCall,
    ToolResult,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub ts: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self { role, content: content.into(), ts }
    }

    /// Tool-call/tool-result pairs must stay adjacent when slicing history
    /// (`spec.md` §4.7 tool-pairing invariant).
    pub fn is_tool(&self) -> bool {
        matches!(self.role, Role::ToolCall | Role::ToolResult)
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub session_id: SessionId,
    pub vault: VaultId,
    pub model_alias: String,
    pub template_name: Option<String>,
    pub messages: Vec<Message>,
}

impl ChatSession {
    pub fn new(session_id: SessionId, vault: VaultId, model_alias: impl Into<String>) -> Self {
        Self { session_id, vault, model_alias: model_alias.into(), template_name: None, messages: Vec::new() }
    }

    /// Last `n` non-tool user/assistant turns, keeping any adjacent
    /// tool-call/tool-result pair intact if it falls inside the slice
    /// boundary (`spec.md` §4.7 step 1 and the tool-pairing invariant).
    pub fn passthrough_slice(&self, n: Option<usize>) -> &[Message] {
        let Some(n) = n else { return &self.messages };
        if n == 0 {
            return &[];
        }

        let mut count = 0usize;
        let mut start = self.messages.len();
        for (idx, message) in self.messages.iter().enumerate().rev() {
            if !message.is_tool() {
                count += 1;
            }
            start = idx;
            if count >= n {
                break;
            }
        }

        while start > 0 && self.messages[start].is_tool() {
            start -= 1;
        }

        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: Role, content: &str) -> Message {
        Message::new(role, content, Utc::now())
    }

    fn session() -> ChatSession {
        let mut s = ChatSession::new(SessionId::generate(), VaultId::new("v").unwrap(), "default");
        s.messages.push(msg(Role::User, "hi"));
        s.messages.push(msg(Role::Assistant, "hello"));
        s.messages.push(msg(Role::User, "run a tool"));
        s.messages.push(msg(Role::ToolCall, "call"));
        s.messages.push(msg(Role::ToolResult, "result"));
        s.messages.push(msg(Role::Assistant, "done"));
        s
    }

    #[test]
    fn no_truncation_returns_everything() {
        assert_eq!(session().passthrough_slice(None).len(), 6);
    }

    #[test]
    fn keeps_tool_pairs_intact_inside_the_slice() {
        let s = session();
        let slice = s.passthrough_slice(Some(2));
        assert!(slice.iter().any(|m| matches!(m.role, Role::ToolCall)));
        assert!(slice.iter().any(|m| matches!(m.role, Role::ToolResult)));
    }

    #[test]
    fn zero_means_empty_slice() {
        assert!(session().passthrough_slice(Some(0)).is_empty());
    }
}
