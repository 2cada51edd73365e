use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }
}

/// Ordered conversation history.
///
/// Entries are only ever appended, except that the content of a trailing
/// assistant entry grows while a reply streams in. Serializes as a bare JSON
/// array, which is both the request `messages` field and the persisted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.0.last()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    /// Content of the trailing entry when it is an assistant turn.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.0
            .last()
            .filter(|message| message.is_assistant())
            .map(|message| message.content.as_str())
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.0.push(message);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ChatMessage> {
        self.0.last_mut()
    }
}

impl From<Vec<ChatMessage>> for Transcript {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self(messages)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("system").is_err());
        assert!(Role::try_from("app/info").is_err());
    }

    #[test]
    fn transcript_serializes_as_plain_array() {
        let transcript = Transcript::from(vec![
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi there!"),
        ]);

        let json = serde_json::to_string(&transcript).expect("serialize");
        assert_eq!(
            json,
            r#"[{"role":"user","content":"Hello"},{"role":"assistant","content":"Hi there!"}]"#
        );

        let parsed: Transcript = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, transcript);
    }

    #[test]
    fn unknown_roles_fail_deserialization() {
        let result = serde_json::from_str::<Transcript>(r#"[{"role":"tool","content":"x"}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn last_assistant_content_ignores_trailing_user_turn() {
        let transcript = Transcript::from(vec![
            ChatMessage::assistant("earlier"),
            ChatMessage::user("question"),
        ]);
        assert_eq!(transcript.last_assistant_content(), None);
    }
}
