use serde::Serialize;

use crate::core::message::ChatMessage;

/// Body of the POST sent to the inference endpoint.
#[derive(Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_messages_array() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("Compare cookie prices")],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [{"role": "user", "content": "Compare cookie prices"}]
            })
        );
    }
}
