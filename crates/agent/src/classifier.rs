use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::conversation::{render_history, ChatMessage};
use crate::llm::LlmClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ReserveTable,
    CancelReservation,
    UpdateReservation,
    PrebookMeal,
    GetMenu,
    RecommendRestaurant,
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReserveTable => "reserve_table",
            Self::CancelReservation => "cancel_reservation",
            Self::UpdateReservation => "update_reservation",
            Self::PrebookMeal => "prebook_meal",
            Self::GetMenu => "get_menu",
            Self::RecommendRestaurant => "recommend_restaurant",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntentRecord {
    pub intent: Intent,
    pub parameters: Map<String, Value>,
}

impl IntentRecord {
    pub fn unknown() -> Self {
        Self { intent: Intent::Unknown, parameters: Map::new() }
    }
}

#[derive(Deserialize)]
struct RawIntent {
    intent: Intent,
    #[serde(default)]
    parameters: Map<String, Value>,
}

/// Turns free text plus history into a structured intent record. A
/// malformed or empty completion is a normal outcome and classifies as
/// `unknown`; nothing here can fail a turn.
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, user_text: &str, history: &[ChatMessage]) -> IntentRecord {
        let prompt = classification_prompt(user_text, history);

        let completion = match self.llm.complete(&prompt).await {
            Ok(completion) => completion,
            Err(error) => {
                warn!(
                    event_name = "classifier.capability_unavailable",
                    error = %error,
                    "completion failed, classifying as unknown"
                );
                return IntentRecord::unknown();
            }
        };

        match serde_json::from_str::<RawIntent>(completion.trim()) {
            Ok(raw) => IntentRecord { intent: raw.intent, parameters: raw.parameters },
            Err(error) => {
                warn!(
                    event_name = "classifier.malformed_output",
                    error = %error,
                    "completion was not the expected JSON, classifying as unknown"
                );
                IntentRecord::unknown()
            }
        }
    }
}

fn classification_prompt(user_text: &str, history: &[ChatMessage]) -> String {
    format!(
        "You are the conversational assistant for Maitred, a restaurant \
         reservation service. Analyze the user's input against the \
         conversation history and determine their intent and parameters.\n\
         \n\
         Conversation History:\n{history}\n\
         \n\
         Current User Input: \"{user_text}\"\n\
         \n\
         Available Intents:\n\
         - reserve_table\n\
         - cancel_reservation\n\
         - update_reservation\n\
         - prebook_meal\n\
         - get_menu\n\
         - recommend_restaurant\n\
         \n\
         Return the result in the following JSON format:\n\
         {{\n  \"intent\": \"<intent>\",\n  \"parameters\": {{ \"key\": \"value\" }}\n}}\n\
         \n\
         If parameters are missing, provide sensible defaults (party_size 2, \
         date_time \"2025-05-20T19:00:00Z\", name \"Guest\", phone \
         \"+1234567890\") and fill gaps from the conversation history where \
         possible.\n\
         \n\
         Respond with JSON only, no additional text or explanation.",
        history = render_history(history),
        user_text = user_text,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::conversation::ChatMessage;
    use crate::llm::LlmClient;

    use super::{Intent, IntentClassifier};

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn well_formed_output_classifies_with_parameters() {
        let classifier = IntentClassifier::new(Arc::new(CannedLlm(
            "{\"intent\": \"reserve_table\", \"parameters\": \
             {\"restaurant_id\": \"R1\", \"party_size\": 4}}",
        )));

        let record = classifier.classify("Book a table for 4 at R1", &[]).await;
        assert_eq!(record.intent, Intent::ReserveTable);
        assert_eq!(record.parameters["restaurant_id"], "R1");
        assert_eq!(record.parameters["party_size"], 4);
    }

    #[tokio::test]
    async fn prose_output_degrades_to_unknown() {
        let classifier = IntentClassifier::new(Arc::new(CannedLlm(
            "Sure! It sounds like you want to book a table.",
        )));

        let record = classifier.classify("book something", &[]).await;
        assert_eq!(record.intent, Intent::Unknown);
        assert!(record.parameters.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_intent_tag_degrades_to_unknown() {
        let classifier = IntentClassifier::new(Arc::new(CannedLlm(
            "{\"intent\": \"order_taxi\", \"parameters\": {}}",
        )));

        let record = classifier.classify("get me a taxi", &[]).await;
        assert_eq!(record.intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn capability_failure_degrades_to_unknown() {
        let classifier = IntentClassifier::new(Arc::new(FailingLlm));
        let record = classifier
            .classify("hello", &[ChatMessage::assistant("Welcome!")])
            .await;
        assert_eq!(record.intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn missing_parameters_field_defaults_to_empty() {
        let classifier =
            IntentClassifier::new(Arc::new(CannedLlm("{\"intent\": \"get_menu\"}")));
        let record = classifier.classify("menu please", &[]).await;
        assert_eq!(record.intent, Intent::GetMenu);
        assert!(record.parameters.is_empty());
    }
}
