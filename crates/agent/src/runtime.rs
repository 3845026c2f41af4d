use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use maitred_engine::ReservationEngine;

use crate::classifier::IntentClassifier;
use crate::conversation::ChatMessage;
use crate::llm::LlmClient;
use crate::selector::ToolSelector;
use crate::synthesizer::ResponseSynthesizer;
use crate::tools::ToolExecutor;

#[derive(Clone, Debug, PartialEq)]
pub struct TurnReply {
    pub reply: String,
    pub correlation_id: String,
}

/// Drives one turn per user message: classify -> select -> execute ->
/// synthesize, strictly in that order, each stage awaited before the next.
/// A fresh correlation id ties the four stages together in the logs.
pub struct AgentRuntime {
    classifier: IntentClassifier,
    selector: ToolSelector,
    executor: ToolExecutor,
    synthesizer: ResponseSynthesizer,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, engine: Arc<ReservationEngine>) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            selector: ToolSelector::new(llm.clone()),
            executor: ToolExecutor::new(engine),
            synthesizer: ResponseSynthesizer::new(llm),
        }
    }

    pub async fn handle_message(&self, user_text: &str, history: &[ChatMessage]) -> TurnReply {
        let correlation_id = Uuid::new_v4().to_string();

        let intent = self.classifier.classify(user_text, history).await;
        info!(
            event_name = "runtime.intent_classified",
            correlation_id = %correlation_id,
            intent = intent.intent.as_str(),
            "intent classified"
        );

        let selection = self.selector.select(&intent, history).await;
        info!(
            event_name = "runtime.tool_selected",
            correlation_id = %correlation_id,
            tool = selection.tool.as_str(),
            selection_error = selection.error.as_deref().unwrap_or(""),
            "tool selected"
        );

        if let Some(error) = &selection.error {
            return TurnReply {
                reply: format!(
                    "Sorry, I ran into an issue: {error} Please try rephrasing your \
                     request or ask for recommendations."
                ),
                correlation_id,
            };
        }

        let tool_result = self.executor.execute(&selection).await;
        info!(
            event_name = "runtime.tool_executed",
            correlation_id = %correlation_id,
            tool = selection.tool.as_str(),
            result = %tool_result,
            "tool executed"
        );

        let reply = self.synthesizer.render(user_text, history, &tool_result).await;
        info!(
            event_name = "runtime.reply_synthesized",
            correlation_id = %correlation_id,
            "reply synthesized"
        );

        TurnReply { reply, correlation_id }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use maitred_core::domain::restaurant::{
        Restaurant, RestaurantId, SlotAvailability, SlotStatus, Table, TableId,
    };
    use maitred_db::repositories::{
        InMemoryMenuRepository, InMemoryReservationRepository, InMemoryRestaurantRepository,
        InMemoryUserRepository,
    };
    use maitred_engine::ReservationEngine;

    use crate::conversation::ChatMessage;
    use crate::llm::LlmClient;

    use super::AgentRuntime;

    /// Feeds one scripted completion per pipeline stage, in order.
    struct ScriptedLlm {
        completions: Mutex<VecDeque<String>>,
    }

    impl ScriptedLlm {
        fn new(completions: &[&str]) -> Self {
            Self {
                completions: Mutex::new(
                    completions.iter().map(|text| text.to_string()).collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.completions.lock().expect("lock").pop_front().unwrap_or_default())
        }
    }

    fn engine() -> Arc<ReservationEngine> {
        let restaurants = vec![Restaurant {
            id: RestaurantId("R1".to_string()),
            name: "Maison Lumiere".to_string(),
            cuisine: "french".to_string(),
            location: "Downtown".to_string(),
            tables: vec![Table {
                id: TableId("T1".to_string()),
                capacity: 4,
                price: Decimal::new(800, 2),
                availability: vec![SlotAvailability {
                    slot: Utc.with_ymd_and_hms(2025, 5, 20, 19, 0, 0).unwrap(),
                    status: SlotStatus::Available,
                }],
            }],
        }];

        Arc::new(ReservationEngine::new(
            Arc::new(InMemoryRestaurantRepository::with_restaurants(restaurants)),
            Arc::new(InMemoryMenuRepository::default()),
            Arc::new(InMemoryUserRepository::default()),
            Arc::new(InMemoryReservationRepository::default()),
        ))
    }

    #[tokio::test]
    async fn full_turn_books_a_table_and_replies_with_the_synthesis() {
        let llm = Arc::new(ScriptedLlm::new(&[
            // classify
            "{\"intent\": \"reserve_table\", \"parameters\": {\"restaurant_id\": \"R1\"}}",
            // select
            "{\"tool\": \"reserve_table\", \"parameters\": {\
             \"restaurant_id\": \"R1\", \"date_time\": \"2025-05-20T19:00:00Z\", \
             \"party_size\": 4, \"name\": \"Avery\", \"phone\": \"+15550100\", \
             \"user_id\": \"U1\"}}",
            // synthesize
            "All set! Your table at Maison Lumiere is booked for 7pm.",
        ]));
        let runtime = AgentRuntime::new(llm, engine());

        let turn = runtime
            .handle_message(
                "Book a table for four at Maison Lumiere tonight",
                &[ChatMessage::assistant("Welcome to Maitred!")],
            )
            .await;

        assert_eq!(turn.reply, "All set! Your table at Maison Lumiere is booked for 7pm.");
        assert!(!turn.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn selection_error_short_circuits_before_execution() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "{\"intent\": \"cancel_reservation\", \"parameters\": {}}",
            "{\"tool\": \"recommend_restaurant\", \"parameters\": {}, \
             \"error\": \"A reservation id is required to cancel.\"}",
            // No synthesis completion: the turn must not get that far.
        ]));
        let runtime = AgentRuntime::new(llm, engine());

        let turn = runtime.handle_message("cancel my booking", &[]).await;

        assert!(turn.reply.starts_with("Sorry, I ran into an issue:"), "{}", turn.reply);
        assert!(turn.reply.contains("A reservation id is required to cancel."));
    }

    #[tokio::test]
    async fn dead_capability_still_produces_a_non_empty_reply() {
        // Every completion is empty: classification degrades to unknown,
        // selection falls back to recommendations, synthesis falls back to
        // the tool result.
        let llm = Arc::new(ScriptedLlm::new(&[]));
        let runtime = AgentRuntime::new(llm, engine());

        let turn = runtime.handle_message("hello?", &[]).await;

        assert!(!turn.reply.is_empty());
        assert!(
            turn.reply.starts_with("Sorry, I ran into an issue:"),
            "empty selector output should surface the fallback error: {}",
            turn.reply
        );
    }

    #[tokio::test]
    async fn unknown_intent_with_working_selector_still_recommends() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "not json at all",
            "{\"tool\": \"recommend_restaurant\", \"parameters\": {\"cuisine\": \"french\"}}",
            "",
        ]));
        let runtime = AgentRuntime::new(llm, engine());

        let turn = runtime.handle_message("uh, dinner?", &[]).await;

        // Synthesis was empty, so the literal tool result is the reply.
        assert_eq!(
            turn.reply,
            "Recommended restaurants: Maison Lumiere (french) at Downtown"
        );
    }
}
