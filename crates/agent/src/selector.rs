use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::classifier::IntentRecord;
use crate::conversation::{render_history, ChatMessage};
use crate::llm::LlmClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ReserveTable,
    CancelReservation,
    UpdateReservation,
    PrebookMeal,
    GetMenu,
    RecommendRestaurant,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReserveTable => "reserve_table",
            Self::CancelReservation => "cancel_reservation",
            Self::UpdateReservation => "update_reservation",
            Self::PrebookMeal => "prebook_meal",
            Self::GetMenu => "get_menu",
            Self::RecommendRestaurant => "recommend_restaurant",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolSelection {
    pub tool: ToolName,
    pub parameters: Map<String, Value>,
    /// Set when selection could not produce an executable call; the
    /// orchestrator short-circuits with an apology instead of executing.
    pub error: Option<String>,
}

impl ToolSelection {
    fn fallback(reason: &str) -> Self {
        Self {
            tool: ToolName::RecommendRestaurant,
            parameters: Map::new(),
            error: Some(reason.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct RawSelection {
    tool: ToolName,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps a classified intent onto one of the six fixed tools. Anything the
/// model produces that is not a valid selection collapses into the
/// deterministic recommend fallback with an error message attached.
pub struct ToolSelector {
    llm: Arc<dyn LlmClient>,
}

impl ToolSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn select(&self, intent: &IntentRecord, history: &[ChatMessage]) -> ToolSelection {
        let prompt = selection_prompt(intent, history);

        let completion = match self.llm.complete(&prompt).await {
            Ok(completion) => completion,
            Err(error) => {
                warn!(
                    event_name = "selector.capability_unavailable",
                    error = %error,
                    "completion failed, falling back to recommendations"
                );
                return ToolSelection::fallback(
                    "The assistant service was unavailable while choosing an action.",
                );
            }
        };

        match serde_json::from_str::<RawSelection>(completion.trim()) {
            Ok(raw) => {
                ToolSelection { tool: raw.tool, parameters: raw.parameters, error: raw.error }
            }
            Err(error) => {
                warn!(
                    event_name = "selector.malformed_output",
                    error = %error,
                    "completion was not a valid tool selection"
                );
                ToolSelection::fallback(
                    "Failed to select a tool due to an invalid response format.",
                )
            }
        }
    }
}

fn selection_prompt(intent: &IntentRecord, history: &[ChatMessage]) -> String {
    let intent_record = json!({
        "intent": intent.intent.as_str(),
        "parameters": intent.parameters,
    });

    format!(
        "You are the conversational assistant for Maitred. Based on the \
         detected intent and conversation history, select the tool to call \
         and provide its parameters.\n\
         \n\
         Conversation History:\n{history}\n\
         \n\
         Detected Intent and Parameters:\n{intent}\n\
         \n\
         Available Tools:\n{tools}\n\
         \n\
         If the intent is \"unknown\" or the parameters are insufficient, \
         choose \"recommend_restaurant\" to suggest restaurants, or set an \
         \"error\" message.\n\
         \n\
         Return the result in the following JSON format:\n\
         {{\n  \"tool\": \"<tool_name>\",\n  \"parameters\": {{ \"key\": \"value\" }},\n  \
         \"error\": \"<error_message>\" (optional)\n}}\n\
         \n\
         Respond with JSON only, no additional text or explanation.",
        history = render_history(history),
        intent = serde_json::to_string_pretty(&intent_record).unwrap_or_default(),
        tools = serde_json::to_string_pretty(&tools_schema()).unwrap_or_default(),
    )
}

fn tools_schema() -> Value {
    json!([
        {
            "name": "reserve_table",
            "description": "Reserves a table at a restaurant.",
            "parameters": {
                "restaurant_id": "string",
                "date_time": "string (ISO format, e.g. 2025-05-20T19:00:00Z)",
                "party_size": "integer",
                "name": "string",
                "phone": "string",
                "user_id": "string"
            }
        },
        {
            "name": "cancel_reservation",
            "description": "Cancels an existing reservation.",
            "parameters": { "reservation_id": "string" }
        },
        {
            "name": "update_reservation",
            "description": "Moves an existing reservation to a new time or party size.",
            "parameters": {
                "reservation_id": "string",
                "date_time": "string (optional)",
                "party_size": "integer (optional)",
                "user_id": "string"
            }
        },
        {
            "name": "prebook_meal",
            "description": "Pre-orders a meal for a reservation.",
            "parameters": {
                "reservation_id": "string",
                "meal_name": "string",
                "user_id": "string"
            }
        },
        {
            "name": "get_menu",
            "description": "Retrieves the menu of a restaurant.",
            "parameters": { "restaurant_id": "string" }
        },
        {
            "name": "recommend_restaurant",
            "description": "Recommends restaurants by cuisine, location, and party size.",
            "parameters": {
                "cuisine": "string (optional)",
                "location": "string (optional)",
                "party_size": "integer (optional)"
            }
        }
    ])
}
