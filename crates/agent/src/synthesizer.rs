use std::sync::Arc;

use tracing::warn;

use crate::conversation::{render_history, ChatMessage};
use crate::llm::LlmClient;

const FALLBACK_APOLOGY: &str =
    "Sorry, I could not put together a reply just now. Please try again.";

/// Turns a tool result into the user-facing reply. Purely cosmetic: the
/// reply must be non-empty and must carry the tool result's content, but
/// nothing downstream depends on its wording.
pub struct ResponseSynthesizer {
    llm: Arc<dyn LlmClient>,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn render(
        &self,
        user_text: &str,
        history: &[ChatMessage],
        tool_result: &str,
    ) -> String {
        let prompt = synthesis_prompt(user_text, history, tool_result);

        let completion = match self.llm.complete(&prompt).await {
            Ok(completion) => completion,
            Err(error) => {
                warn!(
                    event_name = "synthesizer.capability_unavailable",
                    error = %error,
                    "completion failed, replying with the raw tool result"
                );
                String::new()
            }
        };

        let reply = completion.trim();
        if !reply.is_empty() {
            return reply.to_string();
        }

        // The literal tool result is always a readable sentence; prefer it
        // over a canned apology when the model gives us nothing.
        let tool_result = tool_result.trim();
        if !tool_result.is_empty() {
            return tool_result.to_string();
        }

        FALLBACK_APOLOGY.to_string()
    }
}

fn synthesis_prompt(user_text: &str, history: &[ChatMessage], tool_result: &str) -> String {
    format!(
        "You are the conversational assistant for Maitred, a restaurant \
         reservation service. Based on the conversation history, the user's \
         input, and the result of the action that was just executed, write \
         the reply to the user.\n\
         \n\
         Conversation History:\n{history}\n\
         \n\
         Current User Input: \"{user_text}\"\n\
         \n\
         Action Result:\n{tool_result}\n\
         \n\
         Write a concise, natural reply. If the result describes a problem, \
         explain it plainly and suggest a next step. If it lists \
         recommendations, format them nicely and invite the user to book \
         one. Stay grounded in the action result; do not invent \
         reservations, restaurants, or availability.\n\
         \n\
         Respond with the reply text only, no JSON or extra formatting.",
        history = render_history(history),
        user_text = user_text,
        tool_result = tool_result,
    )
}
