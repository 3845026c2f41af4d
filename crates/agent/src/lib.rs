//! Agent pipeline - LLM-powered intent dispatch for reservations
//!
//! This crate is the conversational side of maitred. One user message flows
//! through a strict, sequential pipeline:
//!
//! 1. **Intent Classification** (`classifier`) - free text + history -> a
//!    structured intent record
//! 2. **Tool Selection** (`selector`) - intent record -> one of six fixed
//!    reservation tools with parameters, or a deterministic fallback
//! 3. **Tool Execution** (`tools`) - validated arguments run against the
//!    Reservation Engine; typed outcomes become result text
//! 4. **Response Synthesis** (`synthesizer`) - result text -> the natural
//!    language reply
//!
//! # Key Types
//!
//! - `AgentRuntime` - per-turn orchestrator (see `runtime`)
//! - `LlmClient` - pluggable completion trait; `HttpLlmClient` talks to an
//!   OpenAI-compatible endpoint
//!
//! # Degradation Principle
//!
//! The language model is an unreliable collaborator. Malformed or empty
//! completions never abort a turn: classification falls back to an unknown
//! intent, selection falls back to recommendations, and synthesis falls
//! back to the literal tool result. The engine alone decides what actually
//! happens to inventory.

pub mod classifier;
pub mod conversation;
pub mod llm;
pub mod runtime;
pub mod selector;
pub mod synthesizer;
pub mod tools;
