// LLM Gateway - multi-provider chat gateway
// Library exports

pub mod config;
pub mod errors;
pub mod providers; // Provider adapters, translation and routing
pub mod server; // HTTP endpoints
pub mod store; // Session-scoped conversation history
