//! LLM provider adapters.

mod http_client;
mod routing_client;

pub use http_client::HttpLlmClient;
pub use routing_client::RoutingLlmClient;
