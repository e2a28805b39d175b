//! AssistantMD: a self-hosted, single-user workflow and context
//! orchestration engine for LLM-driven agents over a markdown vault.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::AppError;
