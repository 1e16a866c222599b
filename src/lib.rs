//! # Flux Agent
//!
//! Task execution co-pilot for a personal productivity app.
//!
//! This library provides:
//! - A tool-calling agent loop that carries out tasks through a hosted model
//! - Simulated weather, email and calendar tools
//! - A knowledge store of learned user facts that personalizes prompts
//! - Planning flows that turn brain dumps and free text into tasks
//! - An HTTP API exposing all of the above
//!
//! ## Architecture
//!
//! Execution follows the "tools in a loop" pattern:
//! 1. Build a system instruction from the task, the profile and known facts
//! 2. Call the model with the tool catalog and web/maps grounding
//! 3. Execute any requested tool calls and feed the results back
//! 4. Repeat until the model answers or the round cap is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use flux_agent::{agent::{Agent, ExecutionContext}, knowledge::InMemoryKnowledgeStore, task::Task, Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config);
//! let knowledge = InMemoryKnowledgeStore::new();
//! let task = Task::new("Email the landlord about the leak");
//! let text = agent
//!     .execute(ExecutionContext {
//!         task: &task,
//!         instruction: None,
//!         history: &[],
//!         profile: &profile,
//!         location: None,
//!         knowledge: &knowledge,
//!     })
//!     .await;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod task;
pub mod tools;

pub use config::Config;
