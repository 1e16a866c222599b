//! Agent module - task execution and planning.
//!
//! Execution follows a "tools in a loop" pattern:
//! 1. Build a system instruction from the task, the user profile and learned facts
//! 2. Call the model with the tool catalog
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model answers or the round cap is reached

mod agent_loop;
mod citations;
mod context;
mod planner;
mod prompt;

pub use agent_loop::{
    Agent, ExecutionFailure, ExecutionReport, EMPTY_RESULT_MESSAGE, EXECUTION_FAILED_MESSAGE,
    MISSING_CREDENTIALS_MESSAGE, TASK_TITLE_REQUIRED_MESSAGE,
};
pub use citations::format_reference_sources;
pub use context::{
    resolve_location, DEFAULT_LOCATION_TIMEOUT, ExecutionContext, HistoryEntry, HistoryRole,
    UserProfile,
};
pub use planner::{BrainDumpAnalysis, ParsedInput, PlanningContext};
pub use prompt::{build_execution_instruction, default_instruction};
