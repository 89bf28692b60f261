//! Heuristics that read the assistant's state from rendered pane text.

pub mod idle;
pub mod patterns;
pub mod prompt;
pub mod ready;

pub use idle::{IdleSignal, IdleVerdict, NotIdleReason, detect_idle};
pub use prompt::{Choice, PromptDecision, RESPONSE_COOLDOWN, SelectionRule, classify};
pub use ready::{ReadySignal, detect_ready};
