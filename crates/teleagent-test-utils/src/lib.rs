//! Test doubles shared by the workspace's test suites.

pub mod llm;
pub mod operation;

pub use llm::{FailingEmbedder, ScriptedChatProvider, final_answer_reply, tool_call_reply};
pub use operation::{FailingOperation, PanickingOperation, RecordingOperation};
