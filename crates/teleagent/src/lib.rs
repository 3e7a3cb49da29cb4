//! Telecom self-service agent.
//!
//! This crate stitches the workspace together: the agent loop from
//! [`core`], the model boundary from [`llm`], the operation catalog from
//! [`telecom`] and the scenario evaluator from [`kpi`]. Most applications only
//! need [`prelude`].

pub use async_trait::async_trait;
pub use teleagent_core::{self as core, error as core_error};
pub use teleagent_kpi as kpi;
pub use teleagent_llm::{self as llm, error as llm_error};
pub use teleagent_telecom as telecom;

pub mod prelude;

/// Install `env_logger` as the `log` backend when built with the `logging`
/// feature. Calling it more than once is harmless.
#[inline]
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
