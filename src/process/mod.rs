//! Provisioning hook module.
//!
//! Nodes carry an ordered list of shell commands that the testbed runs
//! after boot. This crate only schedules them; it never executes them.

pub mod types;
pub mod hooks;

// Re-export commonly used types for convenience
pub use types::{HookStage, ExecuteService};
pub use hooks::{schedule_hooks, HookConfig, ProvisioningConfig};
