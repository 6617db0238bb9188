//! Provisioning hook type definitions.

use serde::{Deserialize, Serialize};

/// Stage a provisioning command belongs to.
///
/// Variants are declared in execution order; the derived `Ord` is what the
/// scheduler sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    /// Base node setup (mounts, package installs)
    BaseSetup,
    /// Credential and auth file installation
    Credentials,
    /// Environment customization (shell rc files, ssh client options)
    Customize,
}

impl HookStage {
    /// Get the string representation of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::BaseSetup => "base_setup",
            HookStage::Credentials => "credentials",
            HookStage::Customize => "customize",
        }
    }
}

/// A command scheduled on a node, rendered as an `execute` service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteService {
    pub stage: HookStage,
    pub shell: String,
    pub command: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(HookStage::BaseSetup < HookStage::Credentials);
        assert!(HookStage::Credentials < HookStage::Customize);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(HookStage::BaseSetup.as_str(), "base_setup");
        let stage: HookStage = serde_yaml::from_str("credentials").unwrap();
        assert_eq!(stage, HookStage::Credentials);
    }
}
