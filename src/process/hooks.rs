//! Provisioning hook scheduling.
//!
//! Hooks come from the parameter file (or the stock lists in
//! `defaults`) in any order; the scheduler substitutes the provisioning
//! user and orders them by stage. Ordering within a stage is preserved.

use serde::{Deserialize, Serialize};

use crate::defaults::{self, DEFAULT_PROVISION_USER, DEFAULT_SHELL, USER_PLACEHOLDER};
use super::types::{ExecuteService, HookStage};

/// A single hook as written in the parameter file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    pub stage: HookStage,
    pub command: String,
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl HookConfig {
    pub fn new(stage: HookStage, command: &str) -> Self {
        HookConfig {
            stage,
            command: command.to_string(),
            shell: default_shell(),
        }
    }
}

/// Provisioning section of the parameter file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Account substituted for `{user}` in hook commands
    #[serde(default = "default_user")]
    pub user: String,
    /// Hooks for the server role
    #[serde(default = "default_server_hooks")]
    pub server_hooks: Vec<HookConfig>,
    /// Hooks for every other node
    #[serde(default = "default_node_hooks")]
    pub node_hooks: Vec<HookConfig>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        ProvisioningConfig {
            user: default_user(),
            server_hooks: default_server_hooks(),
            node_hooks: default_node_hooks(),
        }
    }
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

fn default_user() -> String {
    DEFAULT_PROVISION_USER.to_string()
}

fn default_server_hooks() -> Vec<HookConfig> {
    defaults::SERVER_HOOKS
        .iter()
        .map(|(stage, command)| HookConfig::new(*stage, command))
        .collect()
}

fn default_node_hooks() -> Vec<HookConfig> {
    defaults::NODE_HOOKS
        .iter()
        .map(|(stage, command)| HookConfig::new(*stage, command))
        .collect()
}

/// Turn hook definitions into the ordered service list of one node.
///
/// Order is base setup, then credential installation, then
/// customization. `sort_by_key` is stable, so hooks sharing a stage keep
/// the order they were written in.
pub fn schedule_hooks(hooks: &[HookConfig], user: &str) -> Vec<ExecuteService> {
    let mut services: Vec<ExecuteService> = hooks
        .iter()
        .map(|hook| ExecuteService {
            stage: hook.stage,
            shell: hook.shell.clone(),
            command: hook.command.replace(USER_PLACEHOLDER, user),
        })
        .collect();
    services.sort_by_key(|service| service.stage);
    services
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_node_hooks_are_reordered() {
        let config = ProvisioningConfig::default();
        let services = schedule_hooks(&config.node_hooks, "alice");

        let stages: Vec<HookStage> = services.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                HookStage::BaseSetup,
                HookStage::Credentials,
                HookStage::Customize,
                HookStage::Customize,
            ]
        );
        assert!(services[1].command.contains("/users/alice/.ssh/authorized_keys"));
        // Customize hooks keep their written order
        assert!(services[2].command.contains(".bashrc"));
        assert!(services[3].command.contains("ServerAliveInterval"));
    }

    #[test]
    fn test_user_substitution_and_shell() {
        let hooks = vec![HookConfig {
            stage: HookStage::Customize,
            command: "echo {user} {user}".to_string(),
            shell: "bash".to_string(),
        }];
        let services = schedule_hooks(&hooks, "bob");
        assert_eq!(services[0].command, "echo bob bob");
        assert_eq!(services[0].shell, "bash");
    }

    #[test]
    fn test_parse_hook_without_shell() {
        let hook: HookConfig = serde_yaml::from_str("stage: base_setup\ncommand: ./setup.sh\n").unwrap();
        assert_eq!(hook.shell, "sh");
        assert_eq!(hook.stage, HookStage::BaseSetup);
    }
}
