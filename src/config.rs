use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;
use crate::process::ProvisioningConfig;
use crate::utils::validation::{
    is_image_urn, validate_dataset_reference, validate_mount_point, validate_resource_name,
};

/// Highest host number usable in a /24 extra segment (`.255` is broadcast)
pub const MAX_HOST_OCTET: u32 = 254;

/// Largest node count accepted in one request
pub const MAX_NODE_COUNT: u32 = 1024;

/// Number of extra segments the `192.168.{j}.0/24` scheme can address
pub const MAX_EXTRA_SEGMENTS: u32 = 256;

/// Whether the primary shared segment is created
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SharedSegment {
    /// Create it when the topology has at least two nodes
    #[default]
    Auto,
    /// Always create it; a single-node topology then fails graph validation
    Always,
    /// Never create it
    Never,
}

/// Placement hint for ephemeral local storage
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Any,
    /// Only on the system disk
    Sysvol,
    /// Only on non-system disks
    Nonsysvol,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Any => "any",
            Placement::Sysvol => "sysvol",
            Placement::Nonsysvol => "nonsysvol",
        }
    }
}

/// Profile parameters, one flat mapping per invocation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProfileConfig {
    /// Number of nodes, not counting the server role
    pub node_count: u32,
    /// Addressed segments beyond the primary shared one
    #[serde(default)]
    pub extra_interface_count: u32,
    #[serde(default = "defaults::default_image")]
    pub disk_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_type: Option<String>,
    #[serde(default)]
    pub use_virtual_machines: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerRole>,
    #[serde(default)]
    pub shared_segment: SharedSegment,
    #[serde(default = "default_shared_lan_name")]
    pub shared_lan_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_storage: Option<EphemeralStorageConfig>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    /// Profile description shown by the portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Post-instantiation instructions shown by the portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Dedicated server role occupying ordinal 0
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerRole {
    #[serde(default = "default_server_name")]
    pub name: String,
}

impl Default for ServerRole {
    fn default() -> Self {
        ServerRole { name: default_server_name() }
    }
}

/// Ephemeral local storage request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EphemeralStorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u32>,
    #[serde(default)]
    pub use_all_available: bool,
    #[serde(default = "default_ephemeral_mount")]
    pub mount_point: String,
    #[serde(default)]
    pub placement: Placement,
}

impl EphemeralStorageConfig {
    /// Size to request; 0 means "use all available space"
    pub fn resolved_size_gb(&self) -> u32 {
        if self.use_all_available {
            0
        } else {
            self.size_gb.unwrap_or(0)
        }
    }
}

/// Remote dataset attachment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Dataset URN or plain name; empty means "no dataset"
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub writable_clone: bool,
}

impl DatasetConfig {
    /// Empty identifiers are placeholders and produce no attachment
    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }
}

fn default_shared_lan_name() -> String {
    defaults::SHARED_LAN_NAME.to_string()
}

fn default_server_name() -> String {
    defaults::SERVER_NAME.to_string()
}

fn default_ephemeral_mount() -> String {
    defaults::EPHEMERAL_MOUNT_POINT.to_string()
}

impl ProfileConfig {
    /// Minimal configuration with every optional parameter at its default
    pub fn with_node_count(node_count: u32) -> Self {
        ProfileConfig {
            node_count,
            extra_interface_count: 0,
            disk_image: defaults::default_image(),
            hardware_type: None,
            use_virtual_machines: false,
            server: None,
            shared_segment: SharedSegment::Auto,
            shared_lan_name: default_shared_lan_name(),
            ephemeral_storage: None,
            datasets: Vec::new(),
            provisioning: ProvisioningConfig::default(),
            description: None,
            instructions: None,
        }
    }

    /// Nodes in the topology including the server role
    pub fn total_nodes(&self) -> u32 {
        self.node_count.saturating_add(u32::from(self.server.is_some()))
    }

    /// Ordinal of the first non-server node
    pub fn first_node_ordinal(&self) -> u32 {
        u32::from(self.server.is_some())
    }

    /// Whether extra segments are created at all (they need two peers)
    pub fn has_extra_segments(&self) -> bool {
        self.extra_interface_count > 0 && self.node_count >= 2
    }

    /// Dataset entries with a non-empty identifier, with their list index
    pub fn present_datasets(&self) -> impl Iterator<Item = (usize, &DatasetConfig)> {
        self.datasets.iter().enumerate().filter(|(_, ds)| ds.is_present())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.node_count < 1 {
            return Err(ValidationError::invalid("node_count", "must be at least 1"));
        }
        if self.node_count > MAX_NODE_COUNT {
            return Err(ValidationError::invalid(
                "node_count",
                format!("{} exceeds the limit of {} nodes per request", self.node_count, MAX_NODE_COUNT),
            ));
        }

        if self.extra_interface_count > MAX_EXTRA_SEGMENTS {
            return Err(ValidationError::invalid(
                "extra_interface_count",
                format!("at most {} extra segments fit the 192.168.<segment>.0/24 scheme", MAX_EXTRA_SEGMENTS),
            ));
        }

        if self.has_extra_segments() {
            // Highest ordinal is total_nodes - 1, its host octet is total_nodes
            let highest_host = self.total_nodes();
            if highest_host > MAX_HOST_OCTET {
                return Err(ValidationError::invalid(
                    "node_count",
                    format!(
                        "{} nodes do not fit a /24 extra segment (highest host octet would be {})",
                        self.total_nodes(),
                        highest_host
                    ),
                ));
            }
        }

        self.validate_image()?;
        self.validate_names()?;

        if let Some(storage) = &self.ephemeral_storage {
            Self::validate_ephemeral(storage)?;
        }

        self.validate_datasets()?;

        if self.provisioning.user.is_empty()
            || self.provisioning.user.contains('/')
            || self.provisioning.user.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::invalid(
                "provisioning.user",
                format!("'{}' is not a usable account name", self.provisioning.user),
            ));
        }

        Ok(())
    }

    fn validate_image(&self) -> Result<(), ValidationError> {
        if self.disk_image.trim().is_empty() {
            return Err(ValidationError::invalid("disk_image", "cannot be empty"));
        }
        if defaults::image_label(&self.disk_image).is_none() {
            if is_image_urn(&self.disk_image) {
                log::warn!("Disk image '{}' is not in the image catalogue", self.disk_image);
            } else {
                log::warn!(
                    "Disk image '{}' does not look like an image URN; passing it through unchanged",
                    self.disk_image
                );
            }
        }
        if let Some(hardware_type) = &self.hardware_type {
            validate_resource_name(hardware_type)
                .map_err(|e| ValidationError::invalid("hardware_type", e))?;
        }
        Ok(())
    }

    fn validate_names(&self) -> Result<(), ValidationError> {
        validate_resource_name(&self.shared_lan_name)
            .map_err(|e| ValidationError::invalid("shared_lan_name", e))?;
        if let Some(server) = &self.server {
            validate_resource_name(&server.name).map_err(|e| ValidationError::invalid("server.name", e))?;
        }
        Ok(())
    }

    fn validate_ephemeral(storage: &EphemeralStorageConfig) -> Result<(), ValidationError> {
        match (storage.size_gb, storage.use_all_available) {
            (Some(size), true) if size > 0 => {
                return Err(ValidationError::invalid(
                    "ephemeral_storage",
                    format!("size_gb = {} contradicts use_all_available", size),
                ));
            }
            (None, false) => {
                return Err(ValidationError::invalid(
                    "ephemeral_storage",
                    "either size_gb or use_all_available must be given",
                ));
            }
            (Some(0), false) => {
                return Err(ValidationError::invalid(
                    "ephemeral_storage.size_gb",
                    "must be positive; set use_all_available to request all space",
                ));
            }
            _ => {}
        }
        validate_mount_point(&storage.mount_point)
            .map_err(|e| ValidationError::invalid("ephemeral_storage.mount_point", e))
    }

    fn validate_datasets(&self) -> Result<(), ValidationError> {
        let mut mount_points: Vec<String> = Vec::new();
        if let Some(storage) = &self.ephemeral_storage {
            mount_points.push(storage.mount_point.clone());
        }

        for (index, dataset) in self.present_datasets() {
            let parameter = format!("datasets[{}]", index);
            validate_dataset_reference(&dataset.id)
                .map_err(|e| ValidationError::invalid(parameter.clone(), e))?;

            if dataset.read_only && dataset.writable_clone {
                return Err(ValidationError::invalid(
                    parameter,
                    "read_only and writable_clone cannot both be set",
                ));
            }

            let mount_point = dataset
                .mount_point
                .clone()
                .unwrap_or_else(|| defaults::dataset_mount_point(index));
            validate_mount_point(&mount_point)
                .map_err(|e| ValidationError::invalid(format!("{}.mount_point", parameter), e))?;
            if mount_points.contains(&mount_point) {
                return Err(ValidationError::invalid(
                    format!("{}.mount_point", parameter),
                    format!("'{}' is already used by another volume", mount_point),
                ));
            }
            mount_points.push(mount_point);
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl ValidationError {
    pub fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count_upper_bound() {
        let mut config = ProfileConfig::with_node_count(u32::MAX);
        config.server = Some(ServerRole::default());
        config.extra_interface_count = 1;
        assert_eq!(config.total_nodes(), u32::MAX);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter { ref parameter, .. }) if parameter == "node_count"
        ));

        config.extra_interface_count = 0;
        assert!(config.validate().is_err());

        config.node_count = MAX_NODE_COUNT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: ProfileConfig = serde_yaml::from_str("node_count: 3\n").unwrap();
        assert_eq!(config.node_count, 3);
        assert_eq!(config.extra_interface_count, 0);
        assert_eq!(config.disk_image, defaults::default_image());
        assert_eq!(config.shared_segment, SharedSegment::Auto);
        assert_eq!(config.shared_lan_name, "nfsLan");
        assert!(config.datasets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
node_count: 2
extra_interface_count: 2
hardware_type: d710
use_virtual_machines: true
server:
  name: storage
shared_segment: always
ephemeral_storage:
  use_all_available: true
  placement: nonsysvol
datasets:
  - id: "urn:publicid:IDN+clemson.cloudlab.us:lrbplus-pg0+ltdataset+cacheDataset"
  - id: ""
  - id: scratch
    mount_point: /scratch
    writable_clone: true
provisioning:
  user: alice
"#;
        let config: ProfileConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_nodes(), 3);
        assert_eq!(config.first_node_ordinal(), 1);
        assert_eq!(config.server.as_ref().unwrap().name, "storage");
        let storage = config.ephemeral_storage.as_ref().unwrap();
        assert_eq!(storage.resolved_size_gb(), 0);
        assert_eq!(storage.mount_point, "/mydata");
        assert_eq!(storage.placement, Placement::Nonsysvol);
        assert_eq!(config.present_datasets().count(), 2);
        assert_eq!(config.provisioning.user, "alice");
        assert_eq!(config.provisioning.node_hooks.len(), 4);
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let config = ProfileConfig::with_node_count(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("node_count"));
    }

    #[test]
    fn test_bad_dataset_reference_rejected() {
        let mut config = ProfileConfig::with_node_count(2);
        config.datasets.push(DatasetConfig {
            id: "urn:publicid:IDN+emulab.net+image+not-a-dataset".to_string(),
            mount_point: None,
            read_only: false,
            writable_clone: false,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("datasets[0]"));
    }

    #[test]
    fn test_empty_dataset_is_not_validated() {
        let mut config = ProfileConfig::with_node_count(2);
        config.datasets.push(DatasetConfig {
            id: String::new(),
            mount_point: Some("not absolute".to_string()),
            read_only: true,
            writable_clone: true,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_contradictory_dataset_flags() {
        let mut config = ProfileConfig::with_node_count(1);
        config.datasets.push(DatasetConfig {
            id: "ds-a".to_string(),
            mount_point: None,
            read_only: true,
            writable_clone: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_mount_points() {
        let mut config = ProfileConfig::with_node_count(1);
        for _ in 0..2 {
            config.datasets.push(DatasetConfig {
                id: "ds-a".to_string(),
                mount_point: Some("/data".to_string()),
                read_only: false,
                writable_clone: false,
            });
        }
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("datasets[1].mount_point"));
    }

    #[test]
    fn test_ephemeral_size_rules() {
        let mut config = ProfileConfig::with_node_count(1);
        let mut storage = EphemeralStorageConfig {
            size_gb: Some(50),
            use_all_available: true,
            mount_point: "/mydata".to_string(),
            placement: Placement::Any,
        };
        config.ephemeral_storage = Some(storage.clone());
        assert!(config.validate().is_err());

        storage.size_gb = None;
        storage.use_all_available = false;
        config.ephemeral_storage = Some(storage.clone());
        assert!(config.validate().is_err());

        storage.size_gb = Some(50);
        config.ephemeral_storage = Some(storage.clone());
        assert!(config.validate().is_ok());
        assert_eq!(storage.resolved_size_gb(), 50);
    }

    #[test]
    fn test_host_range_limit() {
        let mut config = ProfileConfig::with_node_count(254);
        config.extra_interface_count = 1;
        assert!(config.validate().is_ok());

        config.server = Some(ServerRole::default());
        assert!(config.validate().is_err());

        // Without extra segments no host octet is derived
        config.extra_interface_count = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extra_segments_need_two_nodes() {
        let mut config = ProfileConfig::with_node_count(1);
        config.extra_interface_count = 3;
        assert!(!config.has_extra_segments());
        assert!(config.validate().is_ok());
    }
}
