use crate::config::{DatasetConfig, ProfileConfig, ServerRole};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Parameter names used by the portal profile form
pub const LEGACY_PARAMETERS: &[&str] = &["clientCount", "osImage", "DATASET", "DATASET2"];

/// Load and parse profile parameters from a YAML file
pub fn load_config(config_path: &Path) -> Result<ProfileConfig> {
    info!("Loading parameters from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)
        .wrap_err_with(|| format!("Failed to read parameter file '{}'", config_path.display()))?;
    let config = parse_config(&content)?;

    config.validate()?;

    Ok(config)
}

/// Parse parameters from YAML text, translating portal parameter names
pub fn parse_config(content: &str) -> Result<ProfileConfig> {
    let mut value: Value = serde_yaml::from_str(content).wrap_err("Parameter file is not valid YAML")?;

    if let Value::Mapping(mapping) = &mut value {
        if LEGACY_PARAMETERS.iter().any(|key| mapping.contains_key(*key)) {
            warn!(
                "Parameter file uses portal parameter names ({}); translating them",
                LEGACY_PARAMETERS.join(", ")
            );
            migrate_legacy_parameters(mapping)?;
        }
    }

    let config: ProfileConfig = serde_yaml::from_value(value).wrap_err("Invalid profile parameters")?;
    Ok(config)
}

fn take_legacy(mapping: &mut Mapping, legacy: &str, current: &str) -> Result<Option<Value>> {
    let Some(value) = mapping.remove(legacy) else {
        return Ok(None);
    };
    if mapping.contains_key(current) {
        return Err(eyre!("Both '{}' and '{}' are set; keep only '{}'", legacy, current, current));
    }
    Ok(Some(value))
}

/// Rewrite portal parameter names into the current layout
///
/// `clientCount` becomes `node_count` plus a server role (the portal
/// profile always had one), `osImage` becomes `disk_image`, and
/// `DATASET`/`DATASET2` become the first two `datasets` entries.
pub fn migrate_legacy_parameters(mapping: &mut Mapping) -> Result<()> {
    if let Some(count) = take_legacy(mapping, "clientCount", "node_count")? {
        mapping.insert(Value::from("node_count"), count);
        if !mapping.contains_key("server") {
            mapping.insert(
                Value::from("server"),
                serde_yaml::to_value(ServerRole::default()).wrap_err("Failed to encode server role")?,
            );
        }
    }

    if let Some(image) = take_legacy(mapping, "osImage", "disk_image")? {
        mapping.insert(Value::from("disk_image"), image);
    }

    let mut datasets = Vec::new();
    for key in ["DATASET", "DATASET2"] {
        if let Some(id) = take_legacy(mapping, key, "datasets")? {
            let id = id
                .as_str()
                .ok_or_else(|| eyre!("'{}' must be a string", key))?
                .to_string();
            datasets.push(DatasetConfig {
                id,
                mount_point: None,
                read_only: false,
                writable_clone: false,
            });
        }
    }
    if !datasets.is_empty() {
        mapping.insert(
            Value::from("datasets"),
            serde_yaml::to_value(datasets).wrap_err("Failed to encode datasets")?,
        );
    }

    Ok(())
}

/// CLI arguments that override parameter file values
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub node_count: Option<u32>,
    pub extra_interface_count: Option<u32>,
    pub disk_image: Option<String>,
    pub hardware_type: Option<String>,
    pub use_virtual_machines: bool,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut ProfileConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(node_count) = overrides.node_count {
        info!("Overriding node_count: {} -> {}", config.node_count, node_count);
        config.node_count = node_count;
    }

    if let Some(extra) = overrides.extra_interface_count {
        info!("Overriding extra_interface_count: {} -> {}", config.extra_interface_count, extra);
        config.extra_interface_count = extra;
    }

    if let Some(image) = &overrides.disk_image {
        info!("Overriding disk_image: {}", image);
        config.disk_image = image.clone();
    }

    if let Some(hardware_type) = &overrides.hardware_type {
        info!("Overriding hardware_type: {}", hardware_type);
        config.hardware_type = Some(hardware_type.clone());
    }

    if overrides.use_virtual_machines {
        config.use_virtual_machines = true;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
node_count: 3
extra_interface_count: 1
datasets:
  - id: ds-a
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.node_count, 3);
        assert_eq!(config.datasets[0].id, "ds-a");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "node_count: 0\n").unwrap();
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Path::new("/nonexistent/params.yaml")).is_err());
    }

    #[test]
    fn test_portal_parameters_are_translated() {
        let yaml = r#"
clientCount: 2
osImage: "urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD"
DATASET: "urn:publicid:IDN+clemson.cloudlab.us:lrbplus-pg0+ltdataset+cacheDataset"
DATASET2: ""
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.node_count, 2);
        assert_eq!(config.server, Some(ServerRole::default()));
        assert!(config.disk_image.ends_with("UBUNTU18-64-STD"));
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.present_datasets().count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conflicting_names_rejected() {
        assert!(parse_config("clientCount: 2\nnode_count: 3\n").is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = parse_config("node_count: 2\n").unwrap();
        let overrides = CliOverrides {
            node_count: Some(5),
            extra_interface_count: Some(2),
            hardware_type: Some("m510".to_string()),
            use_virtual_machines: true,
            ..Default::default()
        };

        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.node_count, 5);
        assert_eq!(config.extra_interface_count, 2);
        assert_eq!(config.hardware_type.as_deref(), Some("m510"));
        assert!(config.use_virtual_machines);

        let bad = CliOverrides {
            node_count: Some(0),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
