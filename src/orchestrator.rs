//! Profile generation orchestrator.
//!
//! Coordinates the whole run: build the topology, render it, and write the
//! request. The output file is only touched once rendering has succeeded,
//! so a failed build leaves nothing behind.

use crate::config::ProfileConfig;
use crate::error::ProfileError;
use crate::rspec::{render, OutputFormat};
use crate::topology::{build_topology, TopologySummary};
use color_eyre::eyre::WrapErr;
use log::info;
use std::path::{Path, PathBuf};

/// Default file name when the output path is a directory
pub const DEFAULT_OUTPUT_STEM: &str = "profile";

/// Build and render the request for `config`
pub fn generate_request(config: &ProfileConfig, format: OutputFormat) -> Result<(String, TopologySummary), ProfileError> {
    let topology = build_topology(config)?;
    let document = render(&topology, format)?;
    Ok((document, topology.summary()))
}

/// Resolve where the request is written
///
/// An existing directory, or a new path without an extension, gets
/// `profile.<ext>` inside it; any other path is used as-is.
pub fn resolve_output_path(output: &Path, format: OutputFormat) -> PathBuf {
    if !output.is_dir() && output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.join(format!("{}.{}", DEFAULT_OUTPUT_STEM, format.extension()))
    }
}

/// Generate the request and write it under `output`
pub fn generate_profile(
    config: &ProfileConfig,
    output: &Path,
    format: OutputFormat,
) -> color_eyre::eyre::Result<PathBuf> {
    let (document, summary) = generate_request(config, format)?;

    let output_path = resolve_output_path(output, format);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create output directory '{}'", parent.display()))?;
        }
    }

    std::fs::write(&output_path, document)
        .map_err(|e| ProfileError::ExternalService(format!("failed to write '{}': {}", output_path.display(), e)))?;

    info!("Wrote {:?} request to {:?} ({})", format, output_path, summary);
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(
            resolve_output_path(Path::new("out"), OutputFormat::Rspec),
            PathBuf::from("out/profile.xml")
        );
        assert_eq!(
            resolve_output_path(Path::new("out/request.rspec"), OutputFormat::Rspec),
            PathBuf::from("out/request.rspec")
        );
    }

    #[test]
    fn test_existing_dotted_directory_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let results = dir.path().join("results.v2");
        std::fs::create_dir(&results).unwrap();

        assert_eq!(resolve_output_path(&results, OutputFormat::Yaml), results.join("profile.yaml"));

        let path = generate_profile(&ProfileConfig::with_node_count(2), &results, OutputFormat::Rspec).unwrap();
        assert_eq!(path, results.join("profile.xml"));
        assert!(path.is_file());
    }

    #[test]
    fn test_generate_profile_writes_file() {
        let dir = TempDir::new().unwrap();
        let config = ProfileConfig::with_node_count(2);

        let path = generate_profile(&config, dir.path(), OutputFormat::Json).unwrap();
        assert_eq!(path, dir.path().join("profile.json"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"node1\""));
    }

    #[test]
    fn test_failed_build_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = ProfileConfig::with_node_count(1);
        config.shared_segment = crate::config::SharedSegment::Always;

        assert!(generate_profile(&config, dir.path(), OutputFormat::Rspec).is_err());
        assert!(!dir.path().join("profile.xml").exists());
    }
}
