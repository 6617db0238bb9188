//! Output format selection.

use crate::error::ProfileResult;
use crate::topology::Topology;
use super::writer::render_rspec;

/// Document format of the rendered request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// GENI RSpec v3 request XML
    #[default]
    Rspec,
    /// Topology graph as YAML
    Yaml,
    /// Topology graph as pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// File extension used when the output path is a directory
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Rspec => "xml",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// Render `topology` in the requested format
pub fn render(topology: &Topology, format: OutputFormat) -> ProfileResult<String> {
    match format {
        OutputFormat::Rspec => Ok(render_rspec(topology)),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(topology)?),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(topology)?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::topology::build_topology;

    #[test]
    fn test_json_output_parses_back() {
        let mut config = ProfileConfig::with_node_count(2);
        config.extra_interface_count = 1;
        let topology = build_topology(&config).unwrap();

        let json = render(&topology, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["segments"][0]["name"], "link0");
        assert_eq!(value["interfaces"][1]["address"]["address"], "192.168.0.1");
    }

    #[test]
    fn test_yaml_output_mentions_nodes() {
        let topology = build_topology(&ProfileConfig::with_node_count(2)).unwrap();
        let yaml = render(&topology, OutputFormat::Yaml).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["nodes"][0]["name"].as_str(), Some("node0"));
        assert_eq!(value["nodes"][1]["kind"].as_str(), Some("raw_pc"));
    }

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::default().extension(), "xml");
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}
