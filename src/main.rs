use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use rspecgen::config::ProfileConfig;
use rspecgen::config_loader::{self, CliOverrides};
use rspecgen::defaults::IMAGE_CATALOGUE;
use rspecgen::orchestrator;
use rspecgen::rspec::OutputFormat;

/// Topology request generator for testbed experiment profiles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the profile parameter YAML file
    #[arg(short, long, required_unless_present_any = ["list_images", "node_count"])]
    config: Option<PathBuf>,

    /// Output file, or directory for profile.<ext>
    #[arg(short, long, default_value = "profile_output")]
    output: PathBuf,

    /// Request document format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Rspec)]
    format: OutputFormat,

    /// Override the number of nodes
    #[arg(long)]
    node_count: Option<u32>,

    /// Override the number of extra addressed segments
    #[arg(long)]
    extra_interfaces: Option<u32>,

    /// Override the disk image URN
    #[arg(long)]
    image: Option<String>,

    /// Override the hardware type constraint
    #[arg(long)]
    hardware_type: Option<String>,

    /// Allocate virtual machines instead of physical nodes
    #[arg(long)]
    vm: bool,

    /// Print the image catalogue and exit
    #[arg(long)]
    list_images: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            node_count: self.node_count,
            extra_interface_count: self.extra_interfaces,
            disk_image: self.image.clone(),
            hardware_type: self.hardware_type.clone(),
            use_virtual_machines: self.vm,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if args.list_images {
        for (urn, label) in IMAGE_CATALOGUE {
            println!("{:<24} {}", label, urn);
        }
        return Ok(());
    }

    // Parameters come from the file, or from the CLI alone
    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => {
            info!("No parameter file given; starting from defaults");
            ProfileConfig::with_node_count(args.node_count.unwrap_or(1))
        }
    };
    config_loader::apply_overrides(&mut config, &args.overrides())?;

    info!("Output: {:?} ({:?})", args.output, args.format);
    let path = orchestrator::generate_profile(&config, &args.output, args.format)?;

    info!("Request ready for submission: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["rspecgen", "--config", "params.yaml"]);

        assert_eq!(args.config, Some(PathBuf::from("params.yaml")));
        assert_eq!(args.output, PathBuf::from("profile_output"));
        assert_eq!(args.format, OutputFormat::Rspec);
        assert!(!args.vm);
    }

    #[test]
    fn test_override_args() {
        let args = Args::parse_from([
            "rspecgen",
            "--node-count", "4",
            "--extra-interfaces", "2",
            "--vm",
            "--format", "json",
        ]);

        let overrides = args.overrides();
        assert_eq!(overrides.node_count, Some(4));
        assert_eq!(overrides.extra_interface_count, Some(2));
        assert!(overrides.use_virtual_machines);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_config_required_without_overrides() {
        assert!(Args::try_parse_from(["rspecgen"]).is_err());
        assert!(Args::try_parse_from(["rspecgen", "--list-images"]).is_ok());
    }
}
