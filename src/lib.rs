//! # rspecgen - Topology request generator for testbed experiment profiles
//!
//! This library turns a small set of profile parameters (node count, disk
//! image, hardware type, extra network interfaces, local storage, remote
//! datasets) into a complete resource request for a testbed portal.
//!
//! ## Overview
//!
//! A build is one synchronous pass: parameters are validated, the network
//! segments are allocated, every node is created and wired up, and the
//! resulting graph is checked for consistency before anything is rendered.
//! Either the whole request is produced or nothing is.
//!
//! ## Key Features
//!
//! - **Server/client layouts**: optional server role at ordinal 0 that holds
//!   every dataset and acts as the rendezvous point on the shared LAN
//! - **Deterministic addressing**: node `i` on extra segment `j` is always
//!   `192.168.j.(i+1)/24`
//! - **Storage**: ephemeral local blockstores and remote datasets, each
//!   dataset reached through its own link
//! - **Provisioning hooks**: setup commands scheduled in a fixed stage order
//! - **Output**: GENI RSpec v3 request XML, or the graph as YAML/JSON
//!
//! ## Architecture
//!
//! - `config`: parameter record, defaults and validation
//! - `config_loader`: parameter file loading, portal name translation, CLI overrides
//! - `defaults`: role names, mount points, image catalogue, stock hooks
//! - `topology`: graph types, builder and consistency checks
//! - `ip`: address derivation and per-segment registry
//! - `process`: provisioning hook scheduling
//! - `rspec`: request rendering
//! - `orchestrator`: build, render and write
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rspecgen::{config_loader, orchestrator, rspec::OutputFormat};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("params.yaml"))?;
//! let path = orchestrator::generate_profile(&config, Path::new("out"), OutputFormat::Rspec)?;
//! println!("request written to {}", path.display());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Parameter Format
//!
//! ```yaml
//! node_count: 3
//! extra_interface_count: 1
//! disk_image: "urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD"
//! server:
//!   name: nfs
//! ephemeral_storage:
//!   use_all_available: true
//! datasets:
//!   - id: "urn:publicid:IDN+clemson.cloudlab.us:proj-pg0+ltdataset+cache"
//!     read_only: true
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`error::ProfileError`]; the binary and the
//! orchestrator wrap it with `color_eyre` context.

pub mod config;
pub mod config_loader;
pub mod defaults;
pub mod error;

pub mod ip;
pub mod topology;
pub mod process;
pub mod rspec;
pub mod utils;
pub mod orchestrator;
