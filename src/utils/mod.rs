//! Shared utilities: reference and name validation.

pub mod validation;

pub use validation::{is_image_urn, validate_dataset_reference, validate_mount_point, validate_resource_name};
