//! Reference syntax checks.
//!
//! Dataset and image identifiers are checked for shape only. A value that
//! passes may still be rejected by the allocation backend (unknown
//! authority, missing permissions, typo in the name); full URN grammar and
//! existence checks are out of scope.

use regex::Regex;
use std::sync::OnceLock;

/// Dataset resource types accepted in a dataset URN
pub const DATASET_TYPES: &[&str] = &["dataset", "ltdataset", "stdataset", "imdataset"];

fn dataset_urn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^urn:publicid:IDN\+[^+\s]+\+(dataset|ltdataset|stdataset|imdataset)\+[^+\s]+$")
            .expect("dataset URN pattern is valid")
    })
}

fn short_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("short name pattern is valid"))
}

fn image_urn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^urn:publicid:IDN\+[^+\s]+\+image\+[^+\s]+$").expect("image URN pattern is valid")
    })
}

/// Validate a non-empty dataset identifier
///
/// Accepts either a dataset URN
/// (`urn:publicid:IDN+<authority>+<type>+<name>`, with `<type>` one of
/// [`DATASET_TYPES`]) or a plain dataset name such as `ds-a`, which the
/// portal resolves within the experiment's project.
///
/// # Examples
/// ```
/// use rspecgen::utils::validation::validate_dataset_reference;
///
/// assert!(validate_dataset_reference("urn:publicid:IDN+emulab.net:proj+ltdataset+scratch").is_ok());
/// assert!(validate_dataset_reference("ds-a").is_ok());
/// assert!(validate_dataset_reference("urn:publicid:IDN+emulab.net+image+foo").is_err());
/// ```
pub fn validate_dataset_reference(reference: &str) -> Result<(), String> {
    if reference.starts_with("urn:") {
        if dataset_urn_regex().is_match(reference) {
            return Ok(());
        }
        return Err(format!(
            "'{}' is not a dataset URN (expected urn:publicid:IDN+<authority>+<{}>+<name>)",
            reference,
            DATASET_TYPES.join("|")
        ));
    }

    if short_name_regex().is_match(reference) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is neither a dataset URN nor a plain dataset name",
            reference
        ))
    }
}

/// Check whether a disk image reference looks like an image URN
pub fn is_image_urn(reference: &str) -> bool {
    image_urn_regex().is_match(reference)
}

/// Check that a mount point is an absolute path without whitespace
pub fn validate_mount_point(mount_point: &str) -> Result<(), String> {
    if !mount_point.starts_with('/') {
        return Err(format!("mount point '{}' must be an absolute path", mount_point));
    }
    if mount_point.chars().any(char::is_whitespace) {
        return Err(format!("mount point '{}' must not contain whitespace", mount_point));
    }
    Ok(())
}

/// Check that a value can be used as a resource name in the request
pub fn validate_resource_name(name: &str) -> Result<(), String> {
    if short_name_regex().is_match(name) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid resource name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_urns() {
        assert!(validate_dataset_reference(
            "urn:publicid:IDN+clemson.cloudlab.us:lrbplus-pg0+ltdataset+cacheDataset"
        )
        .is_ok());
        assert!(validate_dataset_reference("urn:publicid:IDN+utah.cloudlab.us+stdataset+x").is_ok());
        assert!(validate_dataset_reference("urn:publicid:IDN+utah.cloudlab.us+dataset").is_err());
        assert!(validate_dataset_reference("urn:foo").is_err());
    }

    #[test]
    fn test_plain_dataset_names() {
        assert!(validate_dataset_reference("ds-a").is_ok());
        assert!(validate_dataset_reference("cache_v2.1").is_ok());
        assert!(validate_dataset_reference("has space").is_err());
        assert!(validate_dataset_reference("-leading-dash").is_err());
    }

    #[test]
    fn test_image_urns() {
        assert!(is_image_urn("urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD"));
        assert!(is_image_urn("urn:publicid:IDN+clemson.cloudlab.us+image+cops-PG0:lrb_omr.nfs"));
        assert!(!is_image_urn("UBUNTU18-64-STD"));
    }

    #[test]
    fn test_mount_points() {
        assert!(validate_mount_point("/nfs").is_ok());
        assert!(validate_mount_point("nfs").is_err());
        assert!(validate_mount_point("/my data").is_err());
    }
}
