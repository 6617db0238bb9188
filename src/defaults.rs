//! Configuration defaults table.
//!
//! Role names, mount points, naming prefixes and the stock provisioning
//! commands used by the profile. The setup scripts on the nodes hardcode
//! several of these (server name, shared LAN name, export directory), so
//! change them together with the scripts.

use crate::process::HookStage;

/// Hostname of the dedicated server role.
pub const SERVER_NAME: &str = "nfs";

/// Name of the primary shared segment.
pub const SHARED_LAN_NAME: &str = "nfsLan";

/// Directory the server exports and the first dataset is mounted on.
pub const SHARED_DIRECTORY: &str = "/nfs";

/// Prefix for generated node hostnames (`node1`, `node2`, ...).
pub const NODE_PREFIX: &str = "node";

/// Prefix for extra LAN segments (`lan0`, `lan1`, ...).
pub const EXTRA_LAN_PREFIX: &str = "lan";

/// Prefix for extra point-to-point segments (`link0`, `link1`, ...).
pub const EXTRA_LINK_PREFIX: &str = "link";

/// Prefix for remote blockstore placeholder nodes.
pub const DATASET_NODE_PREFIX: &str = "dsnode";

/// Prefix for dedicated dataset links.
pub const DATASET_LINK_PREFIX: &str = "dslink";

/// Mount point for ephemeral local storage when none is given.
pub const EPHEMERAL_MOUNT_POINT: &str = "/mydata";

/// Shell used for provisioning services.
pub const DEFAULT_SHELL: &str = "sh";

/// Account the stock provisioning commands install files for.
pub const DEFAULT_PROVISION_USER: &str = "geniuser";

/// Placeholder substituted with the provisioning user in hook commands.
pub const USER_PLACEHOLDER: &str = "{user}";

/// First octets of every extra-segment address (`192.168.{segment}.{host}`).
pub const EXTRA_SEGMENT_PREFIX: [u8; 2] = [192, 168];

/// Netmask of every extra segment.
pub const EXTRA_SEGMENT_NETMASK: [u8; 4] = [255, 255, 255, 0];

/// Disk images offered by the profile, as `(urn, label)`.
pub const IMAGE_CATALOGUE: &[(&str, &str)] = &[
    ("urn:publicid:IDN+clemson.cloudlab.us+image+cops-PG0:lrb_omr.nfs", "WEBCACHESIM_SNAPSHOT"),
    ("urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD", "UBUNTU 18.04"),
    ("urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU16-64-STD", "UBUNTU 16.04"),
    ("urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU14-64-STD", "UBUNTU 14.04"),
    ("urn:publicid:IDN+emulab.net+image+emulab-ops//CENTOS7-64-STD", "CENTOS 7"),
];

/// Stock hooks for the server role.
pub const SERVER_HOOKS: &[(HookStage, &str)] = &[
    (HookStage::BaseSetup, "sudo /bin/bash /local/repository/nfs-server.sh"),
    (HookStage::Customize, "sudo /bin/echo ServerAliveInterval 60 >> /users/{user}/.ssh/config"),
];

/// Stock hooks for every other node.
pub const NODE_HOOKS: &[(HookStage, &str)] = &[
    (HookStage::BaseSetup, "sudo /bin/bash /local/repository/nfs-client.sh"),
    (HookStage::Customize, "sudo /bin/cp /local/repository/.bashrc /users/{user}/"),
    (HookStage::Credentials, "sudo /bin/cat /local/repository/id_rsa.pub >> /users/{user}/.ssh/authorized_keys"),
    (HookStage::Customize, "sudo /bin/echo ServerAliveInterval 60 >> /users/{user}/.ssh/config"),
];

/// Default disk image: the first catalogue entry.
pub fn default_image() -> String {
    IMAGE_CATALOGUE[0].0.to_string()
}

/// Mount point for the `index`-th dataset: `/nfs`, `/nfs2`, `/nfs3`, ...
pub fn dataset_mount_point(index: usize) -> String {
    if index == 0 {
        SHARED_DIRECTORY.to_string()
    } else {
        format!("{}{}", SHARED_DIRECTORY, index + 1)
    }
}

/// Look up the catalogue label for an image URN.
pub fn image_label(urn: &str) -> Option<&'static str> {
    IMAGE_CATALOGUE
        .iter()
        .find(|(candidate, _)| *candidate == urn)
        .map(|(_, label)| *label)
}
