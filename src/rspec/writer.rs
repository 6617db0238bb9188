//! RSpec v3 request writer.

use crate::topology::{Node, Segment, SegmentKind, StorageEndpoint, StorageVolume, Topology};

pub const RSPEC_NS: &str = "http://www.geni.net/resources/rspec/3";
pub const EMULAB_NS: &str = "http://www.protogeni.net/resources/rspec/ext/emulab/1";
pub const TOUR_NS: &str = "http://www.protogeni.net/resources/rspec/ext/apt-tour/1";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const SCHEMA_LOCATION: &str =
    "http://www.geni.net/resources/rspec/3 http://www.geni.net/resources/rspec/3/request.xsd";

/// Sliver type of remote blockstore placeholder nodes
const BLOCKSTORE_SLIVER: &str = "emulab-blockstore";

/// Escape a value for use inside a double-quoted attribute or text node
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn attrs(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!(" {}=\"{}\"", key, escape_xml(value)))
        .collect()
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "true"
    } else {
        "false"
    }
}

/// Render the request document for `topology`
///
/// Elements appear in graph order: tour, nodes, storage endpoints, then
/// segments. The same topology always renders to the same bytes.
pub fn render_rspec(topology: &Topology) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    push_line(
        &mut out,
        0,
        &format!(
            "<rspec{}>",
            attrs(&[
                ("xmlns", RSPEC_NS),
                ("xmlns:emulab", EMULAB_NS),
                ("xmlns:xsi", XSI_NS),
                ("xsi:schemaLocation", SCHEMA_LOCATION),
                ("type", "request"),
            ])
        ),
    );

    write_tour(&mut out, topology);
    for node in &topology.nodes {
        write_node(&mut out, topology, node);
    }
    for endpoint in &topology.endpoints {
        write_endpoint(&mut out, topology, endpoint);
    }
    for segment in &topology.segments {
        write_segment(&mut out, topology, segment);
    }

    push_line(&mut out, 0, "</rspec>");
    out
}

fn write_tour(out: &mut String, topology: &Topology) {
    if topology.description.is_none() && topology.instructions.is_none() {
        return;
    }
    push_line(out, 1, &format!("<rspec_tour{}>", attrs(&[("xmlns", TOUR_NS)])));
    if let Some(description) = &topology.description {
        push_line(
            out,
            2,
            &format!("<description type=\"markdown\">{}</description>", escape_xml(description)),
        );
    }
    if let Some(instructions) = &topology.instructions {
        push_line(
            out,
            2,
            &format!("<instructions type=\"markdown\">{}</instructions>", escape_xml(instructions)),
        );
    }
    push_line(out, 1, "</rspec_tour>");
}

fn write_node(out: &mut String, topology: &Topology, node: &Node) {
    push_line(
        out,
        1,
        &format!(
            "<node{}>",
            attrs(&[("client_id", node.name.as_str()), ("exclusive", flag(node.kind.is_exclusive()))])
        ),
    );
    push_line(out, 2, &format!("<sliver_type{}>", attrs(&[("name", node.kind.sliver_type())])));
    push_line(out, 3, &format!("<disk_image{}/>", attrs(&[("name", node.disk_image.as_str())])));
    push_line(out, 2, "</sliver_type>");

    if let Some(hardware_type) = &node.hardware_type {
        push_line(out, 2, &format!("<hardware_type{}/>", attrs(&[("name", hardware_type.as_str())])));
    }

    if !node.services.is_empty() {
        push_line(out, 2, "<services>");
        for service in &node.services {
            push_line(
                out,
                3,
                &format!(
                    "<execute{}/>",
                    attrs(&[("shell", service.shell.as_str()), ("command", service.command.as_str())])
                ),
            );
        }
        push_line(out, 2, "</services>");
    }

    for interface in node.interfaces.iter().map(|id| topology.interface(*id)) {
        match interface.address {
            Some(assignment) => {
                push_line(out, 2, &format!("<interface{}>", attrs(&[("client_id", interface.client_id.as_str())])));
                push_line(
                    out,
                    3,
                    &format!(
                        "<ip{}/>",
                        attrs(&[
                            ("address", assignment.address.to_string().as_str()),
                            ("netmask", assignment.netmask.to_string().as_str()),
                            ("type", "ipv4"),
                        ])
                    ),
                );
                push_line(out, 2, "</interface>");
            }
            None => {
                push_line(out, 2, &format!("<interface{}/>", attrs(&[("client_id", interface.client_id.as_str())])));
            }
        }
    }

    // Dataset volumes are rendered on their storage endpoints
    for volume in node.volumes.iter().map(|id| topology.volume(*id)) {
        if let StorageVolume::Ephemeral {
            name,
            size_gb,
            mount_point,
            placement,
            ..
        } = volume
        {
            push_line(
                out,
                2,
                &format!(
                    "<emulab:blockstore{}/>",
                    attrs(&[
                        ("name", name.as_str()),
                        ("mountpoint", mount_point.as_str()),
                        ("class", "local"),
                        ("size", format!("{}GB", size_gb).as_str()),
                        ("placement", placement.as_str()),
                    ])
                ),
            );
        }
    }

    push_line(out, 1, "</node>");
}

fn write_endpoint(out: &mut String, topology: &Topology, endpoint: &StorageEndpoint) {
    push_line(
        out,
        1,
        &format!("<node{}>", attrs(&[("client_id", endpoint.name.as_str()), ("exclusive", "false")])),
    );
    push_line(out, 2, &format!("<sliver_type{}/>", attrs(&[("name", BLOCKSTORE_SLIVER)])));
    push_line(
        out,
        2,
        &format!(
            "<interface{}/>",
            attrs(&[("client_id", topology.interface(endpoint.interface).client_id.as_str())])
        ),
    );
    if let StorageVolume::Dataset {
        dataset,
        mount_point,
        read_only,
        writable_clone,
    } = topology.volume(endpoint.volume)
    {
        let name = format!("{}-bs", endpoint.name);
        push_line(
            out,
            2,
            &format!(
                "<emulab:blockstore{}/>",
                attrs(&[
                    ("name", name.as_str()),
                    ("mountpoint", mount_point.as_str()),
                    ("class", "remote"),
                    ("placement", "any"),
                    ("readonly", flag(*read_only)),
                    ("rwclone", flag(*writable_clone)),
                    ("dataset", dataset.as_str()),
                ])
            ),
        );
    }
    push_line(out, 1, "</node>");
}

fn write_segment(out: &mut String, topology: &Topology, segment: &Segment) {
    push_line(out, 1, &format!("<link{}>", attrs(&[("client_id", segment.name.as_str())])));
    for member in segment.members.iter().map(|id| topology.interface(*id)) {
        push_line(out, 2, &format!("<interface_ref{}/>", attrs(&[("client_id", member.client_id.as_str())])));
    }
    let flags = [
        ("best_effort", segment.flags.best_effort),
        ("vlan_tagging", segment.flags.vlan_tagging),
        ("link_multiplexing", segment.flags.link_multiplexing),
    ];
    for (name, enabled) in flags {
        if enabled {
            push_line(out, 2, &format!("<emulab:{} enabled=\"true\"/>", name));
        }
    }
    if segment.kind == SegmentKind::Lan {
        push_line(out, 2, "<link_type name=\"lan\"/>");
    }
    push_line(out, 1, "</link>");
}
