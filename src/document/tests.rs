// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{from_json_str, load, save, to_json_string, DocumentError};
use crate::model::fixtures::{endpoint, graph_diamond, nid, pid};
use crate::model::{Direction, GraphError, NodeGraph, Point, Size};

const SAMPLE: &str = r##"{
  "version": 1,
  "nodes": [
    { "id": "osc", "data": { "name": "Oscillator", "position": [24, 48], "size": [96, 72],
                             "display": "osc~", "color": "#ff8800" },
      "in":  [ { "id": "freq", "data": { "name": "frequency" } } ],
      "out": [ { "id": "sig", "data": { "name": "signal", "unit": "V" } } ] },
    { "id": "dac", "data": { "name": "Output", "position": [240, 48] },
      "in":  [ { "id": "left" }, { "id": "right" } ] }
  ],
  "connections": [ { "node1": "dac", "port1": "left", "node2": "osc", "port2": "sig" } ]
}"##;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let dir = std::env::temp_dir().join(format!("nod-document-{name}-{nanos}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[fixture]
fn sample() -> NodeGraph {
    from_json_str(SAMPLE).expect("sample parses")
}

#[rstest]
fn parses_nodes_ports_and_roles(sample: NodeGraph) {
    let osc = sample.node(&nid("osc")).expect("osc");
    assert_eq!(osc.label(), "Oscillator");
    assert_eq!(osc.position(), Point::new(24.0, 48.0));
    assert_eq!(osc.size(), Some(Size::new(96.0, 72.0)));
    assert_eq!(osc.extra().get("display"), Some(&serde_json::json!("osc~")));
    assert_eq!(osc.extra().get("color"), Some(&serde_json::json!("#ff8800")));

    let sig = osc.port(&pid("sig")).expect("sig");
    assert_eq!(sig.name(), "signal");
    assert_eq!(sig.direction(), Direction::Output);
    assert_eq!(sig.extra().get("unit"), Some(&serde_json::json!("V")));

    let dac = sample.node(&nid("dac")).expect("dac");
    assert_eq!(dac.size(), None);
    assert_eq!(dac.port(&pid("right")).map(|p| p.name()), Some("right"));
}

#[rstest]
fn connections_are_stored_output_first(sample: NodeGraph) {
    let (id, conn) = sample.connections().iter().next().expect("one connection");
    assert_eq!(id.as_str(), "osc.sig->dac.left");
    assert_eq!(conn.from(), &endpoint("osc", "sig"));
    assert_eq!(conn.to(), &endpoint("dac", "left"));
}

#[rstest]
fn round_trip_keeps_the_graph(sample: NodeGraph) {
    let text = to_json_string(&sample).expect("serialize");
    let back = from_json_str(&text).expect("reparse");
    assert_eq!(back, sample);

    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["version"], 1);
    assert_eq!(value["connections"][0]["node1"], "osc");
    assert_eq!(value["connections"][0]["port2"], "left");
}

#[test]
fn short_connection_keys_are_accepted() {
    let raw = r#"{ "version": 1,
        "nodes": [ { "id": "a", "out": [ { "id": "o" } ] }, { "id": "b", "in": [ { "id": "i" } ] } ],
        "connections": [ { "n1": "a", "p1": "o", "n2": "b", "p2": "i" } ] }"#;
    let graph = from_json_str(raw).expect("parse");
    let at_input = graph.connection_at(&nid("b"), &pid("i")).map(|(id, _)| id.as_str());
    assert_eq!(at_input, Some("a.o->b.i"));
    assert_eq!(graph.node(&nid("a")).map(|n| n.label()), Some("a"));
}

#[rstest]
#[case::future_version(r#"{ "version": 2, "nodes": [] }"#)]
#[case::zero_version(r#"{ "version": 0 }"#)]
fn rejects_other_versions(#[case] raw: &str) {
    let err = from_json_str(raw).unwrap_err();
    assert!(matches!(err, DocumentError::UnsupportedVersion { .. }), "{err}");
}

#[test]
fn rejects_missing_version() {
    let err = from_json_str(r#"{ "nodes": [] }"#).unwrap_err();
    assert!(matches!(err, DocumentError::Json { path: None, .. }), "{err}");
}

#[test]
fn rejects_invalid_ids() {
    let err = from_json_str(r#"{ "version": 1, "nodes": [ { "id": "a/b" } ] }"#).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidId { ref value, .. } if value == "a/b"), "{err}");
}

#[test]
fn rejects_malformed_roles() {
    let raw = r#"{ "version": 1, "nodes": [ { "id": "a", "data": { "position": "left" } } ] }"#;
    let err = from_json_str(raw).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidRole { role: "position", .. }), "{err}");
}

#[rstest]
#[case::across_directions(
    r#"{ "version": 1, "nodes": [ { "id": "f", "in": [ { "id": "sig" } ], "out": [ { "id": "sig" } ] } ] }"#
)]
#[case::within_inputs(r#"{ "version": 1, "nodes": [ { "id": "f", "in": [ { "id": "x" }, { "id": "x" } ] } ] }"#)]
fn rejects_port_ids_declared_twice(#[case] raw: &str) {
    let err = from_json_str(raw).unwrap_err();
    assert!(matches!(err, DocumentError::Graph(GraphError::DuplicatePort { .. })), "{err}");
}

#[test]
fn connection_to_unknown_port_is_a_graph_error() {
    let raw = r#"{ "version": 1,
        "nodes": [ { "id": "a", "out": [ { "id": "o" } ] } ],
        "connections": [ { "node1": "a", "port1": "o", "node2": "a", "port2": "missing" } ] }"#;
    let err = from_json_str(raw).unwrap_err();
    assert!(matches!(err, DocumentError::Graph(GraphError::UnknownPort { .. })), "{err}");
}

#[test]
fn save_then_load_through_a_file() {
    let dir = temp_dir("save");
    let path = dir.join("diamond.json");
    let graph = graph_diamond();

    save(&path, &graph).expect("save");
    let text = fs::read_to_string(&path).expect("read back");
    assert!(text.ends_with("}\n"));
    assert_eq!(load(&path).expect("load"), graph);

    // Only the document remains; the temporary file was renamed into place.
    let entries = fs::read_dir(&dir).expect("list").count();
    assert_eq!(entries, 1);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn load_reports_the_path() {
    let dir = temp_dir("broken");
    let path = dir.join("broken.json");
    fs::write(&path, "{ not json").expect("write");

    let err = load(&path).unwrap_err();
    assert!(matches!(err, DocumentError::Json { path: Some(ref p), .. } if p == &path), "{err}");

    let missing = load(&dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, DocumentError::Io { .. }), "{missing}");
    let _ = fs::remove_dir_all(&dir);
}
