//! Integration tests for the nodeconf-core public API.
//!
//! These tests drive the parser, serializer, projector and merger together on
//! realistic configuration files, the way the service crate uses them.

use nodeconf_core::{
    merge, parse, parse_bytes, project, serialize, AllowedKeys, Document, GLOBAL_BUCKET,
};

/// A hand-edited file with every formatting quirk the parser must keep.
const HAND_EDITED: &str = "\
# Node configuration
; generated once, edited by hand since

server=1
rpcuser = alice
  rpcpassword=  s3cr3t\t
listen=1
dangling line without delimiter

[main]   # mainnet-only settings
rpcport=51735
\t# indented comment
[test]
rpcport=51935
[]
late=global
[main]
rpcport=51736";

fn changes(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    json.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_round_trip_is_byte_identical_for_hand_edited_file() {
    assert_eq!(serialize(&parse(HAND_EDITED)), HAND_EDITED);
}

#[test]
fn test_round_trip_preserves_crlf_files() {
    let text = HAND_EDITED.replace('\n', "\r\n");
    assert_eq!(serialize(&parse(&text)), text);
}

#[test]
fn test_round_trip_preserves_mixed_newlines() {
    let text = "a=1\r\nb=2\n\r\n[s]\nc=3\r\n";
    assert_eq!(serialize(&parse(text)), text);
}

#[test]
fn test_round_trip_preserves_lone_carriage_returns() {
    let text = "a=1\rb=2\n";
    assert_eq!(serialize(&parse(text)), text);
}

#[test]
fn test_parse_bytes_round_trip() {
    let doc = parse_bytes(HAND_EDITED.as_bytes()).expect("valid utf-8");
    assert_eq!(serialize(&doc).as_bytes(), HAND_EDITED.as_bytes());
}

#[test]
fn test_projection_of_hand_edited_file() {
    // Act
    let settings = project(&parse(HAND_EDITED));

    // Assert
    let global = &settings[GLOBAL_BUCKET];
    assert_eq!(global["rpcuser"].to_string(), "alice");
    assert_eq!(global["rpcpassword"].to_string(), "s3cr3t");
    assert_eq!(global["listen"].to_string(), "1");
    assert_eq!(global["late"].to_string(), "global");
    assert!(!global.contains_key("dangling line without delimiter"));
    assert_eq!(settings["main"]["rpcport"].to_string(), "51736");
    assert_eq!(settings["test"]["rpcport"].to_string(), "51935");
}

#[test]
fn test_missing_file_equivalent_projects_to_empty_mapping() {
    let doc = Document::default();
    assert_eq!(doc.sections.len(), 0);
    assert!(project(&doc).is_empty());
}

#[test]
fn test_merge_only_touches_the_intended_line() {
    // Arrange
    let allowed = AllowedKeys::new(["addressindex"]);

    // Act
    let merged = merge(
        parse(HAND_EDITED),
        &changes(serde_json::json!({"addressindex": true, "server": 0})),
        &allowed,
    );
    let out = serialize(&merged.document);

    // Assert: the output is the input with exactly one line inserted at the
    // end of the global section.
    let expected = HAND_EDITED.replacen(
        "dangling line without delimiter\n\n",
        "dangling line without delimiter\n\naddressindex=1\n",
        1,
    );
    assert!(merged.modified);
    assert_eq!(out, expected);
}

#[test]
fn test_merge_then_merge_again_is_stable() {
    let allowed = AllowedKeys::new(["addressindex"]);
    let change_set = changes(serde_json::json!({"addressindex": false}));

    let first = merge(parse(HAND_EDITED), &change_set, &allowed);
    let first_text = serialize(&first.document);
    let second = merge(parse(&first_text), &change_set, &allowed);

    assert!(first.modified);
    assert!(!second.modified);
    assert_eq!(serialize(&second.document), first_text);
}

#[test]
fn test_raw_document_survives_json_round_trip() {
    // The service returns the raw document to clients as JSON and may get it
    // back; the text must not change along the way.
    let doc = parse(HAND_EDITED);
    let json = serde_json::to_string(&doc).expect("serialize");
    let restored: Document = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(serialize(&restored), HAND_EDITED);
}
