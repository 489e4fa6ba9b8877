//! Shared test helpers for lmsp integration tests.
//!
//! All tests use temp directories. Projects are written as real `.lmsp`
//! archives (outer zip holding `scratch.sb3`, inner zip holding
//! `project.json`) or as bare JSON.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::process::{Command, Output};

use lmsp_core::Project;
use serde_json::{Value, json};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

// ---------------------------------------------------------------------------
// Fixture projects
// ---------------------------------------------------------------------------

fn document(variables: Value, broadcasts: Value, blocks: Value, comments: Value) -> Value {
    json!({
        "targets": [
            {
                "isStage": true, "name": "Stage",
                "variables": {}, "lists": {}, "broadcasts": broadcasts,
                "blocks": {}, "comments": {},
                "currentCostume": 0, "costumes": [], "sounds": []
            },
            {
                "isStage": false, "name": "Hub",
                "variables": variables, "lists": {}, "broadcasts": {},
                "blocks": blocks, "comments": comments,
                "currentCostume": 0, "costumes": [], "sounds": []
            }
        ],
        "monitors": [],
        "extensions": ["flipperevents"],
        "meta": { "semver": "3.0.0", "vm": "0.2.0", "agent": "" }
    })
}

fn definition(def: &str, proto: &str, proccode: &str, arg: &str, body: Option<&str>, x: f64, y: f64) -> [(String, Value); 3] {
    let reporter = format!("{proto}_{arg}");
    [
        (
            def.to_owned(),
            json!({
                "opcode": "procedures_definition",
                "next": body, "parent": null,
                "inputs": { "custom_block": [1, proto] }, "fields": {},
                "shadow": false, "topLevel": true, "x": x, "y": y
            }),
        ),
        (
            proto.to_owned(),
            json!({
                "opcode": "procedures_prototype",
                "next": null, "parent": def,
                "inputs": { arg: [1, reporter] }, "fields": {},
                "shadow": true, "topLevel": false,
                "mutation": {
                    "tagName": "mutation", "children": [],
                    "proccode": proccode,
                    "argumentids": serde_json::to_string(&[arg]).unwrap(),
                    "warp": "false"
                }
            }),
        ),
        (
            reporter,
            json!({
                "opcode": "argument_reporter_string_number",
                "next": null, "parent": proto,
                "inputs": {}, "fields": { "VALUE": ["power", null] },
                "shadow": true, "topLevel": false
            }),
        ),
    ]
}

fn call(id: &str, parent: &str, proccode: &str, arg: &str) -> (String, Value) {
    (
        id.to_owned(),
        json!({
            "opcode": "procedures_call",
            "next": null, "parent": parent,
            "inputs": { arg: [1, [4, "50"]] }, "fields": {},
            "shadow": false, "topLevel": false,
            "mutation": {
                "tagName": "mutation", "children": [],
                "proccode": proccode,
                "argumentids": serde_json::to_string(&[arg]).unwrap(),
                "warp": "false"
            }
        }),
    )
}

fn blocks(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(entries.into_iter().collect())
}

/// Source project.
///
/// 1. procedure `drive %s` (`ld`), body sets variable `speed` and
///    broadcasts `go`
/// 2. plain stack `{main}` (`lh`), calls `drive %s`
/// 3. unnamed plain stack (`lx`)
pub fn library() -> Value {
    let mut entries: Vec<(String, Value)> =
        definition("ld", "lp", "drive %s", "la", Some("ls"), 10.0, 10.0).into();
    entries.push((
        "ls".into(),
        json!({
            "opcode": "data_setvariableto",
            "next": "lg", "parent": "ld",
            "inputs": { "VALUE": [1, [10, "1"]] },
            "fields": { "VARIABLE": ["speed", "lv"] },
            "shadow": false, "topLevel": false
        }),
    ));
    entries.push((
        "lg".into(),
        json!({
            "opcode": "event_broadcast",
            "next": null, "parent": "ls",
            "inputs": { "BROADCAST_INPUT": [1, [11, "go", "lb"]] }, "fields": {},
            "shadow": false, "topLevel": false
        }),
    ));
    entries.push((
        "lh".into(),
        json!({
            "opcode": "flipperevents_whenProgramStarts",
            "next": "lc", "parent": null, "inputs": {}, "fields": {},
            "shadow": false, "topLevel": true, "x": 100, "y": 200, "comment": "lk"
        }),
    ));
    entries.push(call("lc", "lh", "drive %s", "la"));
    entries.push((
        "lx".into(),
        json!({
            "opcode": "flipperevents_whenProgramStarts",
            "next": null, "parent": null, "inputs": {}, "fields": {},
            "shadow": false, "topLevel": true, "x": 400, "y": 0
        }),
    ));
    document(
        json!({ "lv": ["speed", 0] }),
        json!({ "lb": "go" }),
        blocks(entries),
        json!({
            "lk": { "blockId": "lh", "x": 100, "y": 180, "width": 200, "height": 100,
                    "minimized": false, "text": "{main}" }
        }),
    )
}

/// Target project.
///
/// 1. procedure `drive %s` (`rd`) at (500, 600) with argument id `ra`
/// 2. plain stack `{main}` (`rh`), calls `drive %s`
/// 3. plain stack `{other}` (`ro`)
pub fn robot() -> Value {
    let mut entries: Vec<(String, Value)> =
        definition("rd", "rp", "drive %s", "ra", None, 500.0, 600.0).into();
    entries.push((
        "rh".into(),
        json!({
            "opcode": "flipperevents_whenProgramStarts",
            "next": "rc", "parent": null, "inputs": {}, "fields": {},
            "shadow": false, "topLevel": true, "x": 300, "y": 400, "comment": "rk"
        }),
    ));
    entries.push(call("rc", "rh", "drive %s", "ra"));
    entries.push((
        "ro".into(),
        json!({
            "opcode": "flipperevents_whenProgramStarts",
            "next": null, "parent": null, "inputs": {}, "fields": {},
            "shadow": false, "topLevel": true, "x": 0, "y": 900, "comment": "ok"
        }),
    ));
    document(
        json!({ "rv": ["speed", 5] }),
        json!({}),
        blocks(entries),
        json!({
            "rk": { "blockId": "rh", "x": 300, "y": 380, "width": 200, "height": 100,
                    "minimized": false, "text": "{main}" },
            "ok": { "blockId": "ro", "x": 0, "y": 880, "width": 200, "height": 100,
                    "minimized": false, "text": "{other}" }
        }),
    )
}

pub fn parse(doc: &Value) -> Project {
    serde_json::from_value(doc.clone()).expect("fixture should parse")
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub const ICON: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

/// Write `doc` as an `.lmsp` archive with an icon and one asset.
pub fn write_lmsp(path: &Path, doc: &Value) {
    let project = doc.to_string();
    let inner = zip_of(&[
        ("project.json", project.as_bytes()),
        ("cd21514d0531fdffb22204e0ec5ed84a.svg", b"<svg/>".as_slice()),
    ]);
    let outer = zip_of(&[
        ("manifest.json", br#"{"type":"word-blocks","name":"fixture"}"#.as_slice()),
        ("icon.svg", ICON.as_bytes()),
        ("scratch.sb3", inner.as_slice()),
    ]);
    std::fs::write(path, outer).unwrap();
}

pub fn write_json(path: &Path, doc: &Value) {
    std::fs::write(path, doc.to_string()).unwrap();
}

fn entry(zip: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(zip)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

/// Raw `project.json` text inside an `.lmsp` file.
pub fn read_lmsp_text(path: &Path) -> String {
    let outer = std::fs::read(path).unwrap();
    let inner = entry(&outer, "scratch.sb3");
    String::from_utf8(entry(&inner, "project.json")).unwrap()
}

/// Parse the project inside an `.lmsp` file.
pub fn read_lmsp(path: &Path) -> Project {
    Project::from_json(&read_lmsp_text(path)).unwrap()
}

/// Raw bytes of an outer archive entry.
pub fn outer_entry(path: &Path, name: &str) -> Vec<u8> {
    entry(&std::fs::read(path).unwrap(), name)
}

// ---------------------------------------------------------------------------
// Running the binary
// ---------------------------------------------------------------------------

/// Run lmsp in `dir`.
pub fn lmsp_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lmsp"))
        .args(args)
        .current_dir(dir)
        .env_remove("LMSP_CONFIG")
        .env_remove("LMSP_TRACE")
        .output()
        .expect("failed to execute lmsp")
}

/// Run lmsp and assert it succeeds. Returns stdout as string.
pub fn lmsp_ok(dir: &Path, args: &[&str]) -> String {
    let out = lmsp_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "lmsp {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run lmsp and assert it fails. Returns stderr as string.
pub fn lmsp_fails(dir: &Path, args: &[&str]) -> String {
    let out = lmsp_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected lmsp {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}
