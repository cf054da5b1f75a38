//! Read-modify-write helpers for JSON config files that hold MCP servers.
//!
//! The whole document is loaded, one section is edited in memory, and the
//! whole document is written back. Keys aix does not know about survive.

use aix_state::{atomic_write_json, existing_mode_or, AixError, Platform, DEFAULT_FILE_MODE};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

use crate::common::McpServer;
use crate::report::WriteReport;
use crate::Result;

pub(crate) type Document = Map<String, Value>;

/// Loads a JSON object document. A missing or blank file is empty.
pub(crate) fn load(path: &Path) -> Result<Document> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
        Err(e) => return Err(AixError::io("reading", path, e).into()),
    };
    if text.trim().is_empty() {
        return Ok(Document::new());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(AixError::parse(path, "expected a JSON object at the top level").into()),
        Err(e) => Err(AixError::parse(path, e.to_string()).into()),
    }
}

/// Writes the document back indented with a trailing newline, keeping the
/// file's permission bits.
pub(crate) fn save(path: &Path, doc: &Document) -> Result<()> {
    atomic_write_json(path, doc, existing_mode_or(path, DEFAULT_FILE_MODE))?;
    Ok(())
}

/// The object under `key`, if present.
pub(crate) fn section<'a>(doc: &'a Document, key: &str, path: &Path) -> Result<Option<&'a Document>> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(AixError::parse(path, format!("'{key}' must be an object")).into()),
    }
}

/// The object under `key`, created when absent.
pub(crate) fn section_mut<'a>(doc: &'a mut Document, key: &str, path: &Path) -> Result<&'a mut Document> {
    let slot = doc.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .ok_or_else(|| AixError::parse(path, format!("'{key}' must be an object")).into())
}

pub(crate) fn str_field(entry: &Document, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn bool_field(entry: &Document, key: &str) -> Option<bool> {
    entry.get(key).and_then(Value::as_bool)
}

/// String array under `key`; non-string items are skipped with a warning.
pub(crate) fn string_list(entry: &Document, key: &str, server: &str) -> Vec<String> {
    let Some(value) = entry.get(key) else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        warn!(server, field = key, "Expected an array, ignoring");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|v| match v.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                warn!(server, field = key, value = %v, "Skipping non-string entry");
                None
            }
        })
        .collect()
}

/// String map under `key`; non-string values are skipped with a warning.
pub(crate) fn string_map(entry: &Document, key: &str, server: &str) -> BTreeMap<String, String> {
    let Some(value) = entry.get(key) else {
        return BTreeMap::new();
    };
    let Some(map) = value.as_object() else {
        warn!(server, field = key, "Expected an object, ignoring");
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(k, v)| match v.as_str() {
            Some(s) => Some((k.clone(), s.to_string())),
            None => {
                warn!(server, field = key, key = %k, "Skipping non-string value");
                None
            }
        })
        .collect()
}

pub(crate) fn list_value(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

pub(crate) fn map_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Drops the fields of the transport the server does not use, and the OS
/// restriction when the target cannot store it.
pub(crate) fn drop_unportable(
    server: &McpServer,
    stdio: bool,
    keeps_platforms: bool,
    target: Platform,
    report: &mut WriteReport,
) {
    let item = format!("mcp server '{}'", server.name);
    if stdio {
        if server.url.is_some() {
            report.drop_field(target, &item, "url");
        }
        if !server.headers.is_empty() {
            report.drop_field(target, &item, "headers");
        }
    } else {
        if server.command.is_some() {
            report.drop_field(target, &item, "command");
        }
        if !server.args.is_empty() {
            report.drop_field(target, &item, "args");
        }
        if !server.env.is_empty() {
            report.drop_field(target, &item, "env");
        }
    }
    if !keeps_platforms && !server.platforms.is_empty() {
        report.drop_field(target, &item, "platforms");
    }
}
