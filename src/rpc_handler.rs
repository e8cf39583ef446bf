//! RPC method handler for the Chrome Collect JSON-RPC protocol.
//!
//! Kept apart from `main.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! lifecycle engine and update services via the `App` struct.

use crate::app::App;
use crate::services::lifecycle::{export_name, LifecycleTrait};
use crate::types::bookmark::{ListFilter, SaveInput};
use crate::types::update::UpdateRequest;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};

const DEFAULT_LIST_LIMIT: i64 = 50;

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

fn str_param<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

fn required<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    str_param(params, name)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {}", name))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// Operations on a record that does not exist report `{"ok": false}` or `null`.
pub fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    let engine = app.lifecycle();
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Bookmarks ───
        "bookmark.save" => {
            required(params, "url")?;
            required(params, "html")?;
            let input: SaveInput =
                serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))?;
            let saved = engine.save(&input).map_err(|e| e.to_string())?;
            to_json(&saved)
        }
        "bookmark.list" => {
            let filter = ListFilter::from_params(str_param(params, "query"), str_param(params, "url"));
            let limit = params
                .get("limit")
                .and_then(|v| v.as_i64())
                .unwrap_or(DEFAULT_LIST_LIMIT);
            let offset = params.get("offset").and_then(|v| v.as_i64()).unwrap_or(0);
            let page = engine.list(&filter, limit, offset).map_err(|e| e.to_string())?;
            to_json(&page)
        }
        "bookmark.get" => {
            let id = required(params, "id")?;
            let found = engine.get(id).map_err(|e| e.to_string())?;
            to_json(&found)
        }
        "bookmark.set_alias" => {
            let id = required(params, "id")?;
            let alias = str_param(params, "alias").ok_or("missing alias")?;
            let ok = engine.set_alias(id, alias.trim()).map_err(|e| e.to_string())?;
            Ok(json!({"ok": ok}))
        }
        "bookmark.set_notes" => {
            let id = required(params, "id")?;
            let notes = str_param(params, "notes").ok_or("missing notes")?;
            let ok = engine.set_notes(id, notes).map_err(|e| e.to_string())?;
            Ok(json!({"ok": ok}))
        }
        "bookmark.delete" => {
            let id = required(params, "id")?;
            let ok = engine.soft_delete(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": ok}))
        }
        "bookmark.export" => {
            let id = required(params, "id")?;
            let bookmark = engine
                .get(id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("not found: {}", id))?;
            let content = engine.read_content(id).map_err(|e| e.to_string())?;
            Ok(json!({
                "file_name": export_name(&bookmark, app.settings.storage.max_name_len),
                "html": String::from_utf8_lossy(&content),
            }))
        }
        "bookmark.thumbnail" => {
            let id = required(params, "id")?;
            let bytes = engine.read_thumbnail(id).map_err(|e| e.to_string())?;
            Ok(json!({"mime": "image/png", "data": base64_encode(&bytes)}))
        }

        // ─── Trash ───
        "trash.list" => {
            let items = engine.list_trash().map_err(|e| e.to_string())?;
            to_json(&items)
        }
        "trash.restore" => {
            let id = required(params, "id")?;
            let ok = engine.restore(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": ok}))
        }
        "trash.delete" => {
            let id = required(params, "id")?;
            let ok = engine.permanent_delete(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": ok}))
        }
        "trash.empty" => {
            let report = engine.empty_trash().map_err(|e| e.to_string())?;
            to_json(&report)
        }
        "stats" => {
            let stats = engine.stats().map_err(|e| e.to_string())?;
            to_json(&stats)
        }

        // ─── Updates ───
        "update.check" => {
            let force = params.get("force").and_then(|v| v.as_bool()).unwrap_or(false);
            to_json(&app.check_for_updates(force))
        }
        "update.request" => {
            let request = UpdateRequest {
                download_url: required(params, "download_url")?.to_string(),
                version: required(params, "version")?.to_string(),
                sha256: str_param(params, "sha256")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            };
            let accepted = app.request_update(request);
            Ok(json!({"accepted": accepted}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
