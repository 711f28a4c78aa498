// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::errors::{Error, ErrorKind};
use serde_json::{Map, Value};

const OP_PARSE: &str = "parse_pointer";
const OP_SELECT: &str = "select_json_ld";

/// # Description
/// Parses an RFC 6901 JSON Pointer into its reference tokens, unescaping
/// `~1` to `/` and `~0` to `~`. The empty pointer selects the whole
/// document and parses to no tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, Error> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer.strip_prefix('/').ok_or_else(|| {
        Error::new(
            ErrorKind::ProofGenerationError,
            OP_PARSE,
            format!("JSON pointer {pointer:?} must be empty or start with '/'"),
        )
    })?;
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn pointer_mismatch(pointer: &str) -> Error {
    Error::new(
        ErrorKind::ProofGenerationError,
        OP_SELECT,
        format!("JSON pointer {pointer:?} does not match the document"),
    )
}

/// Seed selection for a node: non-blank identifiers and types are always
/// carried so ancestor statements stay intact under canonicalization.
fn initial_selection(source: &Value) -> Value {
    match source {
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(map) => {
            let mut selection = Map::new();
            for key in ["@id", "id"] {
                if let Some(id) = map.get(key) {
                    let blank = id.as_str().map(|s| s.starts_with("_:")).unwrap_or(false);
                    if !blank {
                        selection.insert(key.to_owned(), id.clone());
                    }
                }
            }
            for key in ["@type", "type"] {
                if let Some(ty) = map.get(key) {
                    selection.insert(key.to_owned(), ty.clone());
                }
            }
            Value::Object(selection)
        }
        other => other.clone(),
    }
}

/// Fetches `token` from `source`, interpreting it as an array index when the
/// container is an array.
fn source_child<'a>(source: &'a Value, token: &str) -> Option<&'a Value> {
    match source {
        Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(token),
        _ => None,
    }
}

/// Returns the selection node mirroring `source_child`, creating it (seeded
/// with its initial selection) when absent. Array slots are padded with
/// nulls and compacted after all pointers have been applied.
fn selection_child<'a>(
    selection: &'a mut Value,
    source_child: &Value,
    token: &str,
    pointer: &str,
) -> Result<&'a mut Value, Error> {
    match selection {
        Value::Object(map) => Ok(map
            .entry(token.to_owned())
            .or_insert_with(|| initial_selection(source_child))),
        Value::Array(items) => {
            let index = token
                .parse::<usize>()
                .map_err(|_| pointer_mismatch(pointer))?;
            while items.len() <= index {
                items.push(Value::Null);
            }
            if items[index].is_null() {
                items[index] = initial_selection(source_child);
            }
            Ok(&mut items[index])
        }
        _ => Err(pointer_mismatch(pointer)),
    }
}

fn set_selection_value(
    selection: &mut Value,
    token: &str,
    value: Value,
    pointer: &str,
) -> Result<(), Error> {
    match selection {
        Value::Object(map) => {
            map.insert(token.to_owned(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = token
                .parse::<usize>()
                .map_err(|_| pointer_mismatch(pointer))?;
            while items.len() <= index {
                items.push(Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        _ => Err(pointer_mismatch(pointer)),
    }
}

/// Null slots only mark unselected array positions; JSON-LD drops null array
/// entries during expansion, so stripping them preserves RDF semantics.
fn compact_arrays(value: &mut Value) {
    match value {
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            for item in items {
                compact_arrays(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                compact_arrays(item);
            }
        }
        _ => {}
    }
}

/// # Description
/// Selective JSON-LD projection: builds the sub-document of `document`
/// addressed by `pointers`. Every selected node keeps its ancestors'
/// `@id`/`@type` members and the top-level `@context`, so the selection
/// canonicalizes to a subset of the full document's statements.
///
/// # Output:
/// * `None` when `pointers` is empty, otherwise the selection document.
pub fn select_json_ld(pointers: &[String], document: &Value) -> Result<Option<Value>, Error> {
    if pointers.is_empty() {
        return Ok(None);
    }
    let mut selection = initial_selection(document);
    if let (Value::Object(map), Some(context)) = (&mut selection, document.get("@context")) {
        map.insert("@context".to_owned(), context.clone());
    }

    for pointer in pointers {
        let tokens = parse_pointer(pointer)?;
        if tokens.is_empty() {
            selection = document.clone();
            continue;
        }
        let mut current_source = document;
        let mut current_selection = &mut selection;
        for (position, token) in tokens.iter().enumerate() {
            let child = source_child(current_source, token)
                .ok_or_else(|| pointer_mismatch(pointer))?;
            if position + 1 == tokens.len() {
                set_selection_value(current_selection, token, child.clone(), pointer)?;
            } else {
                current_selection =
                    selection_child(current_selection, child, token, pointer)?;
                current_source = child;
            }
        }
    }

    compact_arrays(&mut selection);
    Ok(Some(selection))
}
