//! An RFC 6901 ("JSON Pointer") view over an opaque object payload.
//!
//! `kube_core::dynamic::DynamicObject` stores everything below `metadata`/`apiVersion`/`kind` as a
//! bare `serde_json::Value` (`DynamicObject::data`). `DynTree` wraps that same shape so the
//! override engine and the renderer can get/set/remove arbitrary fields without a generated type
//! for every kind in the asset catalog.
use serde_json::Value;

use crate::error::{Error, Result};

/// A mutable, pointer-addressable JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct DynTree {
    root: Value,
}

impl DynTree {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Reads the value at `pointer`, or `None` if any segment of the path is absent.
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// Writes `value` at `pointer`, creating intermediate objects as needed.
    ///
    /// Mirrors the semantics of an RFC 6902 `add` operation: the parent must already exist (or be
    /// creatable by walking down from the root), and array segments must be either an index
    /// in-bounds or the `-` append marker.
    pub fn set(&mut self, pointer: &str, value: Value) -> Result<()> {
        if pointer.is_empty() {
            self.root = value;
            return Ok(());
        }
        let segments = split_pointer(pointer)?;
        set_at(&mut self.root, &segments, value)
    }

    /// Removes the value at `pointer`. A no-op if the pointer doesn't resolve.
    pub fn remove(&mut self, pointer: &str) -> Result<()> {
        if pointer.is_empty() {
            self.root = Value::Null;
            return Ok(());
        }
        let segments = split_pointer(pointer)?;
        remove_at(&mut self.root, &segments);
        Ok(())
    }

    /// `true` if `pointer` resolves to a value.
    pub fn contains(&self, pointer: &str) -> bool {
        self.root.pointer(pointer).is_some()
    }
}

/// Splits `/a/b~1c/0` into `["a", "b/c", "0"]`, unescaping `~1` and `~0` per RFC 6901 §4.
fn split_pointer(pointer: &str) -> Result<Vec<String>> {
    if !pointer.starts_with('/') {
        return Err(Error::Mask(format!("pointer {pointer:?} must start with '/'")));
    }
    Ok(pointer
        .split('/')
        .skip(1)
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn set_at(current: &mut Value, segments: &[String], value: Value) -> Result<()> {
    let (head, rest) = segments.split_first().expect("non-empty pointer");
    if rest.is_empty() {
        return insert_leaf(current, head, value);
    }
    let child = step_into_mut(current, head)?;
    set_at(child, rest, value)
}

fn insert_leaf(current: &mut Value, segment: &str, value: Value) -> Result<()> {
    match current {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if segment == "-" {
                arr.push(value);
                Ok(())
            } else {
                let idx = parse_index(segment)?;
                if idx == arr.len() {
                    arr.push(value);
                } else if idx < arr.len() {
                    arr[idx] = value;
                } else {
                    return Err(Error::Mask(format!("array index {idx} out of bounds")));
                }
                Ok(())
            }
        }
        Value::Null => {
            // Auto-vivify: an absent parent becomes an object.
            let mut map = serde_json::Map::new();
            map.insert(segment.to_string(), value);
            *current = Value::Object(map);
            Ok(())
        }
        other => Err(Error::Mask(format!("cannot index into {other:?} with segment {segment:?}"))),
    }
}

fn step_into_mut<'a>(current: &'a mut Value, segment: &str) -> Result<&'a mut Value> {
    match current {
        Value::Object(map) => {
            if !map.contains_key(segment) {
                map.insert(segment.to_string(), Value::Null);
            }
            Ok(map.get_mut(segment).expect("just inserted"))
        }
        Value::Array(arr) => {
            let idx = parse_index(segment)?;
            arr.get_mut(idx).ok_or_else(|| Error::Mask(format!("array index {idx} out of bounds")))
        }
        Value::Null => {
            *current = Value::Object(serde_json::Map::new());
            step_into_mut(current, segment)
        }
        other => Err(Error::Mask(format!("cannot descend into {other:?} with segment {segment:?}"))),
    }
}

fn parse_index(segment: &str) -> Result<usize> {
    segment.parse::<usize>().map_err(|_| Error::Mask(format!("invalid array index {segment:?}")))
}

fn remove_at(current: &mut Value, segments: &[String]) {
    let (head, rest) = match segments.split_first() {
        Some(pair) => pair,
        None => return,
    };
    if rest.is_empty() {
        match current {
            Value::Object(map) => {
                map.remove(head);
            }
            Value::Array(arr) => {
                if let Ok(idx) = parse_index(head) {
                    if idx < arr.len() {
                        arr.remove(idx);
                    }
                }
            }
            _ => {}
        }
        return;
    }
    let child = match current {
        Value::Object(map) => map.get_mut(head),
        Value::Array(arr) => parse_index(head).ok().and_then(move |idx| arr.get_mut(idx)),
        _ => None,
    };
    if let Some(child) = child {
        remove_at(child, rest);
    }
}
