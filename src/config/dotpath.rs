//! Dotted-path addressing into JSON trees (`composer.install`).

use serde_json::{Map, Value};

use super::ConfigError;

/// Separator between key segments.
pub const SEPARATOR: char = '.';

fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Look up a dotted key. An empty key addresses the whole tree.
pub fn get<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = tree;
    for part in segments(key) {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Write `value` at a dotted key, creating intermediate objects.
///
/// `null` intermediates are replaced by objects; any other non-object
/// intermediate is an error.
pub fn set(tree: &mut Value, key: &str, value: Value) -> Result<(), ConfigError> {
    let parts: Vec<&str> = segments(key).collect();
    let Some((last, parents)) = parts.split_last() else {
        *tree = value;
        return Ok(());
    };

    // `walked` is always the dotted path of `current`
    let mut current = tree;
    let mut walked = String::new();
    for part in parents {
        current = object_mut(current, &walked)?
            .entry(part.to_string())
            .or_insert(Value::Null);
        if !walked.is_empty() {
            walked.push(SEPARATOR);
        }
        walked.push_str(part);
    }

    object_mut(current, &walked)?.insert(last.to_string(), value);
    Ok(())
}

/// Remove a dotted key, returning the removed value.
pub fn remove(tree: &mut Value, key: &str) -> Option<Value> {
    let parts: Vec<&str> = segments(key).collect();
    let (last, parents) = parts.split_last()?;

    let mut current = tree;
    for part in parents {
        current = current.as_object_mut()?.get_mut(*part)?;
    }
    current.as_object_mut()?.remove(*last)
}

fn object_mut<'a>(value: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>, ConfigError> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut().ok_or_else(|| ConfigError::NotAnObject {
        key: key.to_string(),
    })
}
