use std::collections::BTreeSet;

use serde_json::Value;

use crate::types::{Content, values_eq};

/// Rendered when two contents are structurally equal.
pub const NO_CHANGES: &str = "(no changes)";

/// Label used for a change of the whole content.
const ROOT_PATH: &str = "_source";

/// Describes the structural difference between two contents.
///
/// Entries are separated by `; ` and use JSON paths such as `name`, `tags[2]` and `obj.sub`:
/// `-path: old` for removed values, `+path: new` for added values and `~path: old => new` for
/// changed values. A missing content counts as an empty object when the other side is an object.
pub fn describe_changes(src: Option<&Content>, dst: Option<&Content>) -> String {
    let mut changes = Vec::new();
    walk(
        "",
        src.map(Content::as_value),
        dst.map(Content::as_value),
        &mut changes,
    );

    if changes.is_empty() {
        return NO_CHANGES.to_owned();
    }

    changes.join("; ")
}

fn walk(path: &str, src: Option<&Value>, dst: Option<&Value>, changes: &mut Vec<String>) {
    match (src, dst) {
        (None, None) => {}
        (Some(Value::Object(src)), None) => {
            for (key, value) in src {
                walk(&child_path(path, key), Some(value), None, changes);
            }
        }
        (None, Some(Value::Object(dst))) => {
            for (key, value) in dst {
                walk(&child_path(path, key), None, Some(value), changes);
            }
        }
        (Some(src), None) => changes.push(format!("-{}: {src}", display_path(path))),
        (None, Some(dst)) => changes.push(format!("+{}: {dst}", display_path(path))),
        (Some(src), Some(dst)) if values_eq(src, dst) => {}
        (Some(Value::Object(src)), Some(Value::Object(dst))) => {
            let keys: BTreeSet<&String> = src.keys().chain(dst.keys()).collect();
            for key in keys {
                walk(&child_path(path, key), src.get(key), dst.get(key), changes);
            }
        }
        (Some(Value::Array(src)), Some(Value::Array(dst))) => {
            for index in 0..src.len().max(dst.len()) {
                walk(
                    &format!("{path}[{index}]"),
                    src.get(index),
                    dst.get(index),
                    changes,
                );
            }
        }
        (Some(src), Some(dst)) => {
            changes.push(format!("~{}: {src} => {dst}", display_path(path)));
        }
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { ROOT_PATH } else { path }
}
