//! Declaration loading with JSON-path context in error messages.
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Module, ModuleSet};

/// Deserialize, reporting where in the document a value failed.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Parse an analyzer document: one module or an array of them. `pointer`
/// selects a subnode first (e.g. `/bindings/modules`).
pub fn modules_from_str(src: &str, pointer: Option<&str>) -> Result<Vec<Module>, String> {
    let mut document: Value = from_str_with_path(src)?;
    let selected = match pointer {
        None => document,
        Some(pointer) => document
            .pointer_mut(pointer)
            .map(Value::take)
            .ok_or_else(|| format!("JSON pointer {pointer} selects nothing"))?,
    };
    let set = if selected.is_array() {
        ModuleSet::Many(from_value_with_path(selected)?)
    } else {
        ModuleSet::One(from_value_with_path(selected)?)
    };
    Ok(set.into_vec())
}

pub fn load_modules(path: &Path, pointer: Option<&str>) -> Result<Vec<Module>> {
    std::fs::read_to_string(path)
        .map_err(|error| error.to_string())
        .and_then(|source| modules_from_str(&source, pointer))
        .map_err(|message| Error::Load {
            path: path.to_path_buf(),
            message,
        })
}
