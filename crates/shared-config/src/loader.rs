use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::map::Entry;
use tracing::debug;

/// Directory, relative to the working directory, that [`load`] reads.
pub const CONFIG_DIR: &str = "configs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config: could not locate config directory {0}")]
    NotFound(PathBuf),
    #[error("config: could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config: could not parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("config: merged configuration does not match the target type: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Load `T` from the `configs/` directory of the current working directory.
pub fn load<T: DeserializeOwned>() -> Result<T, ConfigError> {
    load_dir(CONFIG_DIR)
}

/// Load `T` from every `.json`, `.yaml` and `.yml` file in `dir`.
///
/// Files are read in filename order and their top-level objects are merged
/// key by key, later files overriding earlier ones. Nested objects merge
/// recursively; any other value is replaced wholesale. The merged document
/// is then deserialized into `T`, so one struct can be filled from several
/// files (e.g. `app.json` and `clients.yaml`).
pub fn load_dir<T: DeserializeOwned>(dir: impl AsRef<Path>) -> Result<T, ConfigError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ConfigError::NotFound(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && Format::of(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut merged = Value::Object(Default::default());
    for path in &paths {
        let doc = read_file(path)?;
        merge(&mut merged, doc);
    }

    Ok(serde_json::from_value(merged)?)
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

fn read_file(path: &Path) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading config file");

    let parse_err = |reason: String| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    // `Format::of` already filtered the directory listing.
    match Format::of(path) {
        Some(Format::Yaml) => {
            serde_yaml::from_str::<Value>(&contents).map_err(|e| parse_err(e.to_string()))
        }
        _ => serde_json::from_str::<Value>(&contents).map_err(|e| parse_err(e.to_string())),
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.entry(key) {
                    Entry::Occupied(mut existing) => merge(existing.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
        }
        // An empty document (e.g. a blank YAML file) contributes nothing.
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overrides_scalars_and_recurses_into_objects() {
        let mut base = json!({"app": {"name": "a", "port": 1}, "level": "info"});
        merge(
            &mut base,
            json!({"app": {"port": 2}, "level": "debug", "extra": true}),
        );
        assert_eq!(
            base,
            json!({"app": {"name": "a", "port": 2}, "level": "debug", "extra": true})
        );
    }

    #[test]
    fn merge_ignores_null_documents() {
        let mut base = json!({"a": 1});
        merge(&mut base, Value::Null);
        assert_eq!(base, json!({"a": 1}));
    }

    #[test]
    fn merge_replaces_arrays() {
        let mut base = json!({"h": ["a", "b"]});
        merge(&mut base, json!({"h": ["c"]}));
        assert_eq!(base, json!({"h": ["c"]}));
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert!(matches!(Format::of(Path::new("a.json")), Some(Format::Json)));
        assert!(matches!(Format::of(Path::new("a.yml")), Some(Format::Yaml)));
        assert!(matches!(Format::of(Path::new("a.yaml")), Some(Format::Yaml)));
        assert!(Format::of(Path::new("a.toml")).is_none());
        assert!(Format::of(Path::new("README")).is_none());
    }
}
