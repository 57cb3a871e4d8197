//! Structured config documents on disk.
//!
//! The format is chosen by extension: `.json` or `.toml`. TOML documents are
//! converted to JSON values on read and back on write; TOML has no null, so
//! null leaves are dropped when writing TOML.

use serde_json::Value;
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Read and parse a whole document
pub fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let format = Format::from_path(path)?;
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match format {
        Format::Json => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string())),
        Format::Toml => {
            let table: toml::Table =
                toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
    }
}

/// Serialize and write a whole document, creating parent directories
pub fn write_document(path: &Path, document: &Value) -> Result<(), ConfigError> {
    let format = Format::from_path(path)?;
    let write_error = |message: String| ConfigError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut text = match format {
        Format::Json => {
            serde_json::to_string_pretty(document).map_err(|e| write_error(e.to_string()))?
        }
        Format::Toml => {
            let Some(table @ toml::Value::Table(_)) = json_to_toml(document) else {
                return Err(write_error("TOML documents must be tables".to_string()));
            };
            toml::to_string_pretty(&table).map_err(|e| write_error(e.to_string()))?
        }
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }
    fs::write(path, text).map_err(|e| write_error(e.to_string()))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Convert JSON Value to TOML Value; `None` for null
fn json_to_toml(json: &Value) -> Option<toml::Value> {
    match json {
        Value::Null => None,
        Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(toml::Value::Integer(i)),
            None => n.as_f64().map(toml::Value::Float),
        },
        Value::String(s) => Some(toml::Value::String(s.clone())),
        Value::Array(arr) => Some(toml::Value::Array(
            arr.iter().filter_map(json_to_toml).collect(),
        )),
        Value::Object(map) => Some(toml::Value::Table(
            map.iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("wpbundle.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.TOML")).unwrap(), Format::Toml);
        assert!(matches!(
            Format::from_path(Path::new("wpbundle.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
        assert!(Format::from_path(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let err = read_document(&dir.path().join("wpbundle.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_read_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wpbundle.json");
        fs::write(&path, "{\"output\": ").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_read_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wpbundle.toml");
        fs::write(
            &path,
            "output = \"build\"\ninclude = [\"src\", \"*.php\"]\n\n[composer]\ninstall = false\n",
        )
        .unwrap();

        let document = read_document(&path).unwrap();
        assert_eq!(
            document,
            json!({
                "output": "build",
                "include": ["src", "*.php"],
                "composer": {"install": false}
            })
        );
    }

    #[test]
    fn test_json_written_pretty_with_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/wpbundle.json");

        write_document(&path, &json!({"b": 1, "a": [true]})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert_eq!(read_document(&path).unwrap(), json!({"a": [true], "b": 1}));
    }

    #[test]
    fn test_toml_write_drops_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wpbundle.toml");

        write_document(&path, &json!({"output": "dist", "archive": {"name": null, "enabled": true}}))
            .unwrap();

        assert_eq!(
            read_document(&path).unwrap(),
            json!({"output": "dist", "archive": {"enabled": true}})
        );
    }

    #[test]
    fn test_toml_write_rejects_scalar_document() {
        let dir = TempDir::new().unwrap();
        let err = write_document(&dir.path().join("x.toml"), &json!(3)).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
    }
}
