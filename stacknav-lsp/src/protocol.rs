//! The slice of the Language Server Protocol stacknav speaks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

/// LSP `SymbolKind` numbers used when filtering symbol results.
pub mod symbol_kind {
    pub const CLASS: u32 = 5;
    pub const ENUM: u32 = 10;
    pub const INTERFACE: u32 = 11;
}

/// A zero-based position in a text document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Document location. `WorkspaceSymbol` results may omit the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    #[serde(default)]
    pub range: Option<Range>,
}

impl Location {
    /// Filesystem path for `file://` URIs. Other schemes (for example the
    /// `jdt://` URIs jdtls hands out for classes inside jars) have no path.
    pub fn file_path(&self) -> Option<PathBuf> {
        let url = Url::parse(&self.uri).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        url.to_file_path().ok()
    }
}

/// One entry of a `workspace/symbol` result.
///
/// Covers both the `SymbolInformation` and the `WorkspaceSymbol` shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInformation {
    pub name: String,
    pub kind: u32,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Decode a `workspace/symbol` result, skipping entries that do not match
/// either symbol shape.
pub fn decode_symbols(result: Value) -> Vec<SymbolInformation> {
    let Value::Array(items) = result else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(symbol) => Some(symbol),
            Err(e) => {
                log::debug!("Skipping malformed workspace/symbol entry: {e}");
                None
            }
        })
        .collect()
}

/// `file://` URI for a directory, used as `rootUri`.
pub fn path_to_uri(path: &Path) -> Option<String> {
    Url::from_directory_path(path).ok().map(String::from)
}

/// Parameters for the `initialize` request.
pub fn initialize_params(root: &Path) -> Value {
    let root_uri = path_to_uri(root);
    json!({
        "processId": std::process::id(),
        "clientInfo": {
            "name": "stacknav",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "rootUri": root_uri,
        "rootPath": root.display().to_string(),
        "capabilities": {
            "workspace": {
                "configuration": true,
                "symbol": {
                    "dynamicRegistration": false,
                    "symbolKind": {
                        "valueSet": [symbol_kind::CLASS, symbol_kind::ENUM, symbol_kind::INTERFACE],
                    },
                },
            },
        },
        "workspaceFolders": root_uri.as_ref().map(|uri| json!([{
            "uri": uri,
            "name": root.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        }])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_symbol_information() {
        let result = json!([
            {
                "name": "MyClass",
                "kind": 5,
                "containerName": "com.example",
                "location": {
                    "uri": "file:///src/com/example/MyClass.java",
                    "range": {"start": {"line": 2, "character": 0}, "end": {"line": 2, "character": 7}}
                }
            },
            {"name": "broken"}
        ]);
        let symbols = decode_symbols(result);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].container_name.as_deref(), Some("com.example"));
        assert_eq!(symbols[0].kind, symbol_kind::CLASS);
    }

    #[test]
    fn test_decode_null_result() {
        assert!(decode_symbols(Value::Null).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uri_to_path() {
        let loc = Location {
            uri: "file:///src/com/example/My%20Class.java".to_string(),
            range: None,
        };
        assert_eq!(
            loc.file_path(),
            Some(PathBuf::from("/src/com/example/My Class.java"))
        );
    }

    #[test]
    fn test_non_file_uri_has_no_path() {
        let loc = Location {
            uri: "jdt://contents/rt.jar/java.lang/Thread.class".to_string(),
            range: None,
        };
        assert_eq!(loc.file_path(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_initialize_params_root_uri() {
        let params = initialize_params(Path::new("/srv/app"));
        assert_eq!(params["rootUri"], "file:///srv/app/");
        assert_eq!(params["workspaceFolders"][0]["name"], "app");
    }
}
