//! Built-in fallbacks (lowest-priority registry)
//!
//! Every setting the bundle pipeline reads has a value here, so a project
//! without any configuration file still bundles.

use serde::{Deserialize, Serialize};

/// Built-in fallback configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinFallbacks {
    /// Output directory, relative to the project root (default: "dist")
    pub output: String,

    /// Remove the output directory before copying (default: true)
    pub clean: bool,

    /// Include patterns (default: every top-level entry)
    pub include: Vec<String>,

    /// Exclude patterns (default: none)
    pub exclude: Vec<String>,

    /// Extra include pattern file (default: ".wpinclude")
    pub include_file: String,

    /// Extra exclude pattern file (default: ".wpexclude")
    pub exclude_file: String,

    /// Run `composer install` in the output directory (default: true)
    pub composer_install: bool,

    /// Composer binary name or path
    pub composer_binary: String,

    /// Arguments passed to composer
    pub composer_args: Vec<String>,

    /// Run php-scoper in the output directory (default: false)
    pub scoper_enabled: bool,

    /// php-scoper binary name or path
    pub scoper_binary: String,

    /// Arguments passed to php-scoper
    pub scoper_args: Vec<String>,

    /// Write an archive of the output directory (default: false)
    pub archive_enabled: bool,

    /// Archive base name; empty means the project directory name
    pub archive_name: String,

    /// Archive format (default: "zip")
    pub archive_format: String,
}

impl Default for BuiltinFallbacks {
    fn default() -> Self {
        Self {
            output: "dist".to_string(),
            clean: true,
            include: vec!["*".to_string()],
            exclude: Vec::new(),
            include_file: ".wpinclude".to_string(),
            exclude_file: ".wpexclude".to_string(),
            composer_install: true,
            composer_binary: "composer".to_string(),
            composer_args: [
                "install",
                "--no-dev",
                "--optimize-autoloader",
                "--no-interaction",
                "--prefer-dist",
            ]
            .map(String::from)
            .to_vec(),
            scoper_enabled: false,
            scoper_binary: "php-scoper".to_string(),
            scoper_args: ["add-prefix", "--force", "--quiet"]
                .map(String::from)
                .to_vec(),
            archive_enabled: false,
            archive_name: String::new(),
            archive_format: "zip".to_string(),
        }
    }
}

impl BuiltinFallbacks {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "output": self.output,
            "clean": self.clean,
            "include": self.include,
            "exclude": self.exclude,
            "include_file": self.include_file,
            "exclude_file": self.exclude_file,
            "composer": {
                "install": self.composer_install,
                "binary": self.composer_binary,
                "args": self.composer_args
            },
            "scoper": {
                "enabled": self.scoper_enabled,
                "binary": self.scoper_binary,
                "args": self.scoper_args
            },
            "archive": {
                "enabled": self.archive_enabled,
                "name": self.archive_name,
                "format": self.archive_format
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks() {
        let fallbacks = BuiltinFallbacks::default();
        assert_eq!(fallbacks.output, "dist");
        assert!(fallbacks.clean);
        assert_eq!(fallbacks.include, vec!["*"]);
        assert!(fallbacks.exclude.is_empty());
        assert!(fallbacks.composer_install);
        assert!(!fallbacks.scoper_enabled);
        assert!(!fallbacks.archive_enabled);
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinFallbacks::default().to_value();

        assert_eq!(value["output"], "dist");
        assert_eq!(value["include"], serde_json::json!(["*"]));
        assert_eq!(value["composer"]["install"], true);
        assert_eq!(value["composer"]["args"][1], "--no-dev");
        assert_eq!(value["archive"]["format"], "zip");
    }
}
