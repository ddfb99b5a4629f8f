//! Per-workspace settings file.
//!
//! A plain `key=value` file with whitespace trimmed on both sides of both
//! key and value. Reserved keys are typed; anything else accumulates in a
//! generic map so hosts can round-trip keys this crate does not know about.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Typed workspace settings plus pass-through custom keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    /// Width of one tab stop, in columns.
    pub tab_size: u32,
    /// Whether the tab key inserts spaces.
    pub use_spaces: bool,
    /// Color theme name.
    pub theme: String,
    /// Keys this crate does not interpret, preserved verbatim.
    pub custom: BTreeMap<String, String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            tab_size: 4,
            use_spaces: true,
            theme: "dark".to_string(),
            custom: BTreeMap::new(),
        }
    }
}

impl WorkspaceSettings {
    /// Parse settings from `key=value` text. Lines without `=` are skipped;
    /// unparsable reserved values keep their defaults.
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "tab_size" => {
                    if let Ok(size) = value.parse() {
                        settings.tab_size = size;
                    }
                }
                "use_spaces" => {
                    settings.use_spaces = value == "true" || value == "1";
                }
                "theme" => {
                    settings.theme = value.to_string();
                }
                _ => {
                    settings.custom.insert(key.to_string(), value.to_string());
                }
            }
        }

        settings
    }

    /// Load settings from `path`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| CoreError::io(path, err))?;
        Ok(Self::parse(&text))
    }

    /// Render the settings in `key=value` form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("tab_size={}\n", self.tab_size));
        out.push_str(&format!(
            "use_spaces={}\n",
            if self.use_spaces { "true" } else { "false" }
        ));
        out.push_str(&format!("theme={}\n", self.theme));
        for (key, value) in &self.custom {
            out.push_str(&format!("{}={}\n", key, value));
        }
        out
    }

    /// Write the settings to `path`.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        fs::write(path, self.render()).map_err(|err| CoreError::io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserved_keys() {
        let settings = WorkspaceSettings::parse("tab_size = 8\nuse_spaces = 0\ntheme = light\n");
        assert_eq!(settings.tab_size, 8);
        assert!(!settings.use_spaces);
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_use_spaces_accepts_one_and_true() {
        assert!(WorkspaceSettings::parse("use_spaces=1").use_spaces);
        assert!(WorkspaceSettings::parse("use_spaces=true").use_spaces);
        assert!(!WorkspaceSettings::parse("use_spaces=false").use_spaces);
    }

    #[test]
    fn test_unknown_keys_accumulate() {
        let settings = WorkspaceSettings::parse("font = monospace\n  ruler =  100 ");
        assert_eq!(settings.custom.get("font").unwrap(), "monospace");
        assert_eq!(settings.custom.get("ruler").unwrap(), "100");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let settings = WorkspaceSettings::parse("no equals here\ntab_size=not-a-number\n");
        assert_eq!(settings.tab_size, 4);
        assert!(settings.custom.is_empty());
    }

    #[test]
    fn test_render_roundtrip() {
        let mut settings = WorkspaceSettings::default();
        settings.tab_size = 2;
        settings.custom.insert("ruler".into(), "100".into());

        let reparsed = WorkspaceSettings::parse(&settings.render());
        assert_eq!(reparsed, settings);
    }
}
