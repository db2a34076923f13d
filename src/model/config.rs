use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from workspace.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub workspace: WorkspaceInfo,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default = "default_name")]
    pub name: String,
    /// Local user id, used for starring and as `created_by`
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for WorkspaceInfo {
    fn default() -> Self {
        WorkspaceInfo {
            name: default_name(),
            user: default_user(),
        }
    }
}

fn default_name() -> String {
    "Workspace".to_string()
}

fn default_user() -> String {
    "me".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Cells the pointer must travel before a press becomes a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: u16,
    #[serde(default = "default_true")]
    pub cancel_on_escape: bool,
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            drag_threshold: default_drag_threshold(),
            cancel_on_escape: true,
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

fn default_drag_threshold() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when CHANBAR_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: WorkspaceConfig = toml::from_str("").unwrap();
        assert_eq!(config.workspace.name, "Workspace");
        assert_eq!(config.workspace.user, "me");
        assert_eq!(config.ui.drag_threshold, 1);
        assert!(config.ui.cancel_on_escape);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn partial_tables_fill_in() {
        let config: WorkspaceConfig = toml::from_str(
            r##"
[workspace]
name = "Acme"

[ui]
drag_threshold = 3

[ui.colors]
highlight = "#FF0000"
"##,
        )
        .unwrap();
        assert_eq!(config.workspace.name, "Acme");
        assert_eq!(config.workspace.user, "me");
        assert_eq!(config.ui.drag_threshold, 3);
        assert!(config.ui.show_key_hints);
        assert_eq!(config.ui.colors.get("highlight").unwrap(), "#FF0000");
    }
}
