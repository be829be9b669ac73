/// Console host configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Layout loaded at startup and by a bare `reset`.
    pub default_layout: String,
    /// Print a JSON snapshot after every command instead of the text board.
    pub json_snapshots: bool,
    /// List the legal targets when a square is selected.
    pub show_legal_after_select: bool,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            default_layout: std::env::var("CHESS_LAYOUT").unwrap_or(defaults.default_layout),
            json_snapshots: flag("CHESS_JSON").unwrap_or(defaults.json_snapshots),
            show_legal_after_select: flag("CHESS_SHOW_LEGAL")
                .unwrap_or(defaults.show_legal_after_select),
        }
    }
}

/// Boolean env var: `1`/`true`/`yes`/`on` or `0`/`false`/`no`/`off`.
fn flag(name: &str) -> Option<bool> {
    parse_flag(&std::env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_layout: "standard".to_string(),
            json_snapshots: false,
            show_legal_after_select: true,
        }
    }
}
