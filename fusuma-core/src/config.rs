//! Configuration file support.
//!
//! The file is TOML with `[general]`, `[layout]`, `[min_sizes]` and
//! `[hotkeys]` tables. Every table and key is optional; a missing file yields
//! the defaults.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::event::Action;
use crate::geometry::Size;
use crate::hotkey::{parse_hotkey, HotkeyMap, MatchPolicy};
use crate::layout::{CenterStage, Layout, LayoutConfig, Panel, VerticalSplit};

/// Written by `fusuma init-config`.
pub const TEMPLATE: &str = r#"# fusuma configuration

[general]
# Bundle identifiers that are never managed.
ignored_bundles = ["com.apple.finder"]
# "first": only the first matching hotkey fires. "all": every match fires.
hotkey_match = "first"

[layout]
# "center_stage", "panel" or "vertical_split"
kind = "panel"
border = 40
gutter = 40
# Master column share for vertical_split.
ratio = 0.5
ignore_menu = true

[min_sizes]
# Application title (case-insensitive) = [width, height]
# terminal = [480, 320]

[hotkeys]
# action = "<modifiers...> <key code or key name>"
reflow = "cmd alt 15"
reload = "cmd alt shift 15"
"#;

/// Largest accepted border or gutter, in points.
pub const MAX_SPACING: u32 = 4096;

/// Runtime configuration, resolved from the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub ignored_bundles: Vec<String>,
    pub min_sizes: HashMap<String, Size>,
    pub hotkeys: HotkeyMap,
    pub layout: LayoutConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    general: GeneralSection,
    layout: LayoutSection,
    min_sizes: HashMap<String, [u32; 2]>,
    hotkeys: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneralSection {
    ignored_bundles: Vec<String>,
    hotkey_match: MatchPolicy,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutKind {
    CenterStage,
    #[default]
    Panel,
    VerticalSplit,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LayoutSection {
    kind: LayoutKind,
    border: u32,
    gutter: u32,
    ratio: f64,
    ignore_menu: bool,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            kind: LayoutKind::Panel,
            border: 40,
            gutter: 40,
            ratio: 0.5,
            ignore_menu: true,
        }
    }
}

impl LayoutSection {
    fn resolve(self) -> Result<LayoutConfig, ConfigError> {
        if !(self.ratio > 0.0 && self.ratio < 1.0) {
            return Err(ConfigError::InvalidRatio(self.ratio));
        }
        for (field, value) in [("border", self.border), ("gutter", self.gutter)] {
            if value > MAX_SPACING {
                return Err(ConfigError::InvalidSpacing { field, value });
            }
        }
        let strategy = match self.kind {
            LayoutKind::CenterStage => Layout::CenterStage(CenterStage {
                border: self.border,
            }),
            LayoutKind::Panel => Layout::Panel(Panel {
                border: self.border,
                gutter: self.gutter,
            }),
            LayoutKind::VerticalSplit => Layout::VerticalSplit(VerticalSplit {
                border: self.border,
                gutter: self.gutter,
                ratio: self.ratio,
            }),
        };
        Ok(LayoutConfig {
            strategy,
            ignore_menu: self.ignore_menu,
        })
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;

        let mut hotkeys = HotkeyMap::new(file.general.hotkey_match);
        for (name, value) in &file.hotkeys {
            let action =
                Action::from_name(name).ok_or_else(|| ConfigError::UnknownAction(name.clone()))?;
            let Some(value) = value.as_str() else {
                return Err(ConfigError::MalformedHotkey {
                    name: name.clone(),
                    value: value.to_string(),
                });
            };
            hotkeys.bind(action, parse_hotkey(name, value)?);
        }

        let mut min_sizes = HashMap::new();
        for (name, [width, height]) in file.min_sizes {
            if width == 0 || height == 0 {
                return Err(ConfigError::InvalidMinSize(name));
            }
            min_sizes.insert(name.to_lowercase(), Size::new(width, height));
        }

        Ok(Self {
            ignored_bundles: file.general.ignored_bundles,
            min_sizes,
            hotkeys,
            layout: file.layout.resolve()?,
        })
    }

    /// Load from `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml_str(&contents)?;
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn is_ignored(&self, bundle_id: &str) -> bool {
        self.ignored_bundles.iter().any(|b| b == bundle_id)
    }

    pub fn min_size_for(&self, title: &str) -> Option<Size> {
        self.min_sizes.get(&title.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{ALT, CMD, SHIFT};

    #[test]
    fn test_empty_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.layout, LayoutConfig::default());
        assert!(config.hotkeys.is_empty());
    }

    #[test]
    fn test_template_parses() {
        let config = Config::from_toml_str(TEMPLATE).unwrap();
        assert!(config.is_ignored("com.apple.finder"));
        assert_eq!(config.hotkeys.bindings().len(), 2);
        assert_eq!(config.hotkeys.policy(), MatchPolicy::First);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            [general]
            ignored_bundles = ["com.apple.finder", "com.apple.systempreferences"]
            hotkey_match = "all"

            [layout]
            kind = "vertical_split"
            border = 10
            gutter = 5
            ratio = 0.6
            ignore_menu = false

            [min_sizes]
            Terminal = [480, 320]

            [hotkeys]
            reload = "cmd shift 15"
            reflow = "cmd alt return"
            "#,
        )
        .unwrap();

        assert_eq!(config.ignored_bundles.len(), 2);
        assert!(config.is_ignored("com.apple.systempreferences"));
        assert!(!config.is_ignored("com.apple.Safari"));
        assert_eq!(config.hotkeys.policy(), MatchPolicy::All);
        assert_eq!(
            config.layout,
            LayoutConfig {
                strategy: Layout::VerticalSplit(VerticalSplit {
                    border: 10,
                    gutter: 5,
                    ratio: 0.6,
                }),
                ignore_menu: false,
            }
        );
        assert_eq!(config.min_size_for("terminal"), Some(Size::new(480, 320)));
        assert_eq!(config.min_size_for("TERMINAL"), Some(Size::new(480, 320)));
        assert_eq!(config.min_size_for("Safari"), None);
    }

    #[test]
    fn test_hotkeys_keep_file_order() {
        let config = Config::from_toml_str(
            r#"
            [hotkeys]
            reload = "cmd shift 15"
            reflow = "cmd alt 15"
            quit = "cmd alt q"
            "#,
        )
        .unwrap();

        let bindings = config.hotkeys.bindings();
        assert_eq!(bindings[0].action, Action::Reload);
        assert_eq!(bindings[0].hotkey.mask, CMD | SHIFT);
        assert_eq!(bindings[1].action, Action::Reflow);
        assert_eq!(bindings[1].hotkey.mask, CMD | ALT);
        assert_eq!(bindings[2].action, Action::Quit);
        assert_eq!(bindings[2].hotkey.key_code, 0x0C);
    }

    #[test]
    fn test_center_stage_kind() {
        let config = Config::from_toml_str("[layout]\nkind = \"center_stage\"\nborder = 20\n")
            .unwrap();
        assert_eq!(
            config.layout.strategy,
            Layout::CenterStage(CenterStage { border: 20 })
        );
    }

    #[test]
    fn test_error_single_token_hotkey() {
        let err = Config::from_toml_str("[hotkeys]\nreflow = \"15\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedHotkey { .. }));
    }

    #[test]
    fn test_error_non_string_hotkey() {
        let err = Config::from_toml_str("[hotkeys]\nreflow = 15\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedHotkey { .. }));
    }

    #[test]
    fn test_error_unknown_action() {
        let err = Config::from_toml_str("[hotkeys]\ntoggle = \"cmd 48\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAction(ref a) if a == "toggle"));
    }

    #[test]
    fn test_error_unknown_modifier() {
        let err = Config::from_toml_str("[hotkeys]\nreflow = \"hyper 15\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModifier { .. }));
    }

    #[test]
    fn test_error_bad_ratio() {
        for ratio in ["0.0", "1.0", "1.5", "-0.2"] {
            let err = Config::from_toml_str(&format!("[layout]\nratio = {}\n", ratio)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRatio(_)), "ratio {}", ratio);
        }
    }

    #[test]
    fn test_error_oversized_spacing() {
        let contents = "[layout]\nkind = \"center_stage\"\nborder = 3000000000\n";
        let err = Config::from_toml_str(contents).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSpacing {
                field: "border",
                value: 3_000_000_000
            }
        ));

        let err = Config::from_toml_str("[layout]\ngutter = 5000\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpacing { field: "gutter", .. }));

        let config = Config::from_toml_str("[layout]\nborder = 4096\n").unwrap();
        let usable = config.layout.usable(crate::geometry::Rect::new(0, 0, 1000, 800));
        assert_eq!(usable.width, 0);
    }

    #[test]
    fn test_error_zero_min_size() {
        let err = Config::from_toml_str("[min_sizes]\nterminal = [0, 320]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMinSize(ref n) if n == "terminal"));
    }

    #[test]
    fn test_error_syntax() {
        let err = Config::from_toml_str("[layout\nkind = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_error_unknown_layout_kind() {
        let err = Config::from_toml_str("[layout]\nkind = \"spiral\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("fusuma-test-does-not-exist.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("fusuma-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[layout]\nborder = 12\n").unwrap();
        let config = Config::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(
            config.layout.strategy,
            Layout::Panel(Panel {
                border: 12,
                gutter: 40,
            })
        );
    }
}
