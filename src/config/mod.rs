#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::KanbanError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub ui: UiConfig,
    pub board: BoardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "tasks.json".to_owned(),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub icons: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { icons: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    pub confirm_delete: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            confirm_delete: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), KanbanError> {
        if self.store.path.trim().is_empty() {
            return Err(KanbanError::Config(
                "store.path must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Resolved location of the task file.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        expand_path(&self.store.path)
    }
}

/// One settable entry of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    StorePath,
    StorePretty,
    UiIcons,
    ConfirmDelete,
}

impl Key {
    fn parse(name: &str) -> Option<Self> {
        Some(match name.trim() {
            "store.path" => Key::StorePath,
            "store.pretty" => Key::StorePretty,
            "ui.icons" => Key::UiIcons,
            "board.confirm_delete" => Key::ConfirmDelete,
            _ => return None,
        })
    }

    /// `[table]` and field name in the TOML file.
    fn location(self) -> (&'static str, &'static str) {
        match self {
            Key::StorePath => ("store", "path"),
            Key::StorePretty => ("store", "pretty"),
            Key::UiIcons => ("ui", "icons"),
            Key::ConfirmDelete => ("board", "confirm_delete"),
        }
    }

    fn read(self, cfg: &Config) -> String {
        match self {
            Key::StorePath => cfg.store.path.clone(),
            Key::StorePretty => cfg.store.pretty.to_string(),
            Key::UiIcons => cfg.ui.icons.to_string(),
            Key::ConfirmDelete => cfg.board.confirm_delete.to_string(),
        }
    }

    /// Stores `raw` into `cfg` and returns the TOML value to write back.
    fn assign(self, cfg: &mut Config, raw: &str) -> Result<toml_edit::Item, KanbanError> {
        let flag = match self {
            Key::StorePath => {
                cfg.store.path = raw.to_owned();
                return Ok(toml_edit::value(raw));
            }
            Key::StorePretty => &mut cfg.store.pretty,
            Key::UiIcons => &mut cfg.ui.icons,
            Key::ConfirmDelete => &mut cfg.board.confirm_delete,
        };
        *flag = match raw.trim() {
            "true" => true,
            "false" => false,
            other => {
                let (table, field) = self.location();
                return Err(KanbanError::InvalidConfigValue {
                    key: format!("{table}.{field}"),
                    msg: format!("expected true or false, got '{other}'"),
                });
            }
        };
        Ok(toml_edit::value(*flag))
    }
}

/// `~/.config/kanban/config.toml`.
pub fn config_file() -> anyhow::Result<PathBuf> {
    let dirs = BaseDirs::new().context("failed to determine home directory")?;
    Ok(dirs
        .home_dir()
        .join(".config")
        .join("kanban")
        .join("config.toml"))
}

pub fn load() -> anyhow::Result<Config> {
    load_at(&config_file()?)
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(&load()?)?)
}

pub fn get_value_string(key: &str) -> anyhow::Result<Option<String>> {
    get_value_string_at_path(&config_file()?, key)
}

pub fn set_value_string(key: &str, value: &str) -> anyhow::Result<()> {
    set_value_string_at_path(&config_file()?, key, value)
}

fn read_raw(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(raw))
}

fn load_at(path: &Path) -> anyhow::Result<Config> {
    let cfg = match read_raw(path)? {
        Some(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?,
        None => Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Unknown keys read as `None`.
pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    let cfg = load_at(path)?;
    Ok(Key::parse(key).map(|k| k.read(&cfg)))
}

/// Edits one key in place, keeping the rest of the file's formatting.
pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let k = Key::parse(key).ok_or_else(|| KanbanError::InvalidConfigKey(key.to_owned()))?;

    let raw = read_raw(path)?.unwrap_or_default();
    let mut doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    let mut cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;

    let item = k.assign(&mut cfg, value)?;
    cfg.validate()?;

    let (table, field) = k.location();
    doc.entry(table)
        .or_insert(toml_edit::table())
        .as_table_like_mut()
        .ok_or_else(|| KanbanError::Config(format!("cannot set {key}: '{table}' is not a table")))?
        .insert(field, item);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Expands a leading `~/` plus `$VAR` and `${VAR}`, then anchors relative
/// paths at the working directory. Unset variables stay as written.
pub fn expand_path(input: &str) -> anyhow::Result<PathBuf> {
    let home = BaseDirs::new().map(|d| d.home_dir().to_path_buf());
    let mut p = match (input.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(substitute_env(rest)),
        _ => PathBuf::from(substitute_env(input)),
    };
    if p.is_relative() {
        p = std::env::current_dir()
            .context("failed to get current directory")?
            .join(p);
    }
    Ok(p)
}

fn substitute_env(input: &str) -> String {
    let Ok(var) = regex::Regex::new(r"\$(?:\{(\w+)\}|(\w+))") else {
        return input.to_owned();
    };
    var.replace_all(input, |caps: &regex::Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_owned())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert_eq!(Config::default().store.path, "tasks.json");
    }

    #[test]
    fn blank_store_path_is_rejected() {
        let mut cfg = Config::default();
        cfg.store.path = "  ".to_owned();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str("[board]\nconfirm_delete = false\n").unwrap();
        assert!(!cfg.board.confirm_delete);
        assert!(cfg.ui.icons);
        assert_eq!(cfg.store.path, "tasks.json");
    }

    #[test]
    fn missing_file_reads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_at(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn every_key_round_trips_through_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kanban").join("config.toml");

        let cases = [
            ("store.path", "~/boards/home.json"),
            ("store.pretty", "false"),
            ("ui.icons", "false"),
            ("board.confirm_delete", "false"),
        ];
        for (key, value) in cases {
            set_value_string_at_path(&path, key, value).unwrap();
            assert_eq!(
                get_value_string_at_path(&path, key).unwrap().as_deref(),
                Some(value),
                "{key}"
            );
        }

        let cfg = load_at(&path).unwrap();
        assert_eq!(cfg.store.path, "~/boards/home.json");
        assert!(!cfg.store.pretty);
        assert!(!cfg.ui.icons);
        assert!(!cfg.board.confirm_delete);
        assert_eq!(get_value_string_at_path(&path, "store.nope").unwrap(), None);
    }

    #[test]
    fn set_keeps_comments_and_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# my board\n[store]\npath = \"work.json\"\n").unwrap();

        set_value_string_at_path(&path, "store.pretty", "false").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("# my board\n"));
        assert!(raw.contains("path = \"work.json\""));
        assert!(raw.contains("pretty = false"));
    }

    #[test]
    fn set_into_an_inline_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "board = { confirm_delete = true }\n").unwrap();

        set_value_string_at_path(&path, "board.confirm_delete", "false").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "board.confirm_delete")
                .unwrap()
                .as_deref(),
            Some("false")
        );
    }

    #[test]
    fn bad_input_never_reaches_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let err = set_value_string_at_path(&path, "ui.colour", "red").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KanbanError>(),
            Some(KanbanError::InvalidConfigKey(_))
        ));
        let err = set_value_string_at_path(&path, "board.confirm_delete", "maybe").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KanbanError>(),
            Some(KanbanError::InvalidConfigValue { .. })
        ));
        assert!(set_value_string_at_path(&path, "store.path", "").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn relative_store_path_is_anchored() {
        let p = expand_path("tasks.json").unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("tasks.json"));
    }

    #[test]
    fn unset_variables_are_left_alone() {
        let raw = "$KANBAN_SURELY_UNSET_VAR/${KANBAN_SURELY_UNSET_VAR}/tasks.json";
        assert_eq!(substitute_env(raw), raw);
    }
}
