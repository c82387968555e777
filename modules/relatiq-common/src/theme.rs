//! Persisted theme preference.
//!
//! The theme is the only state that survives between sessions. `ThemeSlot`
//! owns it: `init` reads the persisted value (or falls back to light) and
//! `set` is the one place it changes, writing through to disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RelatiqError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Preferences {
    theme: Theme,
}

#[derive(Debug)]
pub struct ThemeSlot {
    current: Theme,
    path: PathBuf,
}

impl ThemeSlot {
    /// Read the persisted preference. A missing file means first run; an
    /// unreadable one is logged and treated the same way.
    pub fn init(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Preferences>(&raw) {
                Ok(prefs) => prefs.theme,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable theme preference");
                    Theme::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Theme::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read theme preference");
                Theme::default()
            }
        };
        debug!(?current, "Theme initialised");
        Self { current, path }
    }

    pub fn get(&self) -> Theme {
        self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Change the theme. The in-memory value is updated even if persisting it
    /// fails; the error tells the caller the choice will not survive a restart.
    pub fn set(&mut self, theme: Theme) -> Result<(), RelatiqError> {
        self.current = theme;
        persist(&self.path, theme)
    }
}

fn persist(path: &Path, theme: Theme) -> Result<(), RelatiqError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| RelatiqError::Preferences(format!("{}: {e}", parent.display())))?;
    }
    let body = serde_json::to_string(&Preferences { theme })
        .map_err(|e| RelatiqError::Preferences(e.to_string()))?;
    fs::write(path, body).map_err(|e| RelatiqError::Preferences(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ThemeSlot::init(dir.path().join("prefs.json"));
        assert_eq!(slot.get(), Theme::Light);
    }

    #[test]
    fn set_persists_across_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut slot = ThemeSlot::init(&path);
        slot.set(Theme::Dark).unwrap();
        assert_eq!(slot.get(), Theme::Dark);

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"theme":"dark"}"#);
        assert_eq!(ThemeSlot::init(&path).get(), Theme::Dark);
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ThemeSlot::init(&path).get(), Theme::Light);
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
