use crate::storage::{PreferenceStore, StorageError};

pub const KEY_THEME: &str = "stopwatch-theme";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Only an explicit "dark" selects the dark theme.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        match store.get(KEY_THEME) {
            Ok(Some(value)) if value == "dark" => Theme::Dark,
            Ok(_) => Theme::Light,
            Err(e) => {
                log::error!("Failed to load theme: {}", e);
                Theme::Light
            }
        }
    }

    pub fn save(self, store: &mut dyn PreferenceStore) -> Result<(), StorageError> {
        store.set(KEY_THEME, self.as_str())
    }
}
