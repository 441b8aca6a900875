//! User interface preferences: theme and sidebar collapse state.
//!
//! Preferences are loaded once with [`PreferencesHandle::load`], falling back
//! to defaults key by key, and every setter writes its key back immediately.

pub mod sqlite;
pub mod storage;

pub use sqlite::SqlitePreferenceStorage;
pub use storage::{MemoryStorage, PreferenceError, PreferenceResult, PreferenceStorage};

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Storage keys.
pub mod keys {
    /// Colour theme, stored as a plain string.
    pub const THEME: &str = "theme";
    /// Per-section collapse flags, stored as a JSON object.
    pub const SECTIONS: &str = "sidebar-collapsed";
    /// Whole sidebar collapse flag, stored as a JSON boolean.
    pub const SIDEBAR: &str = "sidebar-collapsed-state";
}

/// Colour theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Sidebar sections that can be collapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    /// Pinned conversations.
    Pinned,
    /// Recent conversations.
    Recent,
    /// Folders.
    Folders,
    /// Templates.
    Templates,
}

/// Collapse flag per sidebar section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCollapse {
    /// Pinned section collapsed.
    pub pinned: bool,
    /// Recent section collapsed.
    pub recent: bool,
    /// Folders section collapsed.
    pub folders: bool,
    /// Templates section collapsed.
    pub templates: bool,
}

impl Default for SectionCollapse {
    fn default() -> Self {
        Self {
            pinned: true,
            recent: false,
            folders: true,
            templates: true,
        }
    }
}

impl SectionCollapse {
    fn flag_mut(&mut self, section: Section) -> &mut bool {
        match section {
            Section::Pinned => &mut self.pinned,
            Section::Recent => &mut self.recent,
            Section::Folders => &mut self.folders,
            Section::Templates => &mut self.templates,
        }
    }

    /// Whether `section` is collapsed.
    #[must_use]
    pub const fn is_collapsed(&self, section: Section) -> bool {
        match section {
            Section::Pinned => self.pinned,
            Section::Recent => self.recent,
            Section::Folders => self.folders,
            Section::Templates => self.templates,
        }
    }
}

/// Every user preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Colour theme.
    pub theme: Theme,
    /// Per-section collapse flags.
    pub sections: SectionCollapse,
    /// Whether the whole sidebar is collapsed.
    pub sidebar_collapsed: bool,
}

/// Live preferences bound to a storage backend.
pub struct PreferencesHandle {
    storage: Arc<dyn PreferenceStorage>,
    current: RwLock<Preferences>,
}

/// Read one key, returning `None` (and logging) when it is missing or unreadable.
async fn read_key<T>(
    storage: &dyn PreferenceStorage,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    match storage.get(key).await {
        Ok(Some(raw)) => match parse(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Ignoring unreadable preference: {e}");
                None
            }
        },
        Ok(None) => {
            debug!(key, "Preference not set, using default");
            None
        }
        Err(e) => {
            warn!(key, "Failed to read preference: {e}");
            None
        }
    }
}

fn from_json<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

impl PreferencesHandle {
    /// Load preferences, defaulting each key that is missing or unreadable.
    pub async fn load(storage: Arc<dyn PreferenceStorage>) -> Self {
        let defaults = Preferences::default();
        let storage_ref = storage.as_ref();
        let theme = read_key(storage_ref, keys::THEME, Theme::from_str).await;
        let sections = read_key(storage_ref, keys::SECTIONS, from_json::<SectionCollapse>).await;
        let sidebar_collapsed = read_key(storage_ref, keys::SIDEBAR, from_json::<bool>).await;

        let preferences = Preferences {
            theme: theme.unwrap_or(defaults.theme),
            sections: sections.unwrap_or(defaults.sections),
            sidebar_collapsed: sidebar_collapsed.unwrap_or(defaults.sidebar_collapsed),
        };
        Self {
            storage,
            current: RwLock::new(preferences),
        }
    }

    /// Bind `storage` with default preferences, without reading it.
    #[must_use]
    pub fn with_defaults(storage: Arc<dyn PreferenceStorage>) -> Self {
        Self {
            storage,
            current: RwLock::new(Preferences::default()),
        }
    }

    /// Current preferences.
    pub async fn snapshot(&self) -> Preferences {
        *self.current.read().await
    }

    /// Set and persist the theme.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    pub async fn set_theme(&self, theme: Theme) -> PreferenceResult<()> {
        let mut current = self.current.write().await;
        self.storage.set(keys::THEME, theme.as_str()).await?;
        current.theme = theme;
        Ok(())
    }

    /// Switch between light and dark. Returns the new theme.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    pub async fn toggle_theme(&self) -> PreferenceResult<Theme> {
        let mut current = self.current.write().await;
        let theme = current.theme.toggled();
        self.storage.set(keys::THEME, theme.as_str()).await?;
        current.theme = theme;
        Ok(theme)
    }

    /// Set and persist one section's collapse flag.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    pub async fn set_section_collapsed(
        &self,
        section: Section,
        collapsed: bool,
    ) -> PreferenceResult<()> {
        let mut current = self.current.write().await;
        let mut sections = current.sections;
        *sections.flag_mut(section) = collapsed;
        let raw = serde_json::to_string(&sections)?;
        self.storage.set(keys::SECTIONS, &raw).await?;
        current.sections = sections;
        Ok(())
    }

    /// Flip one section's collapse flag. Returns the new value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    pub async fn toggle_section(&self, section: Section) -> PreferenceResult<bool> {
        let mut current = self.current.write().await;
        let mut sections = current.sections;
        let collapsed = !sections.is_collapsed(section);
        *sections.flag_mut(section) = collapsed;
        let raw = serde_json::to_string(&sections)?;
        self.storage.set(keys::SECTIONS, &raw).await?;
        current.sections = sections;
        Ok(collapsed)
    }

    /// Persist every key, then replace the current preferences.
    ///
    /// On error the current preferences are left as they were, though keys
    /// written before the failing one stay written.
    ///
    /// # Errors
    /// Returns an error if a value cannot be written.
    pub async fn replace(&self, preferences: Preferences) -> PreferenceResult<()> {
        let mut current = self.current.write().await;
        let sections = serde_json::to_string(&preferences.sections)?;
        let sidebar = serde_json::to_string(&preferences.sidebar_collapsed)?;
        self.storage.set(keys::THEME, preferences.theme.as_str()).await?;
        self.storage.set(keys::SECTIONS, &sections).await?;
        self.storage.set(keys::SIDEBAR, &sidebar).await?;
        *current = preferences;
        Ok(())
    }

    /// Set and persist the whole-sidebar collapse flag.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    pub async fn set_sidebar_collapsed(&self, collapsed: bool) -> PreferenceResult<()> {
        let mut current = self.current.write().await;
        let raw = serde_json::to_string(&collapsed)?;
        self.storage.set(keys::SIDEBAR, &raw).await?;
        current.sidebar_collapsed = collapsed;
        Ok(())
    }
}
