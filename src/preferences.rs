use chrono::NaiveDate;

use crate::store::RecordStore;
use crate::utils;

/// Prefix of the per-day reflection keys (`reflection-<yyyy-MM-dd>`)
pub const REFLECTION_PREFIX: &str = "reflection-";

/// User-preference scalars kept beside the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Theme,
    IsDark,
    AccentColor,
    UseAnimations,
    BlurEffects,
    RandomThemesEnabled,
    DisplayName,
    NotificationsEnabled,
    BypassAuth,
}

impl Preference {
    pub const ALL: [Preference; 9] = [
        Preference::Theme,
        Preference::IsDark,
        Preference::AccentColor,
        Preference::UseAnimations,
        Preference::BlurEffects,
        Preference::RandomThemesEnabled,
        Preference::DisplayName,
        Preference::NotificationsEnabled,
        Preference::BypassAuth,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Preference::Theme => "theme",
            Preference::IsDark => "isDark",
            Preference::AccentColor => "accentColor",
            Preference::UseAnimations => "useAnimations",
            Preference::BlurEffects => "blurEffects",
            Preference::RandomThemesEnabled => "randomThemesEnabled",
            Preference::DisplayName => "displayName",
            Preference::NotificationsEnabled => "notificationsEnabled",
            Preference::BypassAuth => "bypassAuth",
        }
    }

    pub fn from_key(key: &str) -> Option<Preference> {
        Preference::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Whether the value is a `"true"`/`"false"` flag
    pub fn is_flag(self) -> bool {
        !matches!(
            self,
            Preference::Theme | Preference::AccentColor | Preference::DisplayName
        )
    }
}

/// Typed reads and writes of preference and reflection scalars.
///
/// Passed explicitly to whoever needs theme or notification settings.
#[derive(Clone)]
pub struct Preferences {
    store: RecordStore,
}

impl Preferences {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn get(&self, pref: Preference) -> Option<String> {
        self.store.load_raw(pref.key())
    }

    pub fn set(&self, pref: Preference, value: &str) {
        self.store.save_raw(pref.key(), value);
    }

    pub fn unset(&self, pref: Preference) {
        self.store.remove_raw(pref.key());
    }

    /// Flag value, falling back to `default` when unset or unparsable
    pub fn flag(&self, pref: Preference, default: bool) -> bool {
        match self.get(pref).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => default,
        }
    }

    pub fn set_flag(&self, pref: Preference, value: bool) {
        self.set(pref, if value { "true" } else { "false" });
    }

    pub fn theme(&self) -> String {
        self.get(Preference::Theme).unwrap_or_else(|| "default".to_string())
    }

    pub fn is_dark(&self) -> bool {
        self.flag(Preference::IsDark, false)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.flag(Preference::NotificationsEnabled, true)
    }

    pub fn bypass_auth(&self) -> bool {
        self.flag(Preference::BypassAuth, false)
    }

    pub fn display_name(&self) -> Option<String> {
        self.get(Preference::DisplayName)
    }

    pub fn reflection(&self, date: NaiveDate) -> Option<String> {
        self.store.load_raw(&reflection_key(date))
    }

    pub fn set_reflection(&self, date: NaiveDate, text: &str) {
        self.store.save_raw(&reflection_key(date), text);
    }
}

pub fn reflection_key(date: NaiveDate) -> String {
    format!("{}{}", REFLECTION_PREFIX, utils::format_date(date))
}
