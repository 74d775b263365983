//! Layered client settings.
//!
//! Values are resolved, from lowest to highest priority, from built-in
//! defaults, the `[sentry]` section of an INI file, `SENTRY_<NAME>`
//! environment variables and `-SENTRY_<NAME>=` (or `-SENTRY-<NAME>=`)
//! command-line flags. Keys are matched case-insensitively.

use std::{fs, path::Path};

use ini::Ini;
use log::info;

use crate::error::SettingsError;

/// INI section holding the client settings.
pub const SETTINGS_SECTION: &str = "sentry";

const DSN: &str = "DSN";
const ENABLED: &str = "ENABLED";
const ENVIRONMENT: &str = "ENVIRONMENT";
const RELEASE: &str = "RELEASE";
const CONSENT_REQUIRED: &str = "CONSENT_REQUIRED";

/// Settings consumed when the client starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    pub dsn: Option<String>,
    pub enabled: bool,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub consent_required: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            dsn: None,
            enabled: true,
            environment: None,
            release: None,
            consent_required: false,
        }
    }
}

impl ClientSettings {
    /// Resolve settings from every layer.
    ///
    /// A missing `ini_path` file is skipped; an unreadable or malformed one
    /// is an error.
    pub fn resolve(ini_path: Option<&Path>, args: &[String]) -> Result<Self, SettingsError> {
        let mut settings = match ini_path {
            Some(path) if path.exists() => Self::from_ini_file(path)?,
            _ => Self::default(),
        };
        settings.apply_overrides(env_lookup);
        settings.apply_overrides(|name| flag_value(args, name));
        Ok(settings)
    }

    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ini_str(&text)
    }

    pub fn from_ini_str(text: &str) -> Result<Self, SettingsError> {
        let ini = Ini::load_from_str(text)?;
        let mut settings = Self::default();
        let Some(section) = ini
            .iter()
            .find(|(name, _)| name.is_some_and(|n| n.eq_ignore_ascii_case(SETTINGS_SECTION)))
            .map(|(_, props)| props)
        else {
            return Ok(settings);
        };
        settings.apply_overrides(|name| {
            let wanted = name.replace('_', "");
            section
                .iter()
                .find(|(key, _)| key.replace('_', "").eq_ignore_ascii_case(&wanted))
                .map(|(_, value)| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        });
        Ok(settings)
    }

    /// Overwrite every setting for which `lookup` yields a value.
    ///
    /// `lookup` receives upper-case names such as `DSN` or `CONSENT_REQUIRED`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dsn) = lookup(DSN) {
            self.dsn = Some(dsn);
        }
        if let Some(enabled) = lookup(ENABLED) {
            self.enabled = parse_enabled(&enabled);
        }
        if let Some(environment) = lookup(ENVIRONMENT) {
            self.environment = Some(environment);
        }
        if let Some(release) = lookup(RELEASE) {
            self.release = Some(release);
        }
        if let Some(consent) = lookup(CONSENT_REQUIRED) {
            self.consent_required = parse_consent(&consent);
        }
    }

    /// The DSN to start with, or `None` when there is none or the client is
    /// disabled.
    pub fn active_dsn(&self) -> Option<&str> {
        let Some(dsn) = self.dsn.as_deref().filter(|dsn| !dsn.trim().is_empty()) else {
            info!("ClientSettings: no DSN configured (ini DSN, SENTRY_DSN), not starting");
            return None;
        };
        if !self.enabled {
            info!("ClientSettings: disabled by ini Enabled or SENTRY_ENABLED, not starting");
            return None;
        }
        Some(dsn)
    }
}

/// `"0"`, `"false"` and `"no"` disable; any other value enables.
pub fn parse_enabled(value: &str) -> bool {
    let value = value.trim();
    !(value == "0" || value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no"))
}

/// `"1"`, `"yes"`, `"true"` and `"on"` enable; any other value disables.
pub fn parse_consent(value: &str) -> bool {
    let value = value.trim();
    ["1", "yes", "true", "on"]
        .iter()
        .any(|truthy| value.eq_ignore_ascii_case(truthy))
}

/// Read `SENTRY_<name>` from the environment, ignoring empty values.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(format!("SENTRY_{name}"))
        .ok()
        .filter(|value| !value.is_empty())
}

/// Find `-SENTRY_<name>=value` or `-SENTRY-<name>=value` in `args`.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefixes = [format!("-SENTRY_{name}="), format!("-SENTRY-{name}=")];
    args.iter().find_map(|arg| {
        prefixes.iter().find_map(|prefix| {
            let head = arg.get(..prefix.len())?;
            if !head.eq_ignore_ascii_case(prefix) {
                return None;
            }
            let value = &arg[prefix.len()..];
            (!value.is_empty()).then(|| value.to_owned())
        })
    })
}
