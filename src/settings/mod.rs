//! User settings: API keys, selected provider and model.
//!
//! Settings are one JSON record stored under [`STORAGE_KEY`]. A missing or
//! unreadable record never fails startup; the defaults are used instead.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SettingsStorage, CONFIG_DIR_ENV};

use crate::error::{RestyleError, Result};
use crate::transform::ProviderKind;
use serde::{Deserialize, Serialize};

/// Key the settings record is stored under.
pub const STORAGE_KEY: &str = "localailab-settings";

/// Persisted user settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// OpenAI API key, empty when unset.
    pub openai_api_key: String,
    /// Gemini API key, empty when unset.
    pub gemini_api_key: String,
    /// Provider used for transformations.
    pub selected_provider: ProviderKind,
    /// Model identifier for the selected provider.
    pub selected_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            gemini_api_key: String::new(),
            selected_provider: ProviderKind::OpenAi,
            selected_model: "gpt-image-1".to_string(),
        }
    }
}

impl Settings {
    /// Returns the API key stored for `kind`.
    pub fn api_key_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::OpenAi => &self.openai_api_key,
            ProviderKind::Gemini => &self.gemini_api_key,
        }
    }

    /// Returns true if the selected provider has a non-empty API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key_for(self.selected_provider).is_empty()
    }

    /// Parses a saved record over the defaults, one field at a time.
    ///
    /// A field that is missing, `null` or of the wrong type keeps its default
    /// without discarding the others.
    pub fn from_record(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let record = value
            .as_object()
            .ok_or_else(|| RestyleError::Storage("saved settings are not a JSON object".into()))?;
        let text = |field: &str| match record.get(field) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(field, kind = json_kind(other), "ignoring invalid saved setting");
                None
            }
        };

        let mut settings = Self::default();
        if let Some(key) = text("openaiApiKey") {
            settings.openai_api_key = key;
        }
        if let Some(key) = text("geminiApiKey") {
            settings.gemini_api_key = key;
        }
        if let Some(provider) = text("selectedProvider") {
            settings.selected_provider = ProviderKind::from_name(&provider);
        }
        if let Some(model) = text("selectedModel") {
            settings.selected_model = model;
        }
        Ok(settings)
    }

    /// Merges the fields set in `patch` into these settings.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(key) = patch.openai_api_key {
            self.openai_api_key = key;
        }
        if let Some(key) = patch.gemini_api_key {
            self.gemini_api_key = key;
        }
        if let Some(provider) = patch.selected_provider {
            self.selected_provider = provider;
        }
        if let Some(model) = patch.selected_model {
            self.selected_model = model;
        }
    }

    /// Returns a copy with the API keys masked for display.
    pub fn redacted(&self) -> Self {
        Self {
            openai_api_key: redact_key(&self.openai_api_key),
            gemini_api_key: redact_key(&self.gemini_api_key),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &redact_key(&self.openai_api_key))
            .field("gemini_api_key", &redact_key(&self.gemini_api_key))
            .field("selected_provider", &self.selected_provider)
            .field("selected_model", &self.selected_model)
            .finish()
    }
}

fn redact_key(key: &str) -> String {
    let len = key.chars().count();
    match len {
        0 => String::new(),
        1..=4 => "***".to_string(),
        _ => {
            let suffix: String = key.chars().skip(len - 4).collect();
            format!("***{suffix}")
        }
    }
}

/// A partial update to [`Settings`]. Unset fields are left unchanged.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New OpenAI API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// New Gemini API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    /// New provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_provider: Option<ProviderKind>,
    /// New model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
}

impl SettingsPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OpenAI API key.
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the Gemini API key.
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Sets the API key of `kind`.
    pub fn api_key(self, kind: ProviderKind, key: impl Into<String>) -> Self {
        match kind {
            ProviderKind::OpenAi => self.openai_api_key(key),
            ProviderKind::Gemini => self.gemini_api_key(key),
        }
    }

    /// Sets the provider without touching the model.
    pub fn selected_provider(mut self, provider: ProviderKind) -> Self {
        self.selected_provider = Some(provider);
        self
    }

    /// Sets the model.
    pub fn selected_model(mut self, model: impl Into<String>) -> Self {
        self.selected_model = Some(model.into());
        self
    }

    /// Switches to `provider` and selects its default model.
    pub fn switch_provider(self, provider: ProviderKind) -> Self {
        self.selected_provider(provider)
            .selected_model(provider.default_model())
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl std::fmt::Debug for SettingsPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsPatch")
            .field("openai_api_key", &self.openai_api_key.as_deref().map(redact_key))
            .field("gemini_api_key", &self.gemini_api_key.as_deref().map(redact_key))
            .field("selected_provider", &self.selected_provider)
            .field("selected_model", &self.selected_model)
            .finish()
    }
}

/// Holds the current settings and writes every update through to storage.
#[derive(Debug)]
pub struct SettingsStore<S: SettingsStorage> {
    storage: S,
    settings: Settings,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Loads settings from `storage`, falling back to defaults when the
    /// record is absent or cannot be read or parsed.
    pub fn open(storage: S) -> Self {
        let settings = match storage.load(STORAGE_KEY) {
            Ok(Some(raw)) => match Settings::from_record(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse saved settings, using defaults");
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load saved settings, using defaults");
                Settings::default()
            }
        };

        Self { storage, settings }
    }

    /// Returns the current settings.
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Merges `patch` into the current settings and persists the result.
    ///
    /// The merged settings are visible through [`SettingsStore::get`] even
    /// when persisting fails.
    pub fn update(&mut self, patch: SettingsPatch) -> Result<()> {
        tracing::debug!(patch = ?patch, "updating settings");
        self.settings.apply(patch);
        let raw = serde_json::to_string(&self.settings)?;
        self.storage.save(STORAGE_KEY, &raw)
    }

    /// Returns true if the selected provider has a non-empty API key.
    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the store, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
