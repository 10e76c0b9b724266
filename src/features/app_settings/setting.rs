use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::category::Category;

/// A setting value of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    Integer(i32),
    Boolean(bool),
    String(String),
}

impl SettingValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => i32::KIND,
            Self::Boolean(_) => bool::KIND,
            Self::String(_) => String::KIND,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => f.write_str(&value.export()),
            Self::Boolean(value) => f.write_str(&value.export()),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// What happened to an assignment.
///
/// - `Rejected`: validation failed; the value is unchanged and the error flag is set
/// - `Unchanged`: the value was valid but equal to the current one
/// - `Changed`: the value was stored and change handlers ran once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Rejected,
    Unchanged,
    Changed,
}

// ============================================================
// Value kinds
// ============================================================

/// A type a [`Setting`] can hold, with its locale-invariant text encoding.
pub trait SettingKind: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;

    fn export(&self) -> String;

    /// Parses exported text. `None` for malformed input.
    fn import(text: &str) -> Option<Self>;

    fn into_value(self) -> SettingValue;

    fn from_value(value: SettingValue) -> Option<Self>;
}

impl SettingKind for i32 {
    const KIND: &'static str = "integer";

    fn export(&self) -> String {
        self.to_string()
    }

    fn import(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn into_value(self) -> SettingValue {
        SettingValue::Integer(self)
    }

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::Integer(value) => Some(value),
            _ => None,
        }
    }
}

impl SettingKind for bool {
    const KIND: &'static str = "boolean";

    fn export(&self) -> String {
        let text = if *self { "True" } else { "False" };
        text.to_string()
    }

    fn import(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    fn into_value(self) -> SettingValue {
        SettingValue::Boolean(self)
    }

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::Boolean(value) => Some(value),
            _ => None,
        }
    }
}

impl SettingKind for String {
    const KIND: &'static str = "string";

    fn export(&self) -> String {
        self.clone()
    }

    fn import(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn into_value(self) -> SettingValue {
        SettingValue::String(self)
    }

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::String(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================
// Setting
// ============================================================

pub type Validator<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

type ChangeHandler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SettingState<T> {
    value: T,
    error: bool,
}

/// A typed, validated setting attached to a [`Category`].
pub struct Setting<T: SettingKind> {
    key: String,
    parent: Weak<Category>,
    default: T,
    state: Mutex<SettingState<T>>,
    validate: Option<Validator<T>>,
    handlers: Mutex<Vec<ChangeHandler<T>>>,
}

pub type IntegerSetting = Setting<i32>;
pub type BooleanSetting = Setting<bool>;
pub type StringSetting = Setting<String>;

impl<T: SettingKind> Setting<T> {
    pub(crate) fn new(
        key: &str,
        parent: &Arc<Category>,
        default: T,
        validate: Option<Validator<T>>,
    ) -> Self {
        Self {
            key: key.to_string(),
            parent: Arc::downgrade(parent),
            state: Mutex::new(SettingState {
                value: default.clone(),
                error: false,
            }),
            default,
            validate,
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owning category, while the settings tree is alive.
    pub fn parent(&self) -> Option<Arc<Category>> {
        self.parent.upgrade()
    }

    pub fn value(&self) -> T {
        self.state.lock().value.clone()
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Whether the last assignment failed validation.
    pub fn has_error(&self) -> bool {
        self.state.lock().error
    }

    pub fn set(&self, value: T) -> SetOutcome {
        let valid = self.validate.as_ref().map_or(true, |validate| validate(&value));

        let mut state = self.state.lock();
        state.error = !valid;
        if !valid {
            return SetOutcome::Rejected;
        }
        if state.value == value {
            return SetOutcome::Unchanged;
        }
        state.value = value.clone();
        drop(state);

        let handlers: Vec<ChangeHandler<T>> = self.handlers.lock().clone();
        for handler in handlers {
            handler(&value);
        }
        SetOutcome::Changed
    }

    /// Runs `handler` with the new value after every change.
    pub fn on_changed<F>(&self, handler: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.handlers.lock().push(Arc::new(handler));
    }

    pub fn export(&self) -> String {
        self.state.lock().value.export()
    }

    /// Assigns the parsed `text`, or the default value when it does not parse.
    pub fn import(&self, text: &str) -> SetOutcome {
        match T::import(text) {
            Some(value) => self.set(value),
            None => {
                tracing::warn!(
                    "Could not import setting '{}' value because of invalid input '{}'",
                    self.key,
                    text
                );
                self.set(self.default.clone())
            }
        }
    }
}

impl<T: SettingKind> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Setting")
            .field("key", &self.key)
            .field("value", &state.value)
            .field("default", &self.default)
            .field("error", &state.error)
            .finish()
    }
}

/// Kind-independent view of a setting, as stored in categories.
pub trait ErasedSetting: Send + Sync {
    fn key(&self) -> &str;

    fn kind(&self) -> &'static str;

    fn value(&self) -> SettingValue;

    fn default_value(&self) -> SettingValue;

    /// Values of another kind are rejected.
    fn set_value(&self, value: SettingValue) -> SetOutcome;

    fn reset(&self) -> SetOutcome;

    fn has_error(&self) -> bool;

    fn export(&self) -> String;

    fn import(&self, text: &str) -> SetOutcome;

    fn as_any(&self) -> &dyn Any;
}

impl<T: SettingKind> ErasedSetting for Setting<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn value(&self) -> SettingValue {
        Setting::value(self).into_value()
    }

    fn default_value(&self) -> SettingValue {
        self.default.clone().into_value()
    }

    fn set_value(&self, value: SettingValue) -> SetOutcome {
        match T::from_value(value) {
            Some(value) => self.set(value),
            None => {
                tracing::warn!("Setting '{}' only accepts {} values", self.key, T::KIND);
                self.state.lock().error = true;
                SetOutcome::Rejected
            }
        }
    }

    fn reset(&self) -> SetOutcome {
        self.set(self.default.clone())
    }

    fn has_error(&self) -> bool {
        Setting::has_error(self)
    }

    fn export(&self) -> String {
        Setting::export(self)
    }

    fn import(&self, text: &str) -> SetOutcome {
        Setting::import(self, text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
