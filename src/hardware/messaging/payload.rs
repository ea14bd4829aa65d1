use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

/// Extras key present on every intent the push service builds. Intents without it are ignored.
pub const FROM_KEY: &str = "from";
/// Bookkeeping keys the push service adds that never reach the consumer.
pub const BOOKKEEPING_KEYS: [&str; 2] = [FROM_KEY, "collapse_key"];
/// Keys owned by [`Notification`] itself. Never stored in its flat fields.
pub const RESERVED_KEYS: [&str; 2] = ["foreground", "data"];
/// Action of an ordinary launcher or deep-link start.
pub const VIEW_ACTION: &str = "android.intent.action.VIEW";

/// A primitive payload value. Native extras and message fields are narrowed to this set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Value::Bool(b)),
            serde_json::Value::Number(n) => Some(Value::Number(n)),
            serde_json::Value::String(s) => Some(Value::Text(s)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {Value::Text(s.to_string())}
}
impl From<String> for Value {
    fn from(s: String) -> Self {Value::Text(s)}
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {Value::Bool(b)}
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {Value::Number(n.into())}
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

pub type Payload = BTreeMap<String, Value>;

/// A received push message, or the notification the app was cold-started from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Notification {
    pub foreground: bool,
    #[serde(flatten)]
    pub fields: Payload,
    pub data: Payload,
}

impl Notification {
    /// Builds the notification for a tapped launch intent: every extra except the
    /// bookkeeping keys, copied under `data` and, reserved keys aside, flat.
    pub fn from_extras(extras: &Payload) -> Self {
        let data: Payload = extras.iter()
            .filter(|(key, _)| !BOOKKEEPING_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let fields = data.iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Notification{foreground: false, fields, data}
    }

    /// Parses the JSON the native listener hands over. Nested values other than
    /// the `data` object are dropped.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut notification = Notification::default();
        for (key, value) in object {
            match (key.as_str(), value) {
                ("foreground", serde_json::Value::Bool(b)) => notification.foreground = b,
                ("data", serde_json::Value::Object(data)) => {
                    notification.data = data.into_iter()
                        .filter_map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                        .collect();
                }
                (reserved, _) if RESERVED_KEYS.contains(&reserved) => log::debug!("Dropping malformed message field {reserved}"),
                (_, value) => match Value::from_json(value) {
                    Some(value) => {notification.fields.insert(key, value);},
                    None => log::debug!("Dropping nested message field {key}"),
                }
            }
        }
        Ok(notification)
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// What the platform reported about how the process was started.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchIntent {
    pub action: Option<String>,
    pub extras: Option<Payload>,
}

impl LaunchIntent {
    pub fn new(action: Option<&str>, extras: Option<Payload>) -> Self {
        LaunchIntent{action: action.map(str::to_string), extras}
    }

    pub fn is_view_action(&self) -> bool {
        self.action.as_deref() == Some(VIEW_ACTION)
    }

    /// The notification this intent carries, if it was produced by tapping one.
    pub fn notification(&self) -> Option<Notification> {
        if self.is_view_action() {return None;}
        self.extras.as_ref()
            .filter(|extras| extras.contains_key(FROM_KEY))
            .map(Notification::from_extras)
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
