use std::ops::BitOr;
use std::sync::Arc;

use super::Notification;

/// Presentation options for a notification action. Combine with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOptions(u8);

impl ActionOptions {
    pub const NONE: ActionOptions = ActionOptions(0);
    pub const AUTHENTICATION_REQUIRED: ActionOptions = ActionOptions(1);
    pub const DESTRUCTIVE: ActionOptions = ActionOptions(1 << 1);
    pub const FOREGROUND: ActionOptions = ActionOptions(1 << 2);

    pub fn contains(self, other: ActionOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {self.0}
}

impl BitOr for ActionOptions {
    type Output = ActionOptions;
    fn bitor(self, rhs: ActionOptions) -> ActionOptions {ActionOptions(self.0 | rhs.0)}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Button,
    Input {submit_label: String, placeholder: String},
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationAction {
    pub identifier: String,
    pub title: String,
    pub options: ActionOptions,
    pub kind: ActionKind,
}

impl NotificationAction {
    pub fn button(identifier: &str, title: &str, options: ActionOptions) -> Self {
        NotificationAction{identifier: identifier.to_string(), title: title.to_string(), options, kind: ActionKind::Button}
    }

    pub fn input(identifier: &str, title: &str, options: ActionOptions, submit_label: &str, placeholder: &str) -> Self {
        NotificationAction{
            identifier: identifier.to_string(),
            title: title.to_string(),
            options,
            kind: ActionKind::Input{submit_label: submit_label.to_string(), placeholder: placeholder.to_string()},
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationCategory {
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractiveSettings {
    pub actions: Vec<NotificationAction>,
    pub categories: Vec<NotificationCategory>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IosPushSettings {
    pub badge: bool,
    pub sound: bool,
    pub alert: bool,
    pub interactive_settings: Option<InteractiveSettings>,
}

/// The user picked an action on an interactive notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTaken {
    pub action_identifier: String,
    pub message: Notification,
    pub input_text: Option<String>,
}

pub type ActionCallback = Arc<dyn Fn(ActionTaken) + Send + Sync>;

#[derive(Clone, Default)]
pub struct PushNotificationModel {
    pub ios_settings: IosPushSettings,
    pub on_notification_action_taken: Option<ActionCallback>,
}
