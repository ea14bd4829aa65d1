//! Push demo view-model: binds user actions to [`Messaging`] and reports outcomes through [`Dialogs`].

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;

use crate::config::ViewModelConfig;
use crate::dialogs::{AlertOptions, ConfirmOptions, Dialogs};
use crate::hardware::{Messaging, Settings, SettingsError};
use crate::hardware::messaging::{
    ActionOptions, ActionTaken, InteractiveSettings, IosPushSettings, NotificationAction,
    NotificationCategory, PushNotificationModel,
};

/// Persisted consent flag. Unregistering does not clear it, so a consented user
/// is registered again on every start.
pub const APP_REGISTERED_FOR_NOTIFICATIONS: &str = "APP_REGISTERED_FOR_NOTIFICATIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    NotRegistered,
    Registered,
}

pub struct PushViewModel<D: Dialogs> {
    messaging: Messaging,
    settings: Settings,
    dialogs: D,
    config: ViewModelConfig,
    runtime: Handle,
    state: Arc<Mutex<RegistrationState>>,
}

impl<D: Dialogs> PushViewModel<D> {
    /// Must be called from within the runtime. Registers the push handlers right
    /// away when the user consented in an earlier session.
    pub async fn new(messaging: Messaging, settings: Settings, dialogs: D, config: ViewModelConfig) -> Result<Self, SettingsError> {
        let registered = settings.get_bool(APP_REGISTERED_FOR_NOTIFICATIONS, false).await?;
        let view_model = PushViewModel{
            messaging,
            settings,
            dialogs,
            config,
            runtime: Handle::current(),
            state: Arc::new(Mutex::new(RegistrationState::NotRegistered)),
        };
        if registered {
            view_model.do_register_push_handlers().await;
        }
        Ok(view_model)
    }

    pub fn state(&self) -> RegistrationState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: RegistrationState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    pub async fn do_request_consent(&self) -> Result<(), SettingsError> {
        let push_allowed = self.dialogs.confirm(ConfirmOptions{
            title: "We'd like to send notifications".to_string(),
            message: "Do you agree? Please do, we won't spam you. Promised.".to_string(),
            ok_button_text: "Yep!".to_string(),
            cancel_button_text: "Nooo".to_string(),
        }).await;
        if push_allowed {
            self.settings.set_bool(APP_REGISTERED_FOR_NOTIFICATIONS, true).await?;
            self.do_register_push_handlers().await;
        }
        Ok(())
    }

    pub async fn do_get_current_push_token(&self) {
        match self.messaging.current_push_token().await {
            Ok(token) => {
                let message = match token.filter(|t| !t.is_empty()) {
                    Some(token) => {
                        log::info!("Current push token: {token}");
                        format!("{token}\n\nSee the console log if you want to copy-paste it.")
                    }
                    None => "Not received yet (note that on iOS this does not work on a simulator)".to_string(),
                };
                self.dialogs.alert(AlertOptions::new("Current Push Token", message, "OK, thx")).await;
            }
            Err(e) => log::error!("Error in do_get_current_push_token: {e}"),
        }
    }

    pub async fn do_register_for_interactive_push(&self) {
        if !cfg!(target_os = "ios") {
            log::warn!("##### Interactive push messaging is currently iOS-only!");
            log::warn!("##### Also, please make sure you don't include the 'click_action' notification property when pushing to Android.");
        }

        let dialogs = self.dialogs.clone();
        let runtime = self.runtime.clone();
        let model = PushNotificationModel{
            ios_settings: IosPushSettings{
                badge: false,
                sound: false,
                alert: true,
                interactive_settings: Some(demo_interactive_settings()),
            },
            on_notification_action_taken: Some(Arc::new(move |action: ActionTaken| {
                let message = action.message.to_json();
                log::info!("Notification action taken! Message: {message}, action taken: {}", action.action_identifier);
                let mut text = format!("Message: {message}, \n\r Action taken: {}", action.action_identifier);
                if let Some(input) = action.input_text.filter(|t| !t.is_empty()) {
                    text.push_str(&format!(", \n\r Input text: {input}"));
                }
                let dialogs = dialogs.clone();
                runtime.spawn(async move {
                    dialogs.alert(AlertOptions::new("Interactive push action", text, "Nice!")).await;
                });
            })),
        };

        if let Err(e) = self.messaging.register_for_interactive_push(model).await {
            log::error!("Failed to register for interactive push: {e}");
        }
        log::info!("Registered for interactive push");
        self.dialogs.alert(AlertOptions::titled("Registered for interactive push", "Thx!")).await;
    }

    /// Registering the handlers implicitly registers for push notifications.
    pub async fn do_register_push_handlers(&self) {
        if let Err(e) = self.messaging.register_push_token_received_callback(|token| {
            log::info!("Received a push token: {token}");
        }).await {
            log::error!("Failed to add push token callback: {e}");
        }

        let dialogs = self.dialogs.clone();
        let runtime = self.runtime.clone();
        let delay = self.config.message_alert_delay();
        let result = self.messaging.register_message_received_callback(move |message| {
            log::info!("Push message received in push view-model: {}", message.to_json());
            let title = message.title().unwrap_or_default().to_string();
            let dialogs = dialogs.clone();
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                dialogs.alert(AlertOptions::new("Push message!", title, "Sw33t")).await;
            });
        }).await;

        match result {
            Ok(()) => {
                log::info!("Added message received callback");
                self.set_state(RegistrationState::Registered);
            }
            Err(e) => log::error!("Failed to add message received callback: {e}"),
        }
    }

    /// Leaves the consent flag set.
    pub async fn do_unregister_for_push_notifications(&self) {
        match self.messaging.unregister_for_push_notifications().await {
            Ok(()) => {
                self.set_state(RegistrationState::NotRegistered);
                self.dialogs.alert(AlertOptions::new("Unregistered", "If you were registered, that is.", "Got it, thanks!")).await;
            }
            Err(e) => log::error!("Error in do_unregister_for_push_notifications: {e}"),
        }
    }

    pub async fn do_register_for_push_notifications_again(&self) {
        match self.messaging.register_for_push_notifications().await {
            Ok(()) => {
                self.set_state(RegistrationState::Registered);
                self.dialogs.alert(AlertOptions::new(
                    "Registered again",
                    "You should now use the new push token which was received in the push token callback, or call 'current_push_token'.",
                    "Got it."
                )).await;
            }
            Err(e) => log::error!("Error in do_register_for_push_notifications_again: {e}"),
        }
    }

    pub async fn do_subscribe_to_topic(&self) {
        let topic = &self.config.demo_topic;
        let alert = match self.messaging.subscribe_to_topic(topic).await {
            Ok(()) => AlertOptions::new("Subscribed", format!(".. to the '{topic}' topic"), "Okay, interesting"),
            Err(e) => AlertOptions::new("Subscribe error", e.to_string(), "OK"),
        };
        self.dialogs.alert(alert).await;
    }

    pub async fn do_unsubscribe_from_topic(&self) {
        let topic = &self.config.demo_topic;
        let alert = match self.messaging.unsubscribe_from_topic(topic).await {
            Ok(()) => AlertOptions::new("Unsubscribed", format!(".. from the '{topic}' topic"), "Okay, very interesting"),
            Err(e) => AlertOptions::new("Unsubscribe error", e.to_string(), "OK"),
        };
        self.dialogs.alert(alert).await;
    }

    pub async fn do_get_are_notifications_enabled(&self) {
        let enabled = self.messaging.are_notifications_enabled();
        self.dialogs.alert(AlertOptions::new("AreNotificationsEnabled", enabled.to_string(), "Okay, very interesting")).await;
    }
}

fn demo_interactive_settings() -> InteractiveSettings {
    InteractiveSettings{
        actions: vec![
            NotificationAction::button("OPEN_ACTION", "Open the app (if closed)", ActionOptions::FOREGROUND),
            NotificationAction::button(
                "AUTH",
                "Open the app, but only if device is not locked with a passcode",
                ActionOptions::FOREGROUND | ActionOptions::AUTHENTICATION_REQUIRED,
            ),
            NotificationAction::input("INPUT_ACTION", "Tap to reply without opening the app", ActionOptions::NONE, "Fire!", "Load the gun..."),
            NotificationAction::input("INPUT_ACTION", "Tap to reply and open the app", ActionOptions::FOREGROUND, "OK, send it", "Type here, baby!"),
            NotificationAction::button("DELETE_ACTION", "Delete without opening the app", ActionOptions::DESTRUCTIVE),
        ],
        categories: vec![NotificationCategory{identifier: "GENERAL".to_string()}],
    }
}

#[cfg(test)]
#[path = "view_model_tests.rs"]
mod tests;
