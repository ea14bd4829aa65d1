#[cfg(target_os = "android")]
mod android;
#[cfg(target_os = "android")]
pub use android::{OsMessaging, read_launch_intent};

#[cfg(not(target_os = "android"))]
mod unsupported;
#[cfg(not(target_os = "android"))]
pub use unsupported::OsMessaging;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNativeMessaging, NativeCall};

mod interactive;
mod payload;

pub use interactive::{
    ActionCallback, ActionKind, ActionOptions, ActionTaken, InteractiveSettings,
    IosPushSettings, NotificationAction, NotificationCategory, PushNotificationModel,
};
pub use payload::{LaunchIntent, Notification, Payload, Value, BOOKKEEPING_KEYS, FROM_KEY, RESERVED_KEYS, VIEW_ACTION};

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::config::MessagingConfig;

/// Errors from messaging operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    /// The messaging module or its push service configuration is missing from the app build.
    #[error("Messaging is not provisioned: include the messaging module and the push service configuration in the app first")]
    NotProvisioned,
    /// The native layer reported a failure; the reason is passed through as is.
    #[error("{0}")]
    Rejected(String),
    #[error("native call failed: {0}")]
    Native(String),
}

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for MessagingError {
    fn from(error: jni::errors::Error) -> Self {MessagingError::Native(error.to_string())}
}

/// Failure of an asynchronous native task such as a topic subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Structured reason, when the native exception carries one.
    pub reason: Option<String>,
    /// Text of the raw native error.
    pub raw: String,
}

impl From<TaskFailure> for MessagingError {
    fn from(failure: TaskFailure) -> Self {
        MessagingError::Rejected(failure.reason.unwrap_or(failure.raw))
    }
}

/// Listener the native layer calls with a passthrough string (message JSON or token),
/// or with the native error text.
pub type NativeListener = Arc<dyn Fn(Result<String, String>) + Send + Sync>;
pub type ActionListener = ActionCallback;

pub type MessageCallback = Arc<dyn Fn(Notification) + Send + Sync>;
pub type TokenCallback = Arc<dyn Fn(String) + Send + Sync>;

/// The platform push SDK as seen by the adapter.
#[async_trait]
pub trait NativeMessaging: Send + Sync + 'static {
    /// Whether the messaging module is linked into the app.
    fn is_provisioned(&self) -> bool;
    /// Looks up the sender id from the app resource with the given name.
    fn sender_id(&self, resource: &str) -> Option<String>;
    fn register_lifecycle_callbacks(&self) -> Result<(), MessagingError>;

    async fn current_push_token(&self, sender_id: &str) -> Result<Option<String>, MessagingError>;
    fn set_message_listener(&self, listener: NativeListener) -> Result<(), MessagingError>;
    fn set_token_listener(&self, listener: NativeListener) -> Result<(), MessagingError>;
    fn clear_listeners(&self);

    fn register(&self, sender_id: &str) -> Result<(), MessagingError>;
    fn unregister(&self, sender_id: Option<&str>) -> Result<(), MessagingError>;

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), TaskFailure>;
    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), TaskFailure>;

    /// Platform API level.
    fn sdk_version(&self) -> u32;
    fn notifications_enabled(&self) -> Result<bool, MessagingError>;

    fn register_interactive_push(&self, settings: &IosPushSettings, listener: Option<ActionListener>) -> Result<(), MessagingError>;
}

/// Callbacks to install right after init.
#[derive(Clone, Default)]
pub struct CallbackOptions {
    pub on_message_received: Option<MessageCallback>,
    pub on_push_token_received: Option<TokenCallback>,
}

#[derive(Default)]
struct AdapterState {
    sender_id: Option<String>,
    message_callback: Option<MessageCallback>,
    launch_notification: Option<Notification>,
}

struct Inner {
    native: Arc<dyn NativeMessaging>,
    runtime: Handle,
    config: MessagingConfig,
    state: Mutex<AdapterState>,
}

/// Push messaging adapter. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Messaging(Arc<Inner>);

impl Messaging {
    pub fn init(native: Arc<dyn NativeMessaging>, config: MessagingConfig, runtime: Handle) -> Self {
        let sender_id = native.sender_id(&config.sender_id_resource);
        if sender_id.is_none() {
            log::warn!(
                "No '{}' resource found. Did you include the push service configuration file in the app? Messaging will not work properly.",
                config.sender_id_resource
            );
        }
        Messaging(Arc::new(Inner{
            native,
            runtime,
            config,
            state: Mutex::new(AdapterState{sender_id, ..Default::default()}),
        }))
    }

    /// Removes the native listeners and forgets every callback, pending notification and the sender id.
    pub fn teardown(&self) {
        self.0.native.clear_listeners();
        *self.state() = AdapterState::default();
        log::debug!("Messaging torn down");
    }

    pub async fn register_callbacks(&self, options: CallbackOptions) -> Result<(), MessagingError> {
        if let Some(callback) = options.on_message_received {
            self.register_message_received_callback(move |n| callback(n)).await?;
        }
        if let Some(callback) = options.on_push_token_received {
            self.register_push_token_received_callback(move |t| callback(t)).await?;
        }
        Ok(())
    }

    pub async fn current_push_token(&self) -> Result<Option<String>, MessagingError> {
        let sender_id = self.provisioned_sender_id()?;
        self.0.native.current_push_token(&sender_id).await
            .inspect_err(|e| log::error!("Error in messaging current_push_token: {e}"))
    }

    /// Installs `callback` as the only receiver of push messages and hands it the
    /// launch notification, if one is waiting.
    pub async fn register_message_received_callback(
        &self, callback: impl Fn(Notification) + Send + Sync + 'static
    ) -> Result<(), MessagingError> {
        let callback: MessageCallback = Arc::new(callback);
        // Published before the pending slot is read: a concurrent launch either
        // sees this callback or leaves its notification for the take below.
        self.state().message_callback = Some(callback.clone());

        let receiver = callback.clone();
        let listener: NativeListener = Arc::new(move |raw: Result<String, String>| match raw {
            Ok(raw) => match Notification::from_json(&raw) {
                Ok(notification) => receiver(notification),
                Err(e) => log::error!("Failed to parse received message: {e}"),
            },
            Err(e) => log::error!("Message listener error: {e}"),
        });
        self.0.native.set_message_listener(listener)
            .inspect_err(|e| log::error!("Error in messaging register_message_received_callback: {e}"))?;

        let pending = self.state().launch_notification.take();
        if let Some(notification) = pending {
            callback(notification);
        }
        Ok(())
    }

    /// Tokens issued before this call are not replayed.
    pub async fn register_push_token_received_callback(
        &self, callback: impl Fn(String) + Send + Sync + 'static
    ) -> Result<(), MessagingError> {
        let listener: NativeListener = Arc::new(move |token: Result<String, String>| match token {
            Ok(token) => callback(token),
            Err(e) => log::error!("Push token listener error: {e}"),
        });
        self.0.native.set_token_listener(listener)
            .inspect_err(|e| log::error!("Error in messaging register_push_token_received_callback: {e}"))
    }

    pub async fn register_for_push_notifications(&self) -> Result<(), MessagingError> {
        let sender_id = self.provisioned_sender_id()?;
        self.0.native.register(&sender_id)
            .inspect_err(|e| log::error!("Error in messaging register_for_push_notifications: {e}"))
    }

    pub async fn unregister_for_push_notifications(&self) -> Result<(), MessagingError> {
        self.require_module()?;
        let sender_id = self.state().sender_id.clone();
        self.0.native.unregister(sender_id.as_deref())
            .inspect_err(|e| log::error!("Error in messaging unregister_for_push_notifications: {e}"))
    }

    pub async fn subscribe_to_topic(&self, topic: &str) -> Result<(), MessagingError> {
        self.require_module()?;
        self.0.native.subscribe_to_topic(topic).await.map_err(|failure| {
            log::error!("Error in messaging subscribe_to_topic '{topic}': {}", failure.raw);
            failure.into()
        })
    }

    pub async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), MessagingError> {
        self.require_module()?;
        self.0.native.unsubscribe_from_topic(topic).await.map_err(|failure| {
            log::error!("Error in messaging unsubscribe_from_topic '{topic}': {}", failure.raw);
            failure.into()
        })
    }

    /// Defaults to `true` where the platform cannot answer.
    pub fn are_notifications_enabled(&self) -> bool {
        let sdk = self.0.native.sdk_version();
        if sdk < self.0.config.notification_query_min_sdk {
            log::info!("Checking whether notifications are enabled is not supported on SDK version {sdk}");
            return true;
        }
        self.0.native.notifications_enabled().unwrap_or_else(|e| {
            log::error!("Error in messaging are_notifications_enabled: {e}");
            true
        })
    }

    pub async fn register_for_interactive_push(&self, model: PushNotificationModel) -> Result<(), MessagingError> {
        self.0.native.register_interactive_push(&model.ios_settings, model.on_notification_action_taken)
            .inspect_err(|e| log::error!("Error in messaging register_for_interactive_push: {e}"))
    }

    /// Inspects how the app was started and captures the notification it was
    /// opened from. Called once by the platform launch hook.
    pub fn handle_app_launch(&self, intent: &LaunchIntent) {
        if let Err(e) = self.0.native.register_lifecycle_callbacks() {
            log::error!("Failed to register lifecycle callbacks: {e}");
        }
        if self.state().sender_id.is_none() {
            log::warn!("Launch intent ignored, messaging has no sender id");
            return;
        }
        let Some(notification) = intent.notification() else {return};

        let mut state = self.state();
        if state.message_callback.is_none() {
            log::debug!("Holding launch notification until a message callback is registered");
            state.launch_notification = Some(notification);
            return;
        }
        drop(state);

        let messaging = self.clone();
        let delay = self.0.config.launch_delivery_delay();
        self.0.runtime.spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            // Resolved after the wait so a callback registered meanwhile receives it.
            let callback = messaging.state().message_callback.clone();
            match callback {
                Some(callback) => callback(notification),
                None => log::debug!("Launch notification dropped, messaging was torn down"),
            }
        });
    }

    pub fn has_launch_notification(&self) -> bool {
        self.state().launch_notification.is_some()
    }

    pub fn launch_notification(&self) -> Option<Notification> {
        self.state().launch_notification.clone()
    }

    pub fn has_message_callback(&self) -> bool {
        self.state().message_callback.is_some()
    }

    fn require_module(&self) -> Result<(), MessagingError> {
        match self.0.native.is_provisioned() {
            true => Ok(()),
            false => Err(MessagingError::NotProvisioned),
        }
    }

    fn provisioned_sender_id(&self) -> Result<String, MessagingError> {
        self.require_module()?;
        self.state().sender_id.clone().ok_or(MessagingError::NotProvisioned)
    }

    fn state(&self) -> MutexGuard<'_, AdapterState> {
        self.0.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "messaging_tests.rs"]
mod tests;
