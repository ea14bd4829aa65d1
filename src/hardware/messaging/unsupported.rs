use async_trait::async_trait;

use super::{ActionListener, IosPushSettings, MessagingError, NativeListener, NativeMessaging, TaskFailure};

/// Stand-in for targets without a push SDK binding. Reports the messaging
/// module as missing so every provisioned operation rejects with the sentinel.
#[derive(Debug, Clone, Default)]
pub struct OsMessaging;

impl OsMessaging {
    pub fn new() -> Self {
        Self
    }

    fn unsupported() -> TaskFailure {
        TaskFailure{reason: None, raw: MessagingError::NotProvisioned.to_string()}
    }
}

#[async_trait]
impl NativeMessaging for OsMessaging {
    fn is_provisioned(&self) -> bool {false}

    fn sender_id(&self, _resource: &str) -> Option<String> {None}

    fn register_lifecycle_callbacks(&self) -> Result<(), MessagingError> {Ok(())}

    async fn current_push_token(&self, _sender_id: &str) -> Result<Option<String>, MessagingError> {
        Err(MessagingError::NotProvisioned)
    }

    fn set_message_listener(&self, _listener: NativeListener) -> Result<(), MessagingError> {
        log::debug!("Push messages are not delivered on this platform");
        Ok(())
    }

    fn set_token_listener(&self, _listener: NativeListener) -> Result<(), MessagingError> {
        Ok(())
    }

    fn clear_listeners(&self) {}

    fn register(&self, _sender_id: &str) -> Result<(), MessagingError> {
        Err(MessagingError::NotProvisioned)
    }

    fn unregister(&self, _sender_id: Option<&str>) -> Result<(), MessagingError> {
        Err(MessagingError::NotProvisioned)
    }

    async fn subscribe_to_topic(&self, _topic: &str) -> Result<(), TaskFailure> {
        Err(Self::unsupported())
    }

    async fn unsubscribe_from_topic(&self, _topic: &str) -> Result<(), TaskFailure> {
        Err(Self::unsupported())
    }

    fn sdk_version(&self) -> u32 {0}

    fn notifications_enabled(&self) -> Result<bool, MessagingError> {Ok(true)}

    fn register_interactive_push(&self, _settings: &IosPushSettings, _listener: Option<ActionListener>) -> Result<(), MessagingError> {
        log::warn!("Interactive push is not supported on this platform");
        Ok(())
    }
}
