//! Scriptable push SDK for tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ActionListener, ActionTaken, IosPushSettings, MessagingError, NativeListener, NativeMessaging, TaskFailure};

/// Recorded native call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    RegisterLifecycleCallbacks,
    CurrentPushToken(String),
    SetMessageListener,
    SetTokenListener,
    ClearListeners,
    Register(String),
    Unregister(Option<String>),
    Subscribe(String),
    Unsubscribe(String),
    RegisterInteractivePush {actions: usize, categories: usize},
}

struct FakeState {
    provisioned: bool,
    sender_id: Option<String>,
    token: Result<Option<String>, MessagingError>,
    topic_results: VecDeque<Result<(), TaskFailure>>,
    sdk_version: u32,
    notifications_enabled: Result<bool, MessagingError>,
    listener_error: Option<MessagingError>,
    message_listener: Option<NativeListener>,
    token_listener: Option<NativeListener>,
    action_listener: Option<ActionListener>,
    calls: Vec<NativeCall>,
}

/// Fake native messaging for testing. Starts out fully provisioned.
#[derive(Clone)]
pub struct FakeNativeMessaging {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeNativeMessaging {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                provisioned: true,
                sender_id: Some("123456789".to_string()),
                token: Ok(None),
                topic_results: VecDeque::new(),
                sdk_version: 33,
                notifications_enabled: Ok(true),
                listener_error: None,
                message_listener: None,
                token_listener: None,
                action_listener: None,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeNativeMessaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messaging module missing and no sender id resource.
    pub fn unprovisioned() -> Self {
        let fake = Self::default();
        fake.set_provisioned(false);
        fake.set_sender_id(None);
        fake
    }

    pub fn set_provisioned(&self, provisioned: bool) {
        self.lock().provisioned = provisioned;
    }

    pub fn set_sender_id(&self, sender_id: Option<&str>) {
        self.lock().sender_id = sender_id.map(str::to_string);
    }

    pub fn set_token(&self, token: Result<Option<String>, MessagingError>) {
        self.lock().token = token;
    }

    /// Queue the outcome of the next subscribe or unsubscribe call. Unqueued calls succeed.
    pub fn push_topic_result(&self, result: Result<(), TaskFailure>) {
        self.lock().topic_results.push_back(result);
    }

    pub fn set_sdk_version(&self, version: u32) {
        self.lock().sdk_version = version;
    }

    pub fn set_notifications_enabled(&self, enabled: Result<bool, MessagingError>) {
        self.lock().notifications_enabled = enabled;
    }

    /// Make the next listener installation fail.
    pub fn fail_listener_install(&self, error: MessagingError) {
        self.lock().listener_error = Some(error);
    }

    /// Deliver a raw message through the installed message listener.
    pub fn deliver_message(&self, raw: &str) -> bool {
        let listener = self.lock().message_listener.clone();
        listener.map(|l| l(Ok(raw.to_string()))).is_some()
    }

    /// Issue a token through the installed token listener.
    pub fn issue_token(&self, token: &str) -> bool {
        let listener = self.lock().token_listener.clone();
        listener.map(|l| l(Ok(token.to_string()))).is_some()
    }

    pub fn fail_token(&self, error: &str) -> bool {
        let listener = self.lock().token_listener.clone();
        listener.map(|l| l(Err(error.to_string()))).is_some()
    }

    pub fn take_action(&self, action: ActionTaken) -> bool {
        let listener = self.lock().action_listener.clone();
        listener.map(|l| l(action)).is_some()
    }

    pub fn has_message_listener(&self) -> bool {
        self.lock().message_listener.is_some()
    }

    /// Get all recorded native calls
    pub fn calls(&self) -> Vec<NativeCall> {
        self.lock().calls.clone()
    }

    fn record(&self, call: NativeCall) {
        self.lock().calls.push(call);
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_topic_result(&self) -> Result<(), TaskFailure> {
        self.lock().topic_results.pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl NativeMessaging for FakeNativeMessaging {
    fn is_provisioned(&self) -> bool {
        self.lock().provisioned
    }

    fn sender_id(&self, _resource: &str) -> Option<String> {
        self.lock().sender_id.clone()
    }

    fn register_lifecycle_callbacks(&self) -> Result<(), MessagingError> {
        self.record(NativeCall::RegisterLifecycleCallbacks);
        Ok(())
    }

    async fn current_push_token(&self, sender_id: &str) -> Result<Option<String>, MessagingError> {
        self.record(NativeCall::CurrentPushToken(sender_id.to_string()));
        self.lock().token.clone()
    }

    fn set_message_listener(&self, listener: NativeListener) -> Result<(), MessagingError> {
        self.record(NativeCall::SetMessageListener);
        let mut state = self.lock();
        if let Some(error) = state.listener_error.take() {
            return Err(error);
        }
        state.message_listener = Some(listener);
        Ok(())
    }

    fn set_token_listener(&self, listener: NativeListener) -> Result<(), MessagingError> {
        self.record(NativeCall::SetTokenListener);
        let mut state = self.lock();
        if let Some(error) = state.listener_error.take() {
            return Err(error);
        }
        state.token_listener = Some(listener);
        Ok(())
    }

    fn clear_listeners(&self) {
        self.record(NativeCall::ClearListeners);
        let mut state = self.lock();
        state.message_listener = None;
        state.token_listener = None;
        state.action_listener = None;
    }

    fn register(&self, sender_id: &str) -> Result<(), MessagingError> {
        self.record(NativeCall::Register(sender_id.to_string()));
        Ok(())
    }

    fn unregister(&self, sender_id: Option<&str>) -> Result<(), MessagingError> {
        self.record(NativeCall::Unregister(sender_id.map(str::to_string)));
        Ok(())
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), TaskFailure> {
        self.record(NativeCall::Subscribe(topic.to_string()));
        self.next_topic_result()
    }

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), TaskFailure> {
        self.record(NativeCall::Unsubscribe(topic.to_string()));
        self.next_topic_result()
    }

    fn sdk_version(&self) -> u32 {
        self.lock().sdk_version
    }

    fn notifications_enabled(&self) -> Result<bool, MessagingError> {
        self.lock().notifications_enabled.clone()
    }

    fn register_interactive_push(&self, settings: &IosPushSettings, listener: Option<ActionListener>) -> Result<(), MessagingError> {
        let (actions, categories) = settings.interactive_settings.as_ref()
            .map(|s| (s.actions.len(), s.categories.len()))
            .unwrap_or((0, 0));
        self.record(NativeCall::RegisterInteractivePush{actions, categories});
        self.lock().action_listener = listener;
        Ok(())
    }
}
