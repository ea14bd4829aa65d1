//! Fake dialogs for testing

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{AlertOptions, ConfirmOptions, Dialogs};

/// Recorded dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogCall {
    Confirm(ConfirmOptions),
    Alert(AlertOptions),
}

struct FakeDialogsState {
    confirm_answer: bool,
    calls: Vec<DialogCall>,
}

/// Fake dialogs that answer every confirmation with a preset choice
#[derive(Clone)]
pub struct FakeDialogs {
    inner: Arc<Mutex<FakeDialogsState>>,
}

impl Default for FakeDialogs {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeDialogsState{confirm_answer: true, calls: Vec::new()})),
        }
    }
}

impl FakeDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(confirm_answer: bool) -> Self {
        let dialogs = Self::default();
        dialogs.lock().confirm_answer = confirm_answer;
        dialogs
    }

    pub fn calls(&self) -> Vec<DialogCall> {
        self.lock().calls.clone()
    }

    pub fn alerts(&self) -> Vec<AlertOptions> {
        self.lock().calls.iter().filter_map(|call| match call {
            DialogCall::Alert(alert) => Some(alert.clone()),
            DialogCall::Confirm(_) => None,
        }).collect()
    }

    pub fn last_alert(&self) -> Option<AlertOptions> {
        self.alerts().pop()
    }

    fn lock(&self) -> MutexGuard<'_, FakeDialogsState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Dialogs for FakeDialogs {
    async fn confirm(&self, options: ConfirmOptions) -> bool {
        let mut state = self.lock();
        state.calls.push(DialogCall::Confirm(options));
        state.confirm_answer
    }

    async fn alert(&self, options: AlertOptions) {
        self.lock().calls.push(DialogCall::Alert(options));
    }
}
