//! Modal dialogs shown to the user

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DialogCall, FakeDialogs};

use async_trait::async_trait;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmOptions {
    pub title: String,
    pub message: String,
    pub ok_button_text: String,
    pub cancel_button_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertOptions {
    pub title: String,
    pub message: Option<String>,
    pub ok_button_text: String,
}

impl AlertOptions {
    pub fn new(title: &str, message: impl Into<String>, ok_button_text: &str) -> Self {
        AlertOptions{title: title.to_string(), message: Some(message.into()), ok_button_text: ok_button_text.to_string()}
    }

    pub fn titled(title: &str, ok_button_text: &str) -> Self {
        AlertOptions{title: title.to_string(), message: None, ok_button_text: ok_button_text.to_string()}
    }
}

/// Presents dialogs and waits for the user to dismiss them.
#[async_trait]
pub trait Dialogs: Clone + Send + Sync + 'static {
    /// Resolves `true` when the user picks the ok button.
    async fn confirm(&self, options: ConfirmOptions) -> bool;
    async fn alert(&self, options: AlertOptions);
}

/// Writes dialogs to the log and accepts every confirmation.
///
/// Used on targets without a UI to host dialogs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDialogs;

#[async_trait]
impl Dialogs for LogDialogs {
    async fn confirm(&self, options: ConfirmOptions) -> bool {
        log::info!("[confirm] {}: {} ({} / {})", options.title, options.message, options.ok_button_text, options.cancel_button_text);
        true
    }

    async fn alert(&self, options: AlertOptions) {
        log::info!("[alert] {}: {}", options.title, options.message.unwrap_or_default());
    }
}
