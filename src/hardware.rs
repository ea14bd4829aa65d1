pub mod messaging;
mod settings;
mod logger;

use std::sync::Arc;

use tokio::runtime::Handle;

#[cfg(target_os = "android")]
use jni::JavaVM;

pub use messaging::{Messaging, MessagingError, NativeMessaging, OsMessaging, LaunchIntent, Notification};
pub use settings::{Settings, SettingsError};
pub use logger::Logger;

use crate::config::MessagingConfig;

/// Hardware context contains interfaces to the platform services.
/// All interfaces are clonable and internally synchronized, safe to call from multiple places.
#[derive(Clone)]
pub struct Context {
    pub messaging: Messaging,
    pub settings: Settings,
}

impl Context {
    pub(crate) fn new(native: Arc<dyn NativeMessaging>, settings: Settings, config: MessagingConfig, runtime: Handle) -> Self {
        Self {
            messaging: Messaging::init(native, config, runtime),
            settings,
        }
    }

    /// The push SDK binding for the current target.
    pub fn os_messaging() -> Arc<dyn NativeMessaging> {
        Arc::new(OsMessaging::new())
    }

    pub fn handle_app_launch(&self, intent: &LaunchIntent) {
        self.messaging.handle_app_launch(intent);
    }

    /// Hands the JavaVM to the messaging binding when the library is not loaded through `JNI_OnLoad`.
    #[cfg(target_os = "android")]
    pub fn initialize(vm: JavaVM) {
        OsMessaging::init_java_vm(vm);
    }
}
