use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub mod config;
pub use config::{Config, ConfigError};

pub mod hardware;
pub use crate::hardware::{
    Messaging,
    MessagingError,
    NativeMessaging,
    LaunchIntent,
    Notification,
    {Settings, SettingsError},
};
pub mod runtime;
use runtime::Runtime;

pub mod dialogs;
pub use dialogs::{Dialogs, LogDialogs};

pub mod view_model;
pub use view_model::{PushViewModel, RegistrationState};

pub mod prelude {
    pub use crate::{MaverickPush, Config, Dialogs, LaunchIntent, PushViewModel};
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// One push-enabled application process: logger, runtime, platform context and view-model.
pub struct MaverickPush<D: Dialogs> {
    runtime: Runtime,
    hardware: hardware::Context,
    view_model: PushViewModel<D>,
}

impl<D: Dialogs> MaverickPush<D> {
    pub fn start(
        native: Arc<dyn NativeMessaging>,
        dialogs: D,
        config: Config,
        settings_dir: impl AsRef<Path>,
    ) -> Result<Self, StartError> {
        hardware::Logger::start(config.log_level()?);
        let runtime = Runtime::start()?;
        let settings = Settings::open(settings_dir)?;
        let hardware = hardware::Context::new(native, settings.clone(), config.messaging.clone(), runtime.handle());
        let view_model = runtime.block_on(PushViewModel::new(
            hardware.messaging.clone(),
            settings,
            dialogs,
            config.view_model.clone(),
        ))?;
        log::info!("Push messaging started");
        Ok(MaverickPush{runtime, hardware, view_model})
    }

    /// Called once by the platform launch hook.
    pub fn on_app_launch(&self, intent: &LaunchIntent) {
        self.hardware.handle_app_launch(intent);
    }

    pub fn view_model(&self) -> &PushViewModel<D> {&self.view_model}

    pub fn hardware(&self) -> &hardware::Context {&self.hardware}

    ///Runs a view-model action to completion on the push runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn close(self) {
        self.hardware.messaging.teardown();
        self.runtime.close();
        log::info!("Push messaging closed");
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
