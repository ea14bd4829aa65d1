// Cross platform logger to start logging with a specified level on Android and desktop targets.

//System:

//<Android>>>: uses android_logger to log messages to logcat.

//<Linux, iOS and macOS>>> uses env_logger for std output logging.

// Level sys: log::Level sets the maximum logging level. Defaults to Warn if None is used.

pub struct Logger;

impl Logger {
    pub fn start(level: Option<log::Level>) {
        let level = level.unwrap_or(log::Level::Warn);
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(level.to_level_filter())
                    .with_tag("maverick_push"),
            );
        }

        #[cfg(not(target_os = "android"))]
        {
            // A second start (tests, restarted shells) keeps the first logger.
            let _ = env_logger::builder().filter_level(level.to_level_filter()).try_init();
        }
    }
}
