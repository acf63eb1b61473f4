pub mod constants;
mod defaults;
pub mod models;
pub mod utils;

pub use models::*;
pub use utils::*;

use eyre::Result;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sent with every chat request, e.g. `empathy-chat/0.1.0`.
pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, VERSION)
}

pub fn version() -> String {
    format!("{} {}", APP_NAME, VERSION)
}

#[cfg(not(test))]
static CONFIG: std::sync::OnceLock<Configuration> = std::sync::OnceLock::new();

// Per test thread.
#[cfg(test)]
thread_local! {
    static TEST_CONFIG: std::cell::Cell<&'static Configuration> =
        std::cell::Cell::new(Box::leak(Box::new(Configuration::default())));
}

impl Configuration {
    #[cfg(not(test))]
    pub fn instance() -> &'static Configuration {
        CONFIG.get_or_init(Configuration::default)
    }

    #[cfg(not(test))]
    pub fn init(config: Configuration) -> Result<()> {
        CONFIG
            .set(config)
            .map_err(|_| eyre::eyre!("configuration already initialized"))
    }

    #[cfg(test)]
    pub fn instance() -> &'static Configuration {
        TEST_CONFIG.with(|config| config.get())
    }

    #[cfg(test)]
    pub fn init(config: Configuration) -> Result<()> {
        TEST_CONFIG.with(|test_config| test_config.set(Box::leak(Box::new(config))));
        Ok(())
    }
}

/// Prints start-up progress to stderr when `general.verbose` is set.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::config::Configuration::instance().general.verbose {
            eprintln!($($arg)*);
        }
    };
}

pub use verbose;
