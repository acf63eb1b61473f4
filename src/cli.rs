use clap::Parser;
use eyre::{Context, Result};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A terminal client for streaming empathy chat conversations

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/empathy/config.toml
    * $HOME/.config/empathy/config.toml
    * $HOME/.empathy.toml

Interactive commands:
    /clear  start a new conversation
    /quit   exit (Ctrl-D works too)

Press Ctrl-C while a reply is streaming to cancel it.
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,

    /// Send a single message, print the reply and exit
    #[arg(short, long, value_name = "TEXT", conflicts_with = "history")]
    message: Option<String>,

    /// Print the saved conversation of the signed-in user and exit
    #[arg(long)]
    history: bool,
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        if config_path.is_empty() {
            // No config path is specified just use the default config
            return Ok(Configuration::default());
        }
        load_configuration(config_path.as_str()).wrap_err("loading configuration")
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn history(&self) -> bool {
        self.history
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}
