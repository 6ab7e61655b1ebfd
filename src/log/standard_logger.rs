use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LoggerState;

const STDERR_APPENDER: &str = "stderr";
// Timestamp, highlighted level, target and message
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LoggerState {
    /// Installs the `log4rs` logger on first use and reconfigures it afterwards. Everything
    /// goes to stderr; stdout carries the simulation summary.
    pub(in crate::log) fn apply(&mut self) {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let loggers = self
            .module_levels
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));
        let config = Config::builder()
            .appender(Appender::builder().build(STDERR_APPENDER, Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender(STDERR_APPENDER).build(self.level))
            .unwrap_or_else(|error| panic!("invalid logger configuration: {error}"));

        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => match log4rs::init_config(config) {
                Ok(handle) => self.handle = Some(handle),
                // Someone else installed a logger; leave it alone.
                Err(error) => eprintln!("logging unavailable: {error}"),
            },
        }
    }
}
