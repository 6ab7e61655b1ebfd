//! Diagnostic logging for the simulator. This is separate from _reporting_, which records model
//! output (daily tallies, transmission events) to CSV files.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`. Logging is _disabled_ by default; the runner enables it with `-v` or with
//! `--log-level`, which takes a global level and module filters such as
//! `info,concert_contagion::transmission=debug`. It can also be controlled from code:
//!
//! ```rust
//! use concert_contagion::log::{set_log_level, set_module_filters, LevelFilter};
//!
//! pub fn setup_logging() {
//!     set_log_level(LevelFilter::Info);
//!     // Per-day transmission details.
//!     set_module_filters(&[("concert_contagion::transmission", LevelFilter::Debug)]);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::sync::{LazyLock, Mutex, MutexGuard};

#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::HashMap;

// Plan scheduling is noisy; it stays at `info` unless asked for explicitly.
const QUIET_MODULES: [(&str, LevelFilter); 1] = [("concert_contagion::plan", LevelFilter::Info)];

static LOGGER_STATE: LazyLock<Mutex<LoggerState>> = LazyLock::new(Mutex::default);

/// What the installed logger currently does. Loggers are process wide, so a single instance
/// lives behind `LOGGER_STATE` and the public API is a set of free functions over it.
#[derive(Debug)]
pub(in crate::log) struct LoggerState {
    /// Level for targets without a filter of their own; `Off` until logging is enabled.
    pub(in crate::log) level: LevelFilter,
    /// Module path to level.
    pub(in crate::log) module_levels: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    handle: Option<Handle>,
}

impl Default for LoggerState {
    fn default() -> Self {
        LoggerState {
            level: LevelFilter::Off,
            module_levels: QUIET_MODULES
                .iter()
                .map(|&(module, level)| (module.to_string(), level))
                .collect(),

            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

impl LoggerState {
    /// Records a module level; true if anything changed.
    fn put(&mut self, module: &str, level: LevelFilter) -> bool {
        self.module_levels.insert(module.to_string(), level) != Some(level)
    }
}

/// Turns on every log message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Sets the level for every target without a module filter.
pub fn set_log_level(level: LevelFilter) {
    let mut state = logger_state();
    state.level = level;
    state.apply();
}

/// Sets several module filters, reconfiguring the logger at most once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    let mut state = logger_state();
    let mut changed = false;
    for &(module, level) in module_filters {
        changed |= state.put(module, level);
    }
    if changed {
        state.apply();
    }
}

fn logger_state() -> MutexGuard<'static, LoggerState> {
    LOGGER_STATE.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{enable_logging, logger_state, set_log_level, set_module_filters};
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // The logger is global.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn global_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let state = logger_state();
            assert_eq!(state.level, LevelFilter::Error);
            error!("global level is error");
            trace!("not emitted");
        }
        enable_logging();
        {
            let state = logger_state();
            assert_eq!(state.level, LevelFilter::Trace);
            assert_eq!(log::max_level(), LevelFilter::Trace);
        }
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        {
            let state = logger_state();
            assert_eq!(state.module_levels.len(), 1);
            assert_eq!(
                state.module_levels.get("concert_contagion::plan"),
                Some(&LevelFilter::Info)
            );
        }

        let filters = [
            ("concert_contagion::plan", LevelFilter::Error),
            ("concert_contagion::health", LevelFilter::Debug),
        ];
        set_module_filters(&filters);
        {
            let state = logger_state();
            assert_eq!(state.module_levels.len(), 2);
            for (module_path, level) in filters {
                assert_eq!(state.module_levels.get(module_path), Some(&level));
            }
        }

        // Setting the same filters again changes nothing.
        set_module_filters(&filters);
        assert_eq!(logger_state().module_levels.len(), 2);

        // Restore the defaults for other tests in this binary.
        logger_state().module_levels.remove("concert_contagion::health");
        set_module_filters(&[("concert_contagion::plan", LevelFilter::Info)]);
        set_log_level(LevelFilter::Off);
    }
}
