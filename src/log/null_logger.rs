//! Used when the `logging` feature is off. Nothing is printed, but the level still gates the
//! `log` macros.
use crate::log::LoggerState;

impl LoggerState {
    pub(in crate::log) fn apply(&mut self) {
        log::set_max_level(self.level);
    }
}
