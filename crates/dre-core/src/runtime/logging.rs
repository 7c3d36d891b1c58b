//! Host log handlers
//!
//! Script-level conditions (missing program, unknown node, bad `visitCount`
//! arguments) are reported here instead of being returned as errors.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

/// Host callback receiving one formatted message
pub type LogHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Debug and error handlers injected by the host
#[derive(Clone, Default)]
pub struct Logger {
    debug: Option<LogHandler>,
    error: Option<LogHandler>,
}

impl Logger {
    /// Handlers that forward to `tracing`
    pub fn tracing() -> Self {
        Logger {
            debug: Some(Arc::new(|msg: &str| debug!(target: "dre", "{}", msg))),
            error: Some(Arc::new(|msg: &str| error!(target: "dre", "{}", msg))),
        }
    }

    pub fn set_debug_handler(&mut self, handler: LogHandler) {
        self.debug = Some(handler);
    }

    pub fn set_error_handler(&mut self, handler: LogHandler) {
        self.error = Some(handler);
    }

    pub fn has_debug_handler(&self) -> bool {
        self.debug.is_some()
    }

    pub fn has_error_handler(&self) -> bool {
        self.error.is_some()
    }

    /// Report an informational message. Without a handler it goes to `tracing`.
    pub fn debug(&self, message: &str) {
        match &self.debug {
            Some(handler) => handler(message),
            None => debug!(target: "dre", "{}", message),
        }
    }

    /// Report a script-level error. Without a handler it goes to `tracing`.
    pub fn error(&self, message: &str) {
        match &self.error {
            Some(handler) => handler(message),
            None => error!(target: "dre", "{}", message),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("debug", &self.debug.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn handlers_receive_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut logger = Logger::default();
        assert!(!logger.has_error_handler());

        let sink = Arc::clone(&seen);
        logger.set_error_handler(Arc::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        }));
        logger.error("no program loaded");
        logger.debug("falls through to tracing");

        assert!(logger.has_error_handler());
        assert!(!logger.has_debug_handler());
        assert_eq!(*seen.lock().unwrap(), vec!["no program loaded".to_string()]);
    }
}
