use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

/// Run-scoped log lines, persisted as `run.log` and `error.log` at the end of
/// a run. Lines are timestamped and kept in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLogs {
    run: Vec<String>,
    errors: Vec<String>,
}

impl RunLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "storyreel::run", "{}", message);
        self.run.push(stamp(&message));
    }

    /// Error lines go to both the error log and the run log.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(target: "storyreel::run", "{}", message);
        let line = stamp(&message);
        self.errors.push(line.clone());
        self.run.push(line);
    }

    pub fn run_lines(&self) -> &[String] {
        &self.run
    }

    pub fn error_lines(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn stamp(message: &str) -> String {
    format!("[{}] {}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_order_and_errors_are_mirrored() {
        let mut logs = RunLogs::new();
        logs.info("run started");
        logs.error("render failed");
        logs.info("retrying");

        assert_eq!(logs.run_lines().len(), 3);
        assert!(logs.run_lines()[0].ends_with("] run started"));
        assert!(logs.run_lines()[1].ends_with("] render failed"));
        assert_eq!(logs.error_lines().len(), 1);
        assert!(logs.has_errors());
    }

    #[test]
    fn test_lines_are_timestamped() {
        let mut logs = RunLogs::new();
        logs.info("hello");
        let line = &logs.run_lines()[0];
        assert!(line.starts_with('['));
        assert!(line.contains("Z] "));
    }
}
