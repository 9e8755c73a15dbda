//! Console output control
//!
//! This module provides the [`Logger`] for all user-visible output of the
//! command-line front end: verbosity levels, status lines, payload
//! printing and operation timing. Library diagnostics go through `tracing`.

use crate::session::Notifier;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message, printed even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Operation payload. Always printed: it is the command's result.
    pub fn payload(&self, value: &Value) {
        println!("{}", Self::render(value));
    }

    pub fn render(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            Value::Null => "(empty response)".to_string(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            println!("\n--- {} ---", title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let millis = duration.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else if duration.as_secs() < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else {
            let secs = duration.as_secs();
            format!("{}m{}s", secs / 60, secs % 60)
        }
    }
}

impl Notifier for Logger {
    fn notify(&self, message: &str) {
        self.warning(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_strings_raw_and_objects_pretty() {
        assert_eq!(Logger::render(&json!("bearer abc")), "bearer abc");
        assert_eq!(Logger::render(&Value::Null), "(empty response)");
        assert_eq!(Logger::render(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn format_duration_units() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(logger.format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(logger.format_duration(Duration::from_secs(125)), "2m5s");
    }
}
