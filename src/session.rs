//! Session State
//!
//! The mutable record of one interactive session.

use crate::vpath::VirtualPath;

/// State carried across commands: where the user is, who they are, and
/// every line they have typed.
#[derive(Debug, Clone)]
pub struct Session {
    pub current: VirtualPath,
    pub username: String,
    pub host_label: String,
    pub history: Vec<String>,
}

impl Session {
    pub fn new(username: impl Into<String>, host_label: impl Into<String>) -> Self {
        Session {
            current: VirtualPath::root(),
            username: username.into(),
            host_label: host_label.into(),
            history: Vec::new(),
        }
    }

    /// Record a raw input line. Every line lands here, blank ones included.
    pub fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    /// Prompt in the `user@host:path $ ` shape.
    pub fn prompt(&self) -> String {
        format!("{}@{}:{} $ ", self.username, self.host_label, self.current)
    }
}
