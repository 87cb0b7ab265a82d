//! Audit Log
//!
//! Append-only XML store recording every command outcome. Appends are
//! read-modify-write: the whole document is parsed, the new entry is pushed,
//! and the file is rewritten with all prior entries preserved in order.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::errors::HuskError;

/// One recorded action. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub action: String,
    pub user: String,
}

impl LogEntry {
    /// Stamp an action with the current local wall-clock time.
    pub fn now(action: impl Into<String>, user: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            action: action.into(),
            user: user.into(),
        }
    }
}

/// Writer and reader for the XML audit store.
#[derive(Debug)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogWriter { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, preserving everything already in the store.
    ///
    /// A store that exists but does not parse is a fatal error; no repair
    /// is attempted.
    pub fn append(&self, entry: LogEntry) -> Result<(), HuskError> {
        let mut entries = if self.path.exists() {
            self.read_entries()?
        } else {
            Vec::new()
        };
        entries.push(entry);
        std::fs::write(&self.path, render_document(&entries)).map_err(|e| {
            HuskError::log(format!("cannot write '{}': {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Parse the whole store, oldest entry first.
    pub fn read_entries(&self) -> Result<Vec<LogEntry>, HuskError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| HuskError::log(format!("cannot read '{}': {}", self.path.display(), e)))?;
        XmlParser::new(&raw).parse_document().map_err(|e| {
            HuskError::log(format!("corrupted store '{}': {}", self.path.display(), e))
        })
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn render_document(entries: &[LogEntry]) -> String {
    let mut output = String::from("<log>\n");
    for entry in entries {
        output.push_str("  <log_entry>\n");
        output.push_str(&format!(
            "    <timestamp>{}</timestamp>\n",
            escape_text(&entry.timestamp)
        ));
        output.push_str(&format!(
            "    <action>{}</action>\n",
            escape_text(&entry.action)
        ));
        output.push_str(&format!("    <user>{}</user>\n", escape_text(&entry.user)));
        output.push_str("  </log_entry>\n");
    }
    output.push_str("</log>\n");
    output
}

// ---------------------------------------------------------------------------
// Simple XML parser
// ---------------------------------------------------------------------------

struct XmlParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> XmlParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input.as_bytes()[self.pos].is_ascii_whitespace()
        {
            self.pos += 1;
        }
    }

    fn skip_declaration(&mut self) {
        // Skip <?xml ... ?> and <!-- ... -->
        loop {
            self.skip_whitespace();
            if self.remaining().starts_with("<?") {
                if let Some(end) = self.remaining().find("?>") {
                    self.pos += end + 2;
                } else {
                    break;
                }
            } else if self.remaining().starts_with("<!--") {
                if let Some(end) = self.remaining().find("-->") {
                    self.pos += end + 3;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    /// The store has a fixed shape, so parsing is strict: a root `<log>`
    /// holding `<log_entry>` children with exactly timestamp, action, user.
    fn parse_document(&mut self) -> Result<Vec<LogEntry>, String> {
        self.skip_declaration();
        self.expect_open("log")?;
        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            if self.remaining().starts_with("</log>") {
                self.pos += "</log>".len();
                break;
            }
            if self.remaining().is_empty() {
                return Err("unterminated <log> element".to_string());
            }
            entries.push(self.parse_entry()?);
        }
        Ok(entries)
    }

    fn parse_entry(&mut self) -> Result<LogEntry, String> {
        self.expect_open("log_entry")?;
        let timestamp = self.parse_text_element("timestamp")?;
        let action = self.parse_text_element("action")?;
        let user = self.parse_text_element("user")?;
        self.expect_close("log_entry")?;
        Ok(LogEntry {
            timestamp,
            action,
            user,
        })
    }

    fn parse_text_element(&mut self, name: &str) -> Result<String, String> {
        self.expect_open(name)?;
        let start = self.pos;
        // Jump to the next tag; text between tags is kept verbatim.
        if let Some(end) = self.remaining().find('<') {
            self.pos += end;
        } else {
            self.pos = self.input.len();
        }
        let text = self.input[start..self.pos].to_string();
        self.expect_close(name)?;
        Ok(unescape_text(&text))
    }

    fn expect_open(&mut self, name: &str) -> Result<(), String> {
        self.skip_whitespace();
        let tag = format!("<{}>", name);
        if self.remaining().starts_with(&tag) {
            self.pos += tag.len();
            Ok(())
        } else {
            Err(format!("expected <{}>", name))
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<(), String> {
        self.skip_whitespace();
        let tag = format!("</{}>", name);
        if self.remaining().starts_with(&tag) {
            self.pos += tag.len();
            Ok(())
        } else {
            Err(format!("expected </{}>", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> LogWriter {
        LogWriter::new(dir.path().join("log.xml"))
    }

    #[test]
    fn test_append_creates_store_with_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);

        writer.append(LogEntry::now("session started", "kima")).unwrap();

        let entries = writer.read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "session started");
        assert_eq!(entries[0].user, "kima");

        let raw = std::fs::read_to_string(writer.path()).unwrap();
        assert!(raw.starts_with("<log>"));
        assert!(raw.trim_end().ends_with("</log>"));
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);

        for action in ["ls", "cd dir1", "du"] {
            writer.append(LogEntry::now(action, "kima")).unwrap();
        }

        let actions: Vec<String> = writer
            .read_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["ls", "cd dir1", "du"]);
    }

    #[test]
    fn test_store_survives_writer_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.xml");

        LogWriter::new(&path)
            .append(LogEntry::now("session started", "kima"))
            .unwrap();
        let second = LogWriter::new(&path);
        second.append(LogEntry::now("whoami", "kima")).unwrap();

        let entries = second.read_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "session started");
        assert_eq!(entries[1].action, "whoami");
    }

    #[test]
    fn test_special_characters_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);

        writer
            .append(LogEntry::now("cd <a> & </b> (unknown-command)", "kima"))
            .unwrap();

        let entries = writer.read_entries().unwrap();
        assert_eq!(entries[0].action, "cd <a> & </b> (unknown-command)");
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);

        writer
            .append(LogEntry::now("привет (unknown-command)", "кима"))
            .unwrap();
        // The second append re-reads the store holding multibyte text.
        writer.append(LogEntry::now("ls", "кима")).unwrap();

        let entries = writer.read_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "привет (unknown-command)");
        assert_eq!(entries[0].user, "кима");
        assert_eq!(entries[1].action, "ls");
    }

    #[test]
    fn test_padded_fields_survive_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);

        writer.append(LogEntry::now("whoami", " kima ")).unwrap();
        writer.append(LogEntry::now("ls", " kima ")).unwrap();

        let entries = writer.read_entries().unwrap();
        assert_eq!(entries[0].user, " kima ");
        assert_eq!(entries[1].user, " kima ");
    }

    #[test]
    fn test_corrupted_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);
        std::fs::write(writer.path(), "<log><log_entry>mangled").unwrap();

        let err = writer.append(LogEntry::now("ls", "kima")).unwrap_err();
        assert!(matches!(err, HuskError::Log { .. }));
    }

    #[test]
    fn test_declaration_and_comments_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let writer = store_in(&dir);
        std::fs::write(
            writer.path(),
            "<?xml version=\"1.0\"?>\n<!-- audit -->\n<log>\n  <log_entry>\n    \
             <timestamp>2026-08-21 10:00:00</timestamp>\n    <action>ls</action>\n    \
             <user>kima</user>\n  </log_entry>\n</log>\n",
        )
        .unwrap();

        let entries = writer.read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, "2026-08-21 10:00:00");
    }

    #[test]
    fn test_timestamp_has_second_resolution() {
        let entry = LogEntry::now("ls", "kima");
        assert!(
            chrono::NaiveDateTime::parse_from_str(&entry.timestamp, "%Y-%m-%d %H:%M:%S").is_ok()
        );
    }
}
