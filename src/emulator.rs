//! Emulator Assembly
//!
//! Builds the session, resolver, and log writer from a configuration,
//! stages the archive, and runs one dispatch tick per input line. The
//! interactive loop, tests, and any embedder all drive this same path.

use crate::archive;
use crate::audit::{LogEntry, LogWriter};
use crate::config::ShellConfig;
use crate::dispatch::{dispatch, CommandOutcome};
use crate::errors::HuskError;
use crate::resolver::Resolver;
use crate::session::Session;

#[derive(Debug)]
pub struct Emulator {
    session: Session,
    resolver: Resolver,
    log: LogWriter,
}

impl Emulator {
    /// Stage the archive and open the session. Writes the startup entry.
    pub fn new(config: &ShellConfig) -> Result<Emulator, HuskError> {
        archive::stage_archive(&config.virtual_fs_path, &config.staging_dir)?;

        let session = Session::new(config.username.as_str(), config.hostname.as_str());
        let resolver = Resolver::new(config.staging_dir.clone());
        let log = LogWriter::new(config.log_file_path.clone());
        log.append(LogEntry::now("session started", session.username.as_str()))?;

        Ok(Emulator {
            session,
            resolver,
            log,
        })
    }

    /// Run one input line. The returned outcome carries everything the
    /// caller should print and whether the loop should end.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutcome, HuskError> {
        dispatch(&mut self.session, &self.resolver, &self.log, line)
    }

    /// Close the session on end-of-input. Observably the same as typing
    /// `exit`, but nothing is added to the history.
    pub fn close(&mut self) -> Result<CommandOutcome, HuskError> {
        self.log
            .append(LogEntry::now("session closed", self.session.username.as_str()))?;
        Ok(CommandOutcome::exit("logout\n"))
    }

    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
