use log::{info, warn};
use std::time::Instant;

use crate::error::SplitError;
use crate::pipeline::config::SplitConfig;
use crate::pipeline::context::SplitStats;
use crate::pipeline::key::KeyExtractor;
use crate::pipeline::registry::SinkRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterState {
    /// No header seen yet, so there is nowhere to send a continuation line
    AwaitingFirstHeader,
    /// Lines go to the sink of `current_key` until the next header
    Routing { current_key: String },
}

/// Sends every line to the sink of the most recent header line.
pub struct Router {
    header_char: char,
    extractor: KeyExtractor,
    registry: SinkRegistry,
    state: RouterState,
    progress_interval: usize,
    lines_read: usize,
    headers_seen: usize,
    start_time: Instant,
}

impl Router {
    pub fn new(config: SplitConfig) -> Self {
        let registry = SinkRegistry::new(config.clone());
        Self::with_registry(&config, registry)
    }

    pub fn with_registry(config: &SplitConfig, registry: SinkRegistry) -> Self {
        Router {
            header_char: config.header_char,
            extractor: KeyExtractor::new(config),
            registry,
            state: RouterState::AwaitingFirstHeader,
            progress_interval: config.progress_interval,
            lines_read: 0,
            headers_seen: 0,
            start_time: Instant::now(),
        }
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn current_key(&self) -> Option<&str> {
        match &self.state {
            RouterState::AwaitingFirstHeader => None,
            RouterState::Routing { current_key } => Some(current_key),
        }
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Route one line (without its newline).
    pub fn route(&mut self, line: &str) -> Result<(), SplitError> {
        self.lines_read += 1;
        let line_number = self.lines_read;

        if line.starts_with(self.header_char) {
            let key = self.extractor.extract(line, line_number)?;
            self.headers_seen += 1;
            self.registry.get_or_create(&key)?.write_line(line)?;

            let same_group = matches!(
                &self.state,
                RouterState::Routing { current_key } if *current_key == key
            );
            if !same_group {
                self.state = RouterState::Routing { current_key: key };
            }
        } else {
            match &self.state {
                RouterState::Routing { current_key } => {
                    self.registry.get_or_create(current_key)?.write_line(line)?;
                }
                RouterState::AwaitingFirstHeader => {
                    return Err(SplitError::RoutingBeforeHeader {
                        line_number,
                        line: line.to_string(),
                    });
                }
            }
        }

        if self.progress_interval > 0 && line_number % self.progress_interval == 0 {
            info!(
                "{} lines routed into {} groups",
                line_number,
                self.registry.len()
            );
        }

        Ok(())
    }

    /// Close every sink and report what was written.
    pub fn finish(self) -> Result<SplitStats, SplitError> {
        let groups = self.registry.close_all()?;
        Ok(SplitStats {
            lines_read: self.lines_read,
            headers_seen: self.headers_seen,
            groups,
            processing_time: self.start_time.elapsed(),
        })
    }

    /// Close every sink after a fatal error. Failures here are only logged,
    /// the error that stopped the run is the one worth reporting.
    pub fn abort(self) {
        if let Err(e) = self.registry.close_all() {
            warn!("while closing outputs after an error: {}", e);
        }
    }
}
