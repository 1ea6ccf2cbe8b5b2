use indexmap::map::Entry;
use indexmap::IndexMap;
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SplitError;
use crate::pipeline::config::SplitConfig;
use crate::pipeline::context::GroupSummary;

/// Opens the destination for a new sink. The registry adds the output buffer.
pub type CreateSinkWriter = fn(&Path) -> io::Result<Box<dyn Write>>;

/// Create-or-truncate, like `File::create`.
pub fn default_create_sink_writer(path: &Path) -> io::Result<Box<dyn Write>> {
    Ok(Box::new(File::create(path)?))
}

/// A buffered output file owned by exactly one group.
pub struct Sink {
    path: PathBuf,
    writer: BufWriter<Box<dyn Write>>,
    lines_written: usize,
}

impl Sink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    pub fn write_line(&mut self, line: &str) -> Result<(), SplitError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| SplitError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.lines_written += 1;
        Ok(())
    }

    /// Flush buffered data and release the handle.
    fn close(mut self) -> Result<(), SplitError> {
        self.writer.flush().map_err(|source| SplitError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Group key to sink mapping. Sinks are opened on first use and stay open
/// until [`SinkRegistry::close_all`].
pub struct SinkRegistry {
    config: SplitConfig,
    create_sink_writer: CreateSinkWriter,
    sinks: IndexMap<String, Sink>,
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("output_dir", &self.config.output_dir)
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SinkRegistry {
    pub fn new(config: SplitConfig) -> Self {
        SinkRegistry {
            config,
            create_sink_writer: default_create_sink_writer,
            sinks: IndexMap::new(),
        }
    }

    /// Replace how sink destinations are opened.
    pub fn on_create_sink(mut self, f: CreateSinkWriter) -> Self {
        self.create_sink_writer = f;
        self
    }

    /// Return the sink for `key`, opening it if this is the first time the key is seen.
    ///
    /// An existing sink is returned as-is: it is never reopened or truncated.
    pub fn get_or_create(&mut self, key: &str) -> Result<&mut Sink, SplitError> {
        // Avoid allocating the key on the hot path
        if let Some(index) = self.sinks.get_index_of(key) {
            return Ok(&mut self.sinks[index]);
        }

        match self.sinks.entry(key.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let path = self.config.output_path(key);
                let inner = (self.create_sink_writer)(&path).map_err(|source| {
                    SplitError::OutputOpen {
                        path: path.clone(),
                        source,
                    }
                })?;
                debug!("opened {} for group '{}'", path.display(), key);

                Ok(e.insert(Sink {
                    path,
                    writer: BufWriter::with_capacity(self.config.buffer_size, inner),
                    lines_written: 0,
                }))
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sinks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Flush and close every sink, in the order the groups were first seen.
    ///
    /// All sinks are closed even if one fails; the first failure is returned.
    pub fn close_all(self) -> Result<Vec<GroupSummary>, SplitError> {
        let mut summaries = Vec::with_capacity(self.sinks.len());
        let mut first_error = None;

        for (key, sink) in self.sinks {
            let summary = GroupSummary {
                key,
                path: sink.path.clone(),
                lines_written: sink.lines_written,
            };
            if let Err(e) = sink.close() {
                first_error.get_or_insert(e);
            }
            summaries.push(summary);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }
}
