// src/pipeline/stream.rs
use crossbeam::channel::{self, Receiver, Sender};
use log::debug;
use std::io::BufRead;
use std::thread;

use crate::error::SplitError;
use crate::input_format::LineSource;
use crate::pipeline::config::{ExecutionMode, SplitConfig};
use crate::pipeline::context::SplitStats;
use crate::pipeline::registry::{default_create_sink_writer, CreateSinkWriter, SinkRegistry};
use crate::pipeline::router::Router;

/// Runs one split pass over an input, sequentially or with a reader thread.
pub struct SplitPipeline {
    config: SplitConfig,
    create_sink_writer: CreateSinkWriter,
}

impl SplitPipeline {
    pub fn new(config: SplitConfig) -> Self {
        SplitPipeline {
            config,
            create_sink_writer: default_create_sink_writer,
        }
    }

    /// Replace how output files are opened (see [`SinkRegistry::on_create_sink`]).
    pub fn on_create_sink(mut self, f: CreateSinkWriter) -> Self {
        self.create_sink_writer = f;
        self
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    fn router(&self) -> Router {
        let registry =
            SinkRegistry::new(self.config.clone()).on_create_sink(self.create_sink_writer);
        Router::with_registry(&self.config, registry)
    }

    /// Split `input` using the configured execution mode.
    pub fn run<R: BufRead + Send>(&self, input: R) -> Result<SplitStats, SplitError> {
        match self.config.mode {
            ExecutionMode::Sequential => self.run_sequential(input),
            ExecutionMode::Pipelined { queue_capacity } => self.run_pipelined(input, queue_capacity),
        }
    }

    /// Read and route on the calling thread.
    pub fn run_sequential<R: BufRead>(&self, input: R) -> Result<SplitStats, SplitError> {
        let mut router = self.router();

        for line in LineSource::new(input) {
            if let Err(e) = line.and_then(|line| router.route(&line)) {
                router.abort();
                return Err(e);
            }
        }

        router.finish()
    }

    /// Read on a scoped thread and route on the calling thread. The two are
    /// joined by a bounded queue, so a slow router stalls the reader instead
    /// of letting lines pile up in memory.
    pub fn run_pipelined<R: BufRead + Send>(
        &self,
        input: R,
        queue_capacity: usize,
    ) -> Result<SplitStats, SplitError> {
        let (sender, receiver) = channel::bounded(queue_capacity);
        let mut router = self.router();

        let (routed, read) = thread::scope(|scope| {
            let reader = scope.spawn(move || read_lines(input, sender));
            let routed = route_lines(&mut router, receiver);
            // Always wait for the reader, even when routing failed
            let read = reader.join().unwrap_or(Err(SplitError::ReaderPanicked));
            (routed, read)
        });

        match (routed, read) {
            (Ok(()), Ok(())) => router.finish(),
            (Err(e), _) | (Ok(()), Err(e)) => {
                router.abort();
                Err(e)
            }
        }
    }
}

/// Reader side. Returning drops `queue`, which tells the router no more lines are coming.
fn read_lines<R: BufRead>(input: R, queue: Sender<String>) -> Result<(), SplitError> {
    let mut source = LineSource::new(input);

    for line in source.by_ref() {
        if queue.send(line?).is_err() {
            // Router is gone; it reports its own error
            debug!("router stopped, reader exiting early");
            return Ok(());
        }
    }

    debug!("reader finished after {} lines", source.line_number());
    Ok(())
}

/// Router side. Runs until the queue is empty and closed. Returning drops
/// `queue`, which unblocks a reader waiting on a full queue.
fn route_lines(router: &mut Router, queue: Receiver<String>) -> Result<(), SplitError> {
    for line in queue.iter() {
        router.route(&line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{self, Cursor, Read};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, mode: ExecutionMode) -> SplitConfig {
        SplitConfig {
            output_dir: dir.path().to_path_buf(),
            mode,
            ..Default::default()
        }
    }

    const MODES: [ExecutionMode; 2] = [
        ExecutionMode::Sequential,
        ExecutionMode::Pipelined { queue_capacity: 2 },
    ];

    #[test]
    fn test_config_is_kept() {
        let dir = TempDir::new().unwrap();
        let pipeline = SplitPipeline::new(config_in(&dir, ExecutionMode::pipelined()));
        assert_eq!(pipeline.config().mode, ExecutionMode::pipelined());
        assert_eq!(pipeline.config().output_dir, dir.path());
    }

    /// Yields one header line, then panics on the next read
    struct PanickingReader {
        header: Cursor<&'static [u8]>,
    }

    impl Read for PanickingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.fill_buf()?;
            self.header.read(buf)
        }
    }

    impl BufRead for PanickingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.header.position() as usize >= self.header.get_ref().len() {
                panic!("input device went away");
            }
            self.header.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.header.consume(amt)
        }
    }

    #[test]
    fn test_reader_panic_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = PanickingReader {
            header: Cursor::new(&b"@I:1:FC1:3\n"[..]),
        };

        let err = SplitPipeline::new(config_in(
            &dir,
            ExecutionMode::Pipelined { queue_capacity: 1 },
        ))
        .run(input)
        .unwrap_err();

        assert!(matches!(err, SplitError::ReaderPanicked), "{:?}", err);
        // Lines handed over before the panic were still written
        assert_eq!(
            fs::read_to_string(dir.path().join("FC1.3.fastq")).unwrap(),
            "@I:1:FC1:3\n"
        );
    }

    #[test]
    fn test_empty_input_creates_nothing() {
        for mode in MODES {
            let dir = TempDir::new().unwrap();
            let stats = SplitPipeline::new(config_in(&dir, mode))
                .run(Cursor::new(""))
                .unwrap();
            assert_eq!(stats.lines_read, 0);
            assert_eq!(stats.group_count(), 0);
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_read_error_keeps_earlier_lines() {
        for mode in MODES {
            let dir = TempDir::new().unwrap();
            let data: &[u8] = b"@I:1:FC1:3\nACGT\n\xff\nIIII\n";

            let err = SplitPipeline::new(config_in(&dir, mode))
                .run(Cursor::new(data))
                .unwrap_err();
            assert!(
                matches!(err, SplitError::Read { line_number: 2, .. }),
                "{:?}: {:?}",
                mode,
                err
            );

            let content = fs::read_to_string(dir.path().join("FC1.3.fastq")).unwrap();
            assert_eq!(content, "@I:1:FC1:3\nACGT\n");
        }
    }

    #[test]
    fn test_router_error_stops_blocked_reader() {
        let dir = TempDir::new().unwrap();
        // Far more lines than the queue holds, so the reader is blocked when the router fails
        let mut input = String::from("no header here\n");
        for i in 0..10_000 {
            input.push_str(&format!("line {}\n", i));
        }

        let err = SplitPipeline::new(config_in(
            &dir,
            ExecutionMode::Pipelined { queue_capacity: 1 },
        ))
        .run(Cursor::new(input))
        .unwrap_err();

        assert!(matches!(err, SplitError::RoutingBeforeHeader { line_number: 1, .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_header_aborts_run() {
        for mode in MODES {
            let dir = TempDir::new().unwrap();
            let err = SplitPipeline::new(config_in(&dir, mode))
                .run(Cursor::new("@I:1:FC1:3\nACGT\n@bad\n"))
                .unwrap_err();
            assert!(matches!(err, SplitError::MalformedHeader { line_number: 3, .. }));
            assert_eq!(
                fs::read_to_string(dir.path().join("FC1.3.fastq")).unwrap(),
                "@I:1:FC1:3\nACGT\n"
            );
        }
    }
}
