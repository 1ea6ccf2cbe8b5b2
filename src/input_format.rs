// src/input_format.rs - opening the input and turning it into lines

use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::SplitError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// Gzip when the file name ends in `.gz`, plain text otherwise
    #[default]
    #[value(name = "auto")]
    Auto,
    #[value(name = "plain")]
    Plain,
    #[value(name = "gzip")]
    Gzip,
}

impl InputFormat {
    /// Decide between `Plain` and `Gzip` for an input path (`None` is stdin).
    pub fn resolve(self, path: Option<&Path>) -> InputFormat {
        match self {
            InputFormat::Auto => match path {
                Some(p) if p.extension().is_some_and(|ext| ext == "gz") => InputFormat::Gzip,
                _ => InputFormat::Plain,
            },
            explicit => explicit,
        }
    }
}

pub type InputReader = Box<dyn BufRead + Send>;

/// Treat `-` as standard input, like most command line tools.
pub fn input_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.as_os_str() != "-")
}

/// Open the input for reading; `None` or `-` reads stdin.
pub fn open_input(
    path: Option<&Path>,
    format: InputFormat,
    buffer_size: usize,
) -> Result<InputReader, SplitError> {
    let path = input_path(path);
    let format = format.resolve(path);

    let raw: InputReader = match path {
        Some(p) => {
            let file = File::open(p).map_err(|source| SplitError::InputOpen {
                path: p.to_path_buf(),
                source,
            })?;
            Box::new(BufReader::with_capacity(buffer_size, file))
        }
        None => Box::new(BufReader::with_capacity(buffer_size, io::stdin())),
    };

    Ok(match format {
        InputFormat::Gzip => Box::new(BufReader::with_capacity(
            buffer_size,
            MultiGzDecoder::new(raw),
        )),
        _ => raw,
    })
}

/// Lines of the input with their terminators stripped, numbered from 1.
///
/// The first read failure is yielded as an error and ends the sequence.
pub struct LineSource<R> {
    lines: Lines<R>,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        LineSource {
            lines: reader.lines(),
            line_number: 0,
            done: false,
        }
    }

    /// Number of lines yielded so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String, SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_number += 1;
                Some(Ok(line))
            }
            Some(Err(source)) => {
                self.done = true;
                Some(Err(SplitError::Read {
                    line_number: self.line_number,
                    source,
                }))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
