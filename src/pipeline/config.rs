use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Configuration for a split run
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// First character of every header line
    pub header_char: char,
    pub delimiter: String,
    /// 0-based header fields that make up the group key, in key order
    pub field_indices: Vec<usize>,
    pub join_separator: String,
    pub file_prefix: String,
    pub file_suffix: String,
    pub output_dir: PathBuf,
    pub mode: ExecutionMode,
    /// Capacity of input and output buffers, in bytes
    pub buffer_size: usize,
    /// Log progress every N lines; 0 disables it
    pub progress_interval: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            header_char: '@',
            delimiter: ":".to_string(),
            field_indices: vec![2, 3], // flow cell, lane
            join_separator: ".".to_string(),
            file_prefix: String::new(),
            file_suffix: ".fastq".to_string(),
            output_dir: PathBuf::from("."),
            mode: ExecutionMode::Sequential,
            buffer_size: 65536, // 64KB
            progress_interval: 0,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.field_indices.is_empty() {
            return Err(ConfigError::NoFieldIndices);
        }
        if self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        if let ExecutionMode::Pipelined { queue_capacity: 0 } = self.mode {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        Ok(())
    }

    /// Output file name for a group key: `prefix + key + suffix`
    pub fn output_file_name(&self, key: &str) -> String {
        format!("{}{}{}", self.file_prefix, key, self.file_suffix)
    }

    pub fn output_path(&self, key: &str) -> PathBuf {
        self.output_dir.join(self.output_file_name(key))
    }
}

/// How lines get from the input to the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Read and route on the calling thread
    Sequential,
    /// Read on a separate thread, handing lines over through a bounded queue
    Pipelined { queue_capacity: usize },
}

impl ExecutionMode {
    pub fn pipelined() -> Self {
        ExecutionMode::Pipelined {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
