// src/pipeline.rs
pub mod config;
pub mod context;
pub mod key;
pub mod registry;
pub mod router;
pub mod stream;

pub use config::{ExecutionMode, SplitConfig};
pub use context::{GroupSummary, SplitStats};
pub use key::{extract_key, KeyExtractor};
pub use registry::{CreateSinkWriter, Sink, SinkRegistry};
pub use router::{Router, RouterState};
pub use stream::SplitPipeline;
