//! vnpatch - visual novel script translator.
//!
//! This library provides functionality for:
//! - Protecting bracketed markup tokens while script lines are translated
//! - Caching translations persistently across runs
//! - Translating or copying a whole game tree with a bounded worker pool
//! - Handing the result to an external archive packager

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod packager;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod translator;
pub mod utils;

// Re-export commonly used types
pub use backend::{GoogleBackend, TranslationBackend};
pub use cache::TranslationCache;
pub use config::Config;
pub use console::Console;
pub use error::{
    CacheError, CodecError, ConfigError, PackagingError, PipelineError, ProcessError,
    TranslationError,
};
pub use packager::Packager;
pub use pipeline::{Pipeline, RunSummary};
pub use processor::{FileJob, FileProcessor, FileReport};
pub use progress::Progress;
pub use translator::{Outcome, Translator};
