pub mod classifier;
pub mod config;
pub mod correlator;
pub mod dsn;
pub mod error;
pub mod export;
pub mod extractor;
pub mod patterns;
pub mod runner;
pub mod source;
pub mod statistics;
pub mod timestamp;
pub mod types;

pub use config::{Config, CorrelationScope};
pub use correlator::{CorrelationReport, CorrelationStats, Correlator};
pub use dsn::{DsnPolicy, ReasonTable};
pub use error::LineError;
pub use runner::Runner;
pub use statistics::RunStatistics;
pub use types::{BounceRecord, TransactionId};
