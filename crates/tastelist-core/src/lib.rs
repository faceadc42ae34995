pub mod config;
pub mod entry;
pub mod parser;
pub mod resolution;

pub use config::{BulkAddConfig, ConfigError, RetryPolicy};
pub use entry::{Candidate, DraftEntry, EntryField, FieldOrder, ResolvedDetails};
pub use parser::{AnomalyReason, ParseAnomaly, ParseReport, parse, parse_report};
pub use resolution::{FailureKind, Resolution, ResolutionState, ResolutionStatus};
