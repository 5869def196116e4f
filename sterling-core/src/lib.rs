//! sterling-core: profiles, records, and classification for bank
//! statement extraction.

pub mod classify;
pub mod error;
pub mod event;
pub mod profile;
pub mod transaction;

pub use classify::{Classification, classify, classify_with_profile};
pub use error::ExtractError;
pub use event::{
    CollectSink, EventSink, ExtractEvent, ExtractionMethod, LogSink, NullSink, PipelineState,
};
pub use profile::{AmountPick, DescriptionPolicy, Profile, all_profiles, profile, type_code_name};
pub use transaction::{ExtractionResult, FlowKind, Transaction};
