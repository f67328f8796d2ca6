//! bestnr_supervisor
//!
//! Outside-world facing layer for `bestnr_core`.
//!
//! Responsibilities:
//! - typed trigger source / record sink traits, with CSV implementations
//! - chunked (optionally parallel) batch scoring
//! - JSON config loading
//!
//! Non-goals:
//! - no statistic logic (lives in core)
//! - no HDF5

pub mod adapter;
pub mod config;
pub mod csv_io;
pub mod error;
pub mod supervisor;

pub use adapter::{
    DetectorLayout,
    RecordSink,
    ScoredTrigger,
    TriggerRecord,
    TriggerSource,
};

pub use config::{cfg_from_reader, load_cfg};
pub use csv_io::{output_header, CsvRecordSink, CsvTriggerSource};
pub use error::{SupervisorError, SupervisorResult};

pub use supervisor::{
    BatchStats,
    BestNrSupervisor,
    DEFAULT_CHUNK,
};
