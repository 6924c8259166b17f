use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cpu_set::LogicalCpuId;

pub type Result<T, E = ProbeError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("logical processor {0} does not exist or is not available to this process")]
    InvalidCore(LogicalCpuId),
    #[error("the set of available logical processors could not be determined")]
    CoreEnumeration,
    #[error("failed to pin the dump to logical processor {0}")]
    PinFailed(LogicalCpuId),
    #[error("failed to start the pinned worker thread")]
    Spawn(#[source] io::Error),
    #[error("the pinned worker thread panicked")]
    WorkerPanicked,
}

/// Failure to load a saved register document.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed register document")]
    Xml(#[from] roxmltree::Error),
    #[error("expected a <cpuid> document, found <{0}>")]
    NotCpuid(String),
    #[error("register on line {line} has no {attribute} attribute")]
    MissingAttribute { line: u32, attribute: &'static str },
    #[error("register on line {line}: {value:?} is not a 32-bit hex number")]
    BadNumber { line: u32, value: String },
    #[error("register on line {line} has {count} values, expected 4")]
    RegisterCount { line: u32, count: usize },
}
