//! # cpuid-probe
//!
//! Exposes the x86 CPUID instruction to Rust callers and, through the
//! exports in [`ffi`], to anything that can load a shared library.
//!
//! ```no_run
//! let vendor = cpuid_probe::execute(0, 0);
//! let records = cpuid_probe::dump();
//! println!("{} leaves, first {}", records.len(), vendor);
//! ```

/// Architecture-dependent stuff
mod arch;

/// Logical processors and pinning
pub mod cpu_set;

pub mod error;

/// Text and XML renderings of a dump, and loading them back
pub mod export;

pub mod features;

/// Exported C ABI
pub mod ffi;

/// The leaves captured by a dump
pub mod leaves;

/// Logger setup
pub mod log;

mod probe;

pub mod record;

/// Decoded processor identification
pub mod summary;

pub use crate::cpu_set::LogicalCpuId;
pub use crate::error::{ImportError, ProbeError, Result};
pub use crate::features::CpuFeatures;
pub use crate::probe::{dump, dump_into, dump_into_on_core, dump_on_core, execute, is_supported};
pub use crate::record::{CpuIdRecord, RECORD_SIZE};
pub use crate::summary::CpuSummary;
