//! The CPUID operations themselves. Nothing here keeps state between calls.

use crate::arch::cpuid::{cpuid_count, has_cpuid};
use crate::cpu_set::{self, LogicalCpuId};
use crate::error::Result;
use crate::leaves::KNOWN_LEAVES;
use crate::record::CpuIdRecord;

/// Executes CPUID for `leaf`/`subleaf` on the current processor.
///
/// The selectors are not validated; processors answer unsupported leaves
/// with zeroes or with the data of their highest leaf.
pub fn execute(leaf: u32, subleaf: u32) -> CpuIdRecord {
    CpuIdRecord::new(leaf, subleaf, cpuid_count(leaf, subleaf))
}

/// Whether this processor implements CPUID at all.
///
/// Only legacy 32-bit processors lack it. Check once before calling
/// [`execute`] or the dump functions on such hardware.
pub fn is_supported() -> bool {
    has_cpuid()
}

/// Captures every known leaf on the current processor.
pub fn dump() -> Vec<CpuIdRecord> {
    let records: Vec<_> = KNOWN_LEAVES
        .iter()
        .map(|leaf| execute(leaf.leaf, leaf.subleaf))
        .collect();
    log::debug!("dumped {} cpuid leaves", records.len());
    records
}

/// Captures known leaves into `records`, in order, until either runs out.
///
/// Returns how many records were written. A short slice truncates the dump.
pub fn dump_into(records: &mut [CpuIdRecord]) -> usize {
    let mut written = 0;
    for (slot, leaf) in records.iter_mut().zip(KNOWN_LEAVES) {
        *slot = execute(leaf.leaf, leaf.subleaf);
        written += 1;
    }
    if written < KNOWN_LEAVES.len() {
        log::debug!(
            "cpuid dump truncated to {} of {} leaves",
            written,
            KNOWN_LEAVES.len()
        );
    }
    written
}

/// Like [`dump`], with every leaf executed on `cpu`.
pub fn dump_on_core(cpu: LogicalCpuId) -> Result<Vec<CpuIdRecord>> {
    cpu_set::run_on(cpu, dump)
}

/// Like [`dump_into`], with every leaf executed on `cpu`.
///
/// Fails without writing anything when `cpu` is not a logical processor this
/// process may run on.
pub fn dump_into_on_core(records: &mut [CpuIdRecord], cpu: LogicalCpuId) -> Result<usize> {
    cpu_set::run_on(cpu, || dump_into(records))
}
