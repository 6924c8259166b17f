//! Exported C ABI.
//!
//! Foreign callers get the same operations as Rust callers, with results
//! passed through out-pointers and caller-sized buffers. Every export
//! reports failure through its return value and never unwinds into the
//! caller.

use core::ffi::c_int;
use std::panic::{self, UnwindSafe};

use crate::cpu_set::LogicalCpuId;
use crate::leaves::KNOWN_LEAVES;
use crate::probe;
use crate::record::{max_records, CpuIdRecord};

/// Returned by `iddumponcore` when the core is invalid or can't be pinned.
pub const DUMP_FAILED: c_int = -1;

fn guarded<T, F>(on_panic: T, f: F) -> T
where
    F: FnOnce() -> T + UnwindSafe,
{
    crate::log::init_logger();
    panic::catch_unwind(f).unwrap_or_else(|_| {
        log::error!("panic caught at the foreign boundary");
        on_panic
    })
}

unsafe fn store(out: *mut u32, value: u32) {
    if !out.is_null() {
        out.write_unaligned(value);
    }
}

/// Copies `records` to `info`, which may be unaligned.
unsafe fn copy_out(info: *mut CpuIdRecord, records: &[CpuIdRecord]) -> c_int {
    for (i, record) in records.iter().enumerate() {
        info.add(i).write_unaligned(*record);
    }
    records.len() as c_int
}

/// Executes CPUID for `eax`/`ecx` and stores the output registers.
///
/// Null output pointers are skipped. Returns zero on success.
///
/// # Safety
///
/// Each non-null pointer must be valid for a 4 byte write.
#[no_mangle]
pub unsafe extern "system" fn cpuid(
    eax: u32,
    ecx: u32,
    peax: *mut u32,
    pebx: *mut u32,
    pecx: *mut u32,
    pedx: *mut u32,
) -> c_int {
    guarded(1, || {
        let record = probe::execute(eax, ecx);
        store(peax, record.eax);
        store(pebx, record.ebx);
        store(pecx, record.ecx);
        store(pedx, record.edx);
        0
    })
}

/// Returns non-zero if this processor supports the CPUID instruction.
#[no_mangle]
pub extern "system" fn hascpuid() -> c_int {
    guarded(0, || probe::is_supported() as c_int)
}

/// Dumps the known CPUID leaves of the current core into `info`.
///
/// Writes at most `bytes / size_of::<CpuIdRecord>()` records and returns
/// how many were written. A null `info` writes nothing.
///
/// # Safety
///
/// `info` must be null or valid for writes of `bytes` bytes.
#[no_mangle]
pub unsafe extern "system" fn iddump(info: *mut CpuIdRecord, bytes: usize) -> c_int {
    if info.is_null() {
        return 0;
    }
    guarded(0, || {
        let mut scratch = [CpuIdRecord::default(); KNOWN_LEAVES.len()];
        let capacity = max_records(bytes).min(scratch.len());
        let written = probe::dump_into(&mut scratch[..capacity]);
        copy_out(info, &scratch[..written])
    })
}

/// Dumps the known CPUID leaves of logical processor `core` into `info`.
///
/// Same buffer contract as [`iddump`]. Returns [`DUMP_FAILED`] without
/// touching `info` if `core` is negative, doesn't exist, or can't be
/// pinned. The calling thread's affinity is left unchanged.
///
/// # Safety
///
/// `info` must be null or valid for writes of `bytes` bytes.
#[no_mangle]
pub unsafe extern "system" fn iddumponcore(
    info: *mut CpuIdRecord,
    bytes: usize,
    core: c_int,
) -> c_int {
    let Ok(core) = u32::try_from(core) else {
        return DUMP_FAILED;
    };
    guarded(DUMP_FAILED, move || {
        let mut scratch = [CpuIdRecord::default(); KNOWN_LEAVES.len()];
        let capacity = if info.is_null() {
            0
        } else {
            max_records(bytes).min(scratch.len())
        };
        match probe::dump_into_on_core(&mut scratch[..capacity], LogicalCpuId::new(core)) {
            Ok(written) => copy_out(info, &scratch[..written]),
            Err(e) => {
                log::debug!("iddumponcore({}): {}", core, e);
                DUMP_FAILED
            }
        }
    })
}
