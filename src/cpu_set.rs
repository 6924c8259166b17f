use core::fmt;
#[cfg(all(feature = "multi_core", any(target_os = "linux", target_os = "windows")))]
use std::thread;

use crate::error::{ProbeError, Result};

/// A logical processor, numbered the way the operating system numbers them.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LogicalCpuId(u32);

impl LogicalCpuId {
    pub const fn new(inner: u32) -> Self {
        Self(inner)
    }
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LogicalCpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[logical cpu #{}]", self.0)
    }
}
impl fmt::Display for LogicalCpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logical processors the calling thread is allowed to run on.
#[cfg(feature = "multi_core")]
pub fn available() -> Result<Vec<LogicalCpuId>> {
    let cores = core_affinity::get_core_ids().ok_or(ProbeError::CoreEnumeration)?;
    Ok(cores
        .into_iter()
        .filter_map(|core| u32::try_from(core.id).ok().map(LogicalCpuId::new))
        .collect())
}

#[cfg(not(feature = "multi_core"))]
pub fn available() -> Result<Vec<LogicalCpuId>> {
    Err(ProbeError::CoreEnumeration)
}

/// Runs `f` on `cpu` and returns its result.
///
/// The work happens on a scoped worker thread that is pinned to `cpu` and
/// joined before returning. Affinity is a per-thread property on Linux and
/// Windows, so the caller's own mask is never changed, whichever way this
/// returns. Elsewhere affinity is at most a scheduling hint, and this fails
/// with [`ProbeError::PinFailed`].
#[cfg(all(feature = "multi_core", any(target_os = "linux", target_os = "windows")))]
pub fn run_on<T, F>(cpu: LogicalCpuId, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    let core = core_affinity::get_core_ids()
        .ok_or(ProbeError::CoreEnumeration)?
        .into_iter()
        .find(|core| core.id == cpu.get() as usize)
        .ok_or(ProbeError::InvalidCore(cpu))?;

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name(format!("cpuid-probe-{}", cpu.get()))
            .spawn_scoped(scope, move || {
                if !core_affinity::set_for_current(core) {
                    return Err(ProbeError::PinFailed(cpu));
                }
                log::trace!("worker pinned to {:?}", cpu);
                Ok(f())
            })
            .map_err(ProbeError::Spawn)?;

        worker.join().map_err(|_| ProbeError::WorkerPanicked)?
    })
}

#[cfg(not(all(feature = "multi_core", any(target_os = "linux", target_os = "windows"))))]
pub fn run_on<T, F>(cpu: LogicalCpuId, _f: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    log::warn!("pinning to {:?} is not supported by this build", cpu);
    Err(ProbeError::PinFailed(cpu))
}
