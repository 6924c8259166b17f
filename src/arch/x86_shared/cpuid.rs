#[cfg(target_arch = "x86")]
use core::arch::x86::__cpuid_count;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::__cpuid_count;

use raw_cpuid::{CpuIdReader, CpuIdResult};

/// Executes CPUID on the current processor with `leaf` in EAX and `subleaf` in ECX.
#[inline]
#[allow(unused_unsafe)]
pub fn cpuid_count(leaf: u32, subleaf: u32) -> CpuIdResult {
    // Callers are expected to have checked `has_cpuid` on hardware where it may be missing.
    let result = unsafe { __cpuid_count(leaf, subleaf) };
    CpuIdResult {
        eax: result.eax,
        ebx: result.ebx,
        ecx: result.ecx,
        edx: result.edx,
    }
}

/// Reads CPUID straight from the processor the calling thread runs on.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiveReader;

impl CpuIdReader for LiveReader {
    fn cpuid2(&self, eax: u32, ecx: u32) -> CpuIdResult {
        cpuid_count(eax, ecx)
    }
}

/// Checks whether the ID flag (bit 21) of the flags register can be toggled,
/// which is how the processor advertises that CPUID exists.
#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
pub fn has_cpuid() -> bool {
    use x86::bits64::rflags::{self, RFlags};

    unsafe {
        let original = rflags::read();
        let mut toggled = original;
        toggled.toggle(RFlags::FLAGS_ID);
        rflags::set(toggled);
        let observed = rflags::read();
        rflags::set(original);

        observed.contains(RFlags::FLAGS_ID) != original.contains(RFlags::FLAGS_ID)
    }
}

/// Checks whether the ID flag (bit 21) of the flags register can be toggled,
/// which is how the processor advertises that CPUID exists.
#[cfg(target_arch = "x86")]
#[allow(unused_unsafe)]
pub fn has_cpuid() -> bool {
    use x86::bits32::eflags::{self, EFlags};

    unsafe {
        let original = eflags::read();
        let mut toggled = original;
        toggled.toggle(EFlags::FLAGS_ID);
        eflags::set(toggled);
        let observed = eflags::read();
        eflags::set(original);

        observed.contains(EFlags::FLAGS_ID) != original.contains(EFlags::FLAGS_ID)
    }
}
