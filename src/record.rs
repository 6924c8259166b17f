use core::fmt;
use core::mem::{align_of, size_of};

use raw_cpuid::CpuIdResult;

/// Results of a single CPUID call, along with the selectors that produced it.
///
/// The layout is shared with foreign callers, who size their buffers by
/// dividing a byte count by [`RECORD_SIZE`], so it must stay six tightly
/// packed `u32`s.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CpuIdRecord {
    /// The CPUID leaf called (EAX input).
    pub leaf: u32,
    /// The CPUID sub-leaf called (ECX input).
    pub subleaf: u32,
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

pub const RECORD_SIZE: usize = size_of::<CpuIdRecord>();

const _: () = assert!(RECORD_SIZE == 24);
const _: () = assert!(align_of::<CpuIdRecord>() == 4);

/// Number of whole records that fit into `bytes`.
pub const fn max_records(bytes: usize) -> usize {
    bytes / RECORD_SIZE
}

impl CpuIdRecord {
    pub const fn new(leaf: u32, subleaf: u32, result: CpuIdResult) -> Self {
        Self {
            leaf,
            subleaf,
            eax: result.eax,
            ebx: result.ebx,
            ecx: result.ecx,
            edx: result.edx,
        }
    }

    pub const fn selects(&self, leaf: u32, subleaf: u32) -> bool {
        self.leaf == leaf && self.subleaf == subleaf
    }

    pub const fn result(&self) -> CpuIdResult {
        CpuIdResult {
            eax: self.eax,
            ebx: self.ebx,
            ecx: self.ecx,
            edx: self.edx,
        }
    }

    /// The output registers in EAX, EBX, ECX, EDX order.
    pub const fn registers(&self) -> [u32; 4] {
        [self.eax, self.ebx, self.ecx, self.edx]
    }
}

impl fmt::Display for CpuIdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPUID(EAX={:08X}h,ECX={:08X}h) = {:08X} {:08X} {:08X} {:08X}",
            self.leaf, self.subleaf, self.eax, self.ebx, self.ecx, self.edx
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_whole_records() {
        assert_eq!(max_records(0), 0);
        assert_eq!(max_records(RECORD_SIZE - 1), 0);
        assert_eq!(max_records(RECORD_SIZE), 1);
        assert_eq!(max_records(RECORD_SIZE * 3 + 5), 3);
    }

    #[test]
    fn display_uses_fixed_width_hex() {
        // Given
        let record = CpuIdRecord {
            leaf: 0x8000_0001,
            subleaf: 0,
            eax: 0xa,
            ebx: 0,
            ecx: 0x121,
            edx: 0x2c10_0800,
        };

        // Then
        assert_eq!(
            record.to_string(),
            "CPUID(EAX=80000001h,ECX=00000000h) = 0000000A 00000000 00000121 2C100800"
        );
    }
}
