//! Named feature flags from the standard, processor state and extended
//! feature leaves.

use core::fmt;
use std::collections::BTreeMap;

use raw_cpuid::{CpuIdReader, CpuIdResult};

use crate::arch::cpuid::LiveReader;
use crate::leaves::{
    EXTENDED_FEATURES, EXTENDED_FUNCTION, EXTENDED_INFORMATION, EXTENDED_PROCESSOR_STATE,
    FEATURE_INFORMATION, VENDOR_ID,
};
use crate::record::CpuIdRecord;
use crate::summary::RecordedReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    Eax,
    Ebx,
    Ecx,
    Edx,
}

impl Register {
    pub const fn select(self, result: CpuIdResult) -> u32 {
        match self {
            Register::Eax => result.eax,
            Register::Ebx => result.ebx,
            Register::Ecx => result.ecx,
            Register::Edx => result.edx,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Register::Eax => "EAX",
            Register::Ebx => "EBX",
            Register::Ecx => "ECX",
            Register::Edx => "EDX",
        })
    }
}

/// Bit names of one output register. An empty name marks a reserved bit.
struct FlagRegister {
    leaf: u32,
    subleaf: u32,
    register: Register,
    names: [&'static str; 32],
    /// Bits that hold a field rather than flags.
    ignored: u32,
}

const FLAG_REGISTERS: &[FlagRegister] = &[
    FlagRegister {
        leaf: FEATURE_INFORMATION,
        subleaf: 0,
        register: Register::Ecx,
        names: [
            "SSE3", "PCLMULQDQ", "DTES64", "MONITOR", "DS-CPL", "VMX", "SMX", "EIST",
            "TM2", "SSSE3", "CNXT-ID", "SDBG", "FMA", "CMPXCHG16B", "xTPR", "PDCM",
            "", "PCID", "DCA", "SSE4.1", "SSE4.2", "x2APIC", "MOVBE", "POPCNT",
            "TSC-DEADLINE", "AESNI", "XSAVE", "OSXSAVE", "AVX", "F16C", "RDRAND", "HYPERVISOR",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: FEATURE_INFORMATION,
        subleaf: 0,
        register: Register::Edx,
        names: [
            "FPU", "VME", "DE", "PSE", "TSC", "MSR", "PAE", "MCE",
            "CX8", "APIC", "", "SEP", "MTRR", "PGE", "MCA", "CMOV",
            "PAT", "PSE-36", "PSN", "CLFSH", "", "DS", "ACPI", "MMX",
            "FXSR", "SSE", "SSE2", "SS", "HTT", "TM", "IA64", "PBE",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: EXTENDED_FEATURES,
        subleaf: 0,
        register: Register::Ebx,
        names: [
            "FSGSBASE", "IA32_TSC_ADJUST", "SGX", "BMI1", "HLE", "AVX2", "FDP_EXCPTN_ONLY", "SMEP",
            "BMI2", "ERMS", "INVPCID", "RTM", "RDT-M", "FPU-CS Dep", "MPX", "RDT-A",
            "AVX512F", "AVX512DQ", "RDSEED", "ADX", "SMAP", "AVX512_IFMA", "", "CLFLUSHOPT",
            "CLWB", "INTEL_PT", "AVX512PF", "AVX512ER", "AVX512CD", "SHA", "AVX512BW", "AVX512VL",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: EXTENDED_FEATURES,
        subleaf: 0,
        register: Register::Ecx,
        names: [
            "PREFETCHWT1", "AVX512_VBMI", "UMIP", "PKU", "OSPKE", "WAITPKG", "AVX512_VBMI2", "CET_SS",
            "GFNI", "VAES", "VPCLMULQDQ", "AVX512_VNNI", "AVX512_BITALG", "", "AVX512_POPCNTDQ", "5L_PAGE",
            "", "", "", "", "", "", "RDPID", "",
            "", "CLDEMOTE", "", "MOVDIRI", "MOVDIR64B", "ENQCMD", "SGX_LC", "PKS",
        ],
        // MAWAU, the BNDLDX/BNDSTX address width adjust
        ignored: 0x003E_0000,
    },
    FlagRegister {
        leaf: EXTENDED_FEATURES,
        subleaf: 0,
        register: Register::Edx,
        names: [
            "", "", "AVX512_4NNIW", "AVX512_4FMAPS", "FSRM", "", "", "",
            "AVX512_VP2INTERSECT", "SRBDS_CTRL", "MD_CLEAR", "", "", "TSX_FORCE_ABORT", "SERIALIZE", "Hybrid",
            "TSXLDTRK", "", "PCONFIG", "LBR", "CET_IBT", "", "AMX_BF16", "",
            "AMX_TILE", "AMX_INT8", "IBRS_IBPB", "STIBP", "L1D_FLUSH", "IA32_ARCH_CAPABILITIES", "IA32_CORE_CAPABILITIES", "SSBD",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: EXTENDED_PROCESSOR_STATE,
        subleaf: 1,
        register: Register::Eax,
        names: [
            "XSAVEOPT", "XSAVEC", "XGETBV", "XSAVES", "", "", "", "",
            "", "", "", "", "", "", "", "",
            "", "", "", "", "", "", "", "",
            "", "", "", "", "", "", "", "",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: EXTENDED_INFORMATION,
        subleaf: 0,
        register: Register::Ecx,
        names: [
            "AHF64", "", "", "", "", "ABM", "", "",
            "PREFETCHW", "", "", "", "", "", "", "",
            "", "", "", "", "", "", "", "",
            "", "", "", "", "", "", "", "",
        ],
        ignored: 0,
    },
    FlagRegister {
        leaf: EXTENDED_INFORMATION,
        subleaf: 0,
        register: Register::Edx,
        names: [
            "", "", "", "", "", "", "", "",
            "", "", "", "SYSCALL", "", "", "", "",
            "", "", "", "", "XD", "", "", "",
            "", "", "1GB_PAGE", "RDTSCP", "", "LM", "", "",
        ],
        ignored: 0,
    },
];

/// Name given to a set bit that has no documented meaning.
///
/// `CPUID(07h).EDX[0]` for sub-leaf 0, `CPUID(EAX=0Dh,ECX=01h).EAX[4]`
/// otherwise.
pub fn reserved_name(leaf: u32, subleaf: u32, register: Register, bit: u32) -> String {
    if subleaf == 0 {
        format!("CPUID({:02X}h).{}[{}]", leaf, register, bit)
    } else {
        format!("CPUID(EAX={:02X}h,ECX={:02X}h).{}[{}]", leaf, subleaf, register, bit)
    }
}

/// Feature flags of one processor, by name.
///
/// Every documented flag of a leaf the processor implements is present,
/// set or not. Reserved bits only appear when set, so that flags defined
/// after these tables were written still show up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    flags: BTreeMap<String, bool>,
}

impl CpuFeatures {
    /// Reads the processor the calling thread currently runs on.
    pub fn current() -> Self {
        Self::from_reader(&LiveReader)
    }

    pub fn from_records(records: &[CpuIdRecord]) -> Self {
        Self::from_reader(&RecordedReader::new(records))
    }

    pub fn from_reader<R: CpuIdReader>(reader: &R) -> Self {
        let max_standard = reader.cpuid1(VENDOR_ID).eax;
        let max_extended = reader.cpuid1(EXTENDED_FUNCTION).eax;
        let implemented = |leaf: u32| {
            if leaf & EXTENDED_FUNCTION == 0 {
                leaf <= max_standard
            } else {
                max_extended & EXTENDED_FUNCTION != 0 && leaf <= max_extended
            }
        };

        let mut flags = BTreeMap::new();
        for set in FLAG_REGISTERS.iter().filter(|set| implemented(set.leaf)) {
            let value = set.register.select(reader.cpuid2(set.leaf, set.subleaf));
            for (bit, name) in (0..32).zip(set.names) {
                let mask = 1 << bit;
                if set.ignored & mask != 0 {
                    continue;
                }
                let on = value & mask != 0;
                if !name.is_empty() {
                    flags.insert(name.to_owned(), on);
                } else if on {
                    let name = reserved_name(set.leaf, set.subleaf, set.register, bit);
                    log::debug!("reserved feature bit {} is set", name);
                    flags.insert(name, true);
                }
            }
        }

        CpuFeatures { flags }
    }

    /// `None` if the flag is unknown, or its leaf isn't implemented.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    /// Names of the set flags, sorted.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.enabled().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
