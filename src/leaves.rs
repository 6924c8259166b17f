//! The fixed set of CPUID leaves captured by a dump.

pub const VENDOR_ID: u32 = 0x0000_0000;
pub const FEATURE_INFORMATION: u32 = 0x0000_0001;
pub const EXTENDED_FEATURES: u32 = 0x0000_0007;
pub const EXTENDED_TOPOLOGY: u32 = 0x0000_000B;
pub const EXTENDED_PROCESSOR_STATE: u32 = 0x0000_000D;
pub const EXTENDED_TOPOLOGY_V2: u32 = 0x0000_001F;
pub const EXTENDED_FUNCTION: u32 = 0x8000_0000;
pub const EXTENDED_INFORMATION: u32 = 0x8000_0001;
pub const PROCESSOR_BRAND: [u32; 3] = [0x8000_0002, 0x8000_0003, 0x8000_0004];
pub const EXTENDED_LM_APIC_ID: u32 = 0x8000_0008;
pub const EXTENDED_ENCRYPTED_MEMORY: u32 = 0x8000_001F;

/// A leaf/sub-leaf selector pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Leaf {
    pub leaf: u32,
    pub subleaf: u32,
}

const fn leaf(leaf: u32, subleaf: u32) -> Leaf {
    Leaf { leaf, subleaf }
}

/// Standard informational leaves followed by the extended ones, in dump order.
pub const KNOWN_LEAVES: &[Leaf] = &[
    leaf(VENDOR_ID, 0),
    leaf(FEATURE_INFORMATION, 0),
    // Cache and TLB descriptors
    leaf(0x02, 0),
    // Processor serial number
    leaf(0x03, 0),
    // Deterministic cache parameters, L1d through L3
    leaf(0x04, 0),
    leaf(0x04, 1),
    leaf(0x04, 2),
    leaf(0x04, 3),
    // MONITOR/MWAIT
    leaf(0x05, 0),
    // Thermal and power management
    leaf(0x06, 0),
    leaf(EXTENDED_FEATURES, 0),
    leaf(EXTENDED_FEATURES, 1),
    // Architectural performance monitoring
    leaf(0x0A, 0),
    leaf(EXTENDED_TOPOLOGY, 0),
    leaf(EXTENDED_TOPOLOGY, 1),
    leaf(EXTENDED_PROCESSOR_STATE, 0),
    leaf(EXTENDED_PROCESSOR_STATE, 1),
    // Processor trace
    leaf(0x14, 0),
    // TSC and core crystal clock
    leaf(0x15, 0),
    // Processor frequency
    leaf(0x16, 0),
    leaf(EXTENDED_TOPOLOGY_V2, 0),
    leaf(EXTENDED_TOPOLOGY_V2, 1),
    leaf(EXTENDED_FUNCTION, 0),
    leaf(EXTENDED_INFORMATION, 0),
    leaf(PROCESSOR_BRAND[0], 0),
    leaf(PROCESSOR_BRAND[1], 0),
    leaf(PROCESSOR_BRAND[2], 0),
    // AMD L1 cache and TLB
    leaf(0x8000_0005, 0),
    // L2 cache
    leaf(0x8000_0006, 0),
    // Advanced power management
    leaf(0x8000_0007, 0),
    leaf(EXTENDED_LM_APIC_ID, 0),
    leaf(EXTENDED_ENCRYPTED_MEMORY, 0),
];
