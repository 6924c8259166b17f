/// CPUID wrapper
pub mod cpuid;
