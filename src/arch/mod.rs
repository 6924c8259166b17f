#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86_shared;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use self::x86_shared::*;

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("CPUID is only available on x86 and x86_64 processors");
