//! Decodes the identification leaves into a readable processor summary.

use core::fmt;

use raw_cpuid::{CpuId, CpuIdReader, CpuIdResult};

use crate::arch::cpuid::LiveReader;
use crate::features::CpuFeatures;
use crate::leaves::{EXTENDED_FUNCTION, FEATURE_INFORMATION, PROCESSOR_BRAND, VENDOR_ID};
use crate::record::CpuIdRecord;

/// Answers CPUID from a previously captured dump instead of the processor.
///
/// Leaves missing from the dump read as all-zero registers, which is also
/// what most processors report for leaves they don't implement.
#[derive(Clone, Copy, Debug)]
pub struct RecordedReader<'a> {
    records: &'a [CpuIdRecord],
}

impl<'a> RecordedReader<'a> {
    pub fn new(records: &'a [CpuIdRecord]) -> Self {
        Self { records }
    }

    pub fn get(&self, leaf: u32, subleaf: u32) -> Option<&'a CpuIdRecord> {
        self.records.iter().find(|r| r.selects(leaf, subleaf))
    }
}

impl CpuIdReader for RecordedReader<'_> {
    fn cpuid2(&self, eax: u32, ecx: u32) -> CpuIdResult {
        self.get(eax, ecx)
            .map(CpuIdRecord::result)
            .unwrap_or(CpuIdResult {
                eax: 0,
                ebx: 0,
                ecx: 0,
                edx: 0,
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuSummary {
    /// The 12 character vendor string, e.g. `GenuineIntel`.
    pub vendor_id: String,
    /// Highest standard function, from EAX of leaf 0.
    pub function_count: u32,
    /// Highest extended function, with the 0x80000000 base removed.
    pub extended_function_count: u32,
    /// From leaves 80000002-80000004h, if the processor has them.
    pub brand_string: Option<String>,
    /// EAX of leaf 1.
    pub processor_signature: u32,
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
    pub processor_type: u32,
    /// Maximum number of addressable APIC ids in this package.
    pub apic_max_threads: u32,
    /// Initial APIC id of the processor the summary was read on.
    pub apic_id: u32,
    pub features: CpuFeatures,
}

/// Text packed little-endian into registers, as the vendor and brand are.
///
/// NUL bytes are padding wherever they appear. Every other byte is taken
/// as Latin-1, so a string that isn't UTF-8 still decodes.
fn register_text(registers: &[u32]) -> String {
    registers
        .iter()
        .flat_map(|reg| reg.to_le_bytes())
        .filter(|&byte| byte != 0)
        .map(char::from)
        .collect()
}

impl CpuSummary {
    /// Reads the processor the calling thread currently runs on.
    pub fn current() -> Self {
        Self::from_reader(LiveReader)
    }

    /// Decodes a dump, as returned by [`crate::dump`].
    pub fn from_records(records: &[CpuIdRecord]) -> Self {
        Self::from_reader(RecordedReader::new(records))
    }

    pub fn from_reader<R: CpuIdReader>(reader: R) -> Self {
        let vendor = reader.cpuid1(VENDOR_ID);
        let mut summary = CpuSummary {
            vendor_id: register_text(&[vendor.ebx, vendor.edx, vendor.ecx]),
            function_count: vendor.eax,
            features: CpuFeatures::from_reader(&reader),
            ..CpuSummary::default()
        };

        let extended = reader.cpuid1(EXTENDED_FUNCTION);
        if extended.eax & EXTENDED_FUNCTION != 0 {
            summary.extended_function_count = extended.eax & !EXTENDED_FUNCTION;
        }

        if summary.extended_function_count >= 4 {
            let registers: Vec<u32> = PROCESSOR_BRAND
                .iter()
                .flat_map(|&leaf| {
                    let r = reader.cpuid1(leaf);
                    [r.eax, r.ebx, r.ecx, r.edx]
                })
                .collect();
            let brand = register_text(&registers);
            let brand = brand.trim();
            if !brand.is_empty() {
                summary.brand_string = Some(brand.to_owned());
            }
        }

        let cpuid = CpuId::with_cpuid_reader(reader.clone());
        if summary.function_count >= FEATURE_INFORMATION {
            if let Some(info) = cpuid.get_feature_info() {
                summary.processor_signature = reader.cpuid1(FEATURE_INFORMATION).eax;
                summary.family = info.family_id().into();
                summary.model = info.model_id().into();
                summary.stepping = info.stepping_id().into();
                summary.processor_type = (summary.processor_signature >> 12) & 0x3;
                summary.apic_max_threads = info.max_logical_processor_ids().into();
                summary.apic_id = info.initial_local_apic_id().into();
            }
        }

        log::trace!("decoded {:?}", summary);
        summary
    }
}

impl fmt::Display for CpuSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vendor: {}", self.vendor_id)?;
        if let Some(brand) = &self.brand_string {
            writeln!(f, "Brand: {}", brand)?;
        }
        writeln!(
            f,
            "Functions: {:02X}h, extended {:02X}h",
            self.function_count, self.extended_function_count
        )?;
        writeln!(
            f,
            "Signature: {:08X}h (family {:X}h, model {:X}h, stepping {}, type {})",
            self.processor_signature, self.family, self.model, self.stepping, self.processor_type
        )?;
        writeln!(f, "APIC: id {}, max threads {}", self.apic_id, self.apic_max_threads)?;
        writeln!(f, "Features: {}", self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(leaf: u32, eax: u32, ebx: u32, ecx: u32, edx: u32) -> CpuIdRecord {
        CpuIdRecord {
            leaf,
            subleaf: 0,
            eax,
            ebx,
            ecx,
            edx,
        }
    }

    fn le(text: &[u8]) -> [u32; 4] {
        let mut regs = [0; 4];
        for (reg, chunk) in regs.iter_mut().zip(text.chunks(4)) {
            let mut bytes = [0; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            *reg = u32::from_le_bytes(bytes);
        }
        regs
    }

    /// Leaves of an Intel Core i7-8650U.
    fn kaby_lake() -> Vec<CpuIdRecord> {
        let brand = b"       Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz\0";
        let b: Vec<[u32; 4]> = brand.chunks(16).map(le).collect();
        vec![
            record(0x0, 0x16, 0x756e_6547, 0x6c65_746e, 0x4965_6e69),
            record(0x1, 0x0008_06ea, 0x0110_0800, 0x7ffa_fbbf, 0xbfeb_fbff),
            record(0x8000_0000, 0x8000_0008, 0, 0, 0),
            record(0x8000_0002, b[0][0], b[0][1], b[0][2], b[0][3]),
            record(0x8000_0003, b[1][0], b[1][1], b[1][2], b[1][3]),
            record(0x8000_0004, b[2][0], b[2][1], b[2][2], b[2][3]),
        ]
    }

    #[test]
    fn decodes_recorded_intel() {
        // Given
        let records = kaby_lake();

        // When
        let summary = CpuSummary::from_records(&records);

        // Then
        assert_eq!(summary.vendor_id, "GenuineIntel");
        assert_eq!(summary.function_count, 0x16);
        assert_eq!(summary.extended_function_count, 8);
        assert_eq!(
            summary.brand_string.as_deref(),
            Some("Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz")
        );
        assert_eq!(summary.processor_signature, 0x806ea);
        assert_eq!(summary.family, 6);
        assert_eq!(summary.model, 0x8e);
        assert_eq!(summary.stepping, 0xa);
        assert_eq!(summary.processor_type, 0);
        assert_eq!(summary.apic_max_threads, 16);
        assert_eq!(summary.apic_id, 1);
    }

    #[test]
    fn extended_family_is_added_for_family_f() {
        // Given: an AMD Zen 2 signature, base family Fh + extended family 8h
        let records = vec![
            record(0x0, 0x10, 0x6874_7541, 0x444d_4163, 0x6974_6e65),
            record(0x1, 0x0087_0f10, 0, 0, 0),
        ];

        // When
        let summary = CpuSummary::from_records(&records);

        // Then
        assert_eq!(summary.vendor_id, "AuthenticAMD");
        assert_eq!(summary.family, 0x17);
        assert_eq!(summary.model, 0x71);
        assert_eq!(summary.stepping, 0);
        assert_eq!(summary.brand_string, None);
    }

    fn with_brand(brand: &[u8]) -> Vec<CpuIdRecord> {
        let b: Vec<[u32; 4]> = brand.chunks(16).map(le).collect();
        vec![
            record(0x0, 0x1, 0x756e_6547, 0x6c65_746e, 0x4965_6e69),
            record(0x8000_0000, 0x8000_0004, 0, 0, 0),
            record(0x8000_0002, b[0][0], b[0][1], b[0][2], b[0][3]),
            record(0x8000_0003, b[1][0], b[1][1], b[1][2], b[1][3]),
            record(0x8000_0004, b[2][0], b[2][1], b[2][2], b[2][3]),
        ]
    }

    #[test]
    fn brand_after_leading_nuls_is_kept() {
        // Given
        let mut brand = vec![0; 4];
        brand.extend_from_slice(b"Intel(R) Xeon ");
        brand.resize(48, 0);

        // When
        let summary = CpuSummary::from_records(&with_brand(&brand));

        // Then
        assert_eq!(summary.brand_string.as_deref(), Some("Intel(R) Xeon"));
    }

    #[test]
    fn brand_bytes_outside_ascii_are_latin1() {
        // Given
        let mut brand = b"Caf\xe9 X".to_vec();
        brand.resize(48, 0);

        // When
        let summary = CpuSummary::from_records(&with_brand(&brand));

        // Then
        assert_eq!(summary.brand_string.as_deref(), Some("Caf\u{e9} X"));
    }

    #[test]
    fn all_nul_brand_is_absent() {
        let summary = CpuSummary::from_records(&with_brand(&[0; 48]));
        assert_eq!(summary.brand_string, None);
    }

    #[test]
    fn vendor_keeps_spaces_and_skips_nuls() {
        // Given: "  Shanghai  " in EBX, EDX, ECX order, and a NUL padded "Ab\0\0" vendor
        let shanghai = le(b"  Shanghai  ");
        let padded = le(b"Ab\0\0Cd\0\0E\0\0\0");

        // When
        let zhaoxin = CpuSummary::from_records(&[record(0, 0, shanghai[0], shanghai[2], shanghai[1])]);
        let odd = CpuSummary::from_records(&[record(0, 0, padded[0], padded[2], padded[1])]);

        // Then
        assert_eq!(zhaoxin.vendor_id, "  Shanghai  ");
        assert_eq!(odd.vendor_id, "AbCdE");
    }

    #[test]
    fn summary_carries_features() {
        let summary = CpuSummary::from_records(&kaby_lake());
        assert!(summary.features.is_set("SSE4.2"));
        assert!(summary.to_string().contains("Features: "));
    }

    #[test]
    fn empty_dump_decodes_to_zeroes() {
        let summary = CpuSummary::from_records(&[]);
        assert_eq!(summary.function_count, 0);
        assert_eq!(summary.extended_function_count, 0);
        assert_eq!(summary.brand_string, None);
        assert_eq!(summary.family, 0);
    }

    #[test]
    fn live_matches_dump() {
        let live = CpuSummary::current();
        let recorded = CpuSummary::from_records(&crate::dump());
        assert_eq!(live.vendor_id, recorded.vendor_id);
        assert_eq!(live.brand_string, recorded.brand_string);
        assert_eq!(live.processor_signature, recorded.processor_signature);
    }
}
