//! Textual renderings of a dump.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::ImportError;
use crate::record::CpuIdRecord;

/// Writes `records` as a `<cpuid>` register document.
///
/// Each register carries its selectors as attributes and the four outputs
/// as comma separated hex, which is the format saved CPUID captures are
/// exchanged in.
pub fn write_xml<W: Write>(w: &mut W, records: &[CpuIdRecord]) -> io::Result<()> {
    writeln!(w, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    writeln!(w, "<cpuid>")?;
    writeln!(w, "\t<processor type=\"x86\">")?;
    for r in records {
        writeln!(
            w,
            "\t\t<register eax=\"{:08X}\" ecx=\"{:08X}\">{:08X},{:08X},{:08X},{:08X}</register>",
            r.leaf, r.subleaf, r.eax, r.ebx, r.ecx, r.edx
        )?;
    }
    writeln!(w, "\t</processor>")?;
    writeln!(w, "</cpuid>")
}

/// Loads a document written by [`write_xml`].
///
/// Registers are taken in document order from every `<processor>` element.
/// Values are hex with or without leading zeros, in either case.
pub fn read_xml(text: &str) -> Result<Vec<CpuIdRecord>, ImportError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name("cpuid") {
        return Err(ImportError::NotCpuid(root.tag_name().name().to_owned()));
    }

    let records = root
        .descendants()
        .filter(|node| node.has_tag_name("register"))
        .map(|node| read_register(&doc, node))
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("loaded {} records", records.len());
    Ok(records)
}

pub fn read_xml_file<P: AsRef<Path>>(path: P) -> Result<Vec<CpuIdRecord>, ImportError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_owned(),
        source,
    })?;
    read_xml(&text)
}

fn read_register(doc: &Document<'_>, node: Node<'_, '_>) -> Result<CpuIdRecord, ImportError> {
    let line = doc.text_pos_at(node.range().start).row;
    let hex = |value: &str| {
        u32::from_str_radix(value.trim(), 16).map_err(|_| ImportError::BadNumber {
            line,
            value: value.to_owned(),
        })
    };
    let selector = |attribute: &'static str| {
        node.attribute(attribute)
            .ok_or(ImportError::MissingAttribute { line, attribute })
            .and_then(|value| hex(value))
    };

    let leaf = selector("eax")?;
    let subleaf = selector("ecx")?;
    let values = node
        .text()
        .unwrap_or_default()
        .split(',')
        .map(|value| hex(value))
        .collect::<Result<Vec<_>, _>>()?;
    let Ok([eax, ebx, ecx, edx]) = <[u32; 4]>::try_from(values.as_slice()) else {
        return Err(ImportError::RegisterCount {
            line,
            count: values.len(),
        });
    };

    Ok(CpuIdRecord {
        leaf,
        subleaf,
        eax,
        ebx,
        ecx,
        edx,
    })
}

/// One line per record.
pub fn write_table<W: Write>(w: &mut W, records: &[CpuIdRecord]) -> io::Result<()> {
    writeln!(w, "LEAF     SUBLEAF  EAX      EBX      ECX      EDX")?;
    for r in records {
        writeln!(
            w,
            "{:08X} {:08X} {:08X} {:08X} {:08X} {:08X}",
            r.leaf, r.subleaf, r.eax, r.ebx, r.ecx, r.edx
        )?;
    }
    Ok(())
}
