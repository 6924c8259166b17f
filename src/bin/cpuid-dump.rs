use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use cpuid_probe::{export, CpuIdRecord, CpuSummary, LogicalCpuId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Xml,
}

/// Dump the CPUID leaves of this processor.
#[derive(Parser)]
#[command(version)]
struct Options {
    /// Logical processor to read from. Defaults to wherever this thread runs.
    #[arg(long, conflicts_with = "input")]
    core: Option<u32>,

    /// Decode a saved XML dump instead of reading the processor.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the decoded vendor, brand, signature and features after the table.
    #[arg(long)]
    summary: bool,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn records(options: &Options) -> Result<Vec<CpuIdRecord>> {
    if let Some(path) = &options.input {
        return export::read_xml_file(path).with_context(|| format!("loading {}", path.display()));
    }

    if !cpuid_probe::is_supported() {
        bail!("this processor does not support CPUID");
    }
    match options.core {
        Some(core) => cpuid_probe::dump_on_core(LogicalCpuId::new(core))
            .with_context(|| format!("dumping core {core}")),
        None => Ok(cpuid_probe::dump()),
    }
}

fn render<W: Write>(out: &mut W, options: &Options, records: &[CpuIdRecord]) -> io::Result<()> {
    match options.format {
        Format::Text => export::write_table(out, records)?,
        Format::Xml => export::write_xml(out, records)?,
    }
    if options.summary {
        writeln!(out)?;
        write!(out, "{}", CpuSummary::from_records(records))?;
    }
    out.flush()
}

fn main() -> Result<()> {
    let options = Options::parse();
    cpuid_probe::log::init_logger_with(options.verbose.log_level_filter());

    let records = records(&options)?;
    render(&mut io::stdout().lock(), &options, &records)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn options_are_consistent() {
        Options::command().debug_assert();
    }

    #[test]
    fn parses_defaults() {
        let options = Options::try_parse_from(["cpuid-dump"]).unwrap();
        assert_eq!(options.format, Format::Text);
        assert_eq!(options.core, None);
        assert!(!options.summary);
        assert_eq!(options.verbose.log_level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn core_and_input_conflict() {
        let result = Options::try_parse_from(["cpuid-dump", "--core", "1", "--input", "dump.xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_flags_raise_the_level() {
        let options = Options::try_parse_from(["cpuid-dump", "-vv"]).unwrap();
        assert_eq!(options.verbose.log_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn xml_output_loads_back_with_summary() {
        // Given: a saved dump of this processor
        let dump = cpuid_probe::dump();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        export::write_xml(&mut file, &dump).unwrap();
        let path = file.path().to_str().unwrap();
        let options =
            Options::try_parse_from(["cpuid-dump", "--input", path, "--format", "xml", "--summary"])
                .unwrap();

        // When
        let loaded = records(&options).unwrap();
        let mut out = Vec::new();
        render(&mut out, &options, &loaded).unwrap();

        // Then
        let text = String::from_utf8(out).unwrap();
        let (xml, summary) = text.split_once("</cpuid>\n").unwrap();
        assert_eq!(export::read_xml(&format!("{xml}</cpuid>")).unwrap(), dump);
        assert!(summary.contains(&format!("Vendor: {}", CpuSummary::current().vendor_id)));
    }

    #[test]
    fn text_output_is_a_table() {
        let options = Options::try_parse_from(["cpuid-dump"]).unwrap();
        let records = records(&options).unwrap();
        let mut out = Vec::new();
        render(&mut out, &options, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), records.len() + 1);
        assert!(text.starts_with("LEAF     SUBLEAF"));
    }

    #[test]
    fn missing_input_is_reported() {
        let options =
            Options::try_parse_from(["cpuid-dump", "--input", "/nonexistent/dump.xml"]).unwrap();
        let err = records(&options).unwrap_err();
        assert_eq!(err.to_string(), "loading /nonexistent/dump.xml");
    }
}
