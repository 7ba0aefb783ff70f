//! This module provides parsing utilities for instruction listings.
//!
//! A listing holds one record per line:
//!
//! ```text
//! # index address    opcode                           mnemonic
//! 0       0x00000000 00000000011100110000001010110011 add x5, x6, x7
//! ```
//!
//! Only the opcode and the mnemonic matter to the pipeline. Fields are kept
//! verbatim; a malformed opcode is reported but still loaded.
use std::path::Path;

use anyhow::{Context, Result};
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;

use crate::isa::Instruction;

#[derive(Parser)]
#[grammar = "grammar.pest"] // relative to src
pub struct ListingParser;

/// Shape of a well-formed textual opcode.
pub const OPCODE_PATTERN: &str = r"^[01]{32}$";

/// One listing record, fields taken verbatim from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// 1-based line number in the listing
    pub line: usize,
    pub index: String,
    pub address: String,
    pub opcode: String,
    pub mnemonic: String,
}

impl From<SourceRecord> for Instruction {
    fn from(record: SourceRecord) -> Self {
        Instruction::new(record.opcode, record.mnemonic)
    }
}

/// Split a listing into records. Blank lines and `#` comments are skipped.
pub fn parse(src: &str) -> Result<Vec<SourceRecord>> {
    let main = ListingParser::parse(Rule::main, src)
        .context("fail to parse instruction listing")?
        .next()
        .context("empty parse tree")?;

    let mut records = Vec::new();
    for line in main.into_inner().filter(|p| p.as_rule() == Rule::line) {
        let Some(record) = line.into_inner().next() else {
            continue;
        };
        let (line_no, _) = record.line_col();
        let mut fields = record.into_inner();
        let mut next = |name: &str| {
            fields
                .next()
                .map(|p| p.as_str().to_string())
                .with_context(|| format!("line {line_no}: missing {name}"))
        };
        records.push(SourceRecord {
            line: line_no,
            index: next("index")?,
            address: next("address")?,
            opcode: next("opcode")?,
            mnemonic: next("mnemonic")?.trim_end().to_string(),
        });
    }
    Ok(records)
}

/// Turn records into unissued instructions, in order.
///
/// Opcodes are not validated here. Those that do not look like 32 bits are
/// only reported, the pipeline treats them as unclassified.
pub fn instructions(records: Vec<SourceRecord>) -> Result<Vec<Instruction>> {
    let well_formed = Regex::new(OPCODE_PATTERN).context("compile opcode pattern")?;
    Ok(records
        .into_iter()
        .map(|record| {
            if !well_formed.is_match(&record.opcode) {
                tracing::warn!(
                    line = record.line,
                    opcode = record.opcode.as_str(),
                    "opcode is not a 32-bit binary string"
                );
            }
            Instruction::from(record)
        })
        .collect())
}

/// Parse a listing and load its instructions.
pub fn load_listing(src: &str) -> Result<Vec<Instruction>> {
    let records = parse(src)?;
    tracing::debug!(records = records.len(), "parsed listing");
    instructions(records)
}

/// Read and load a listing file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Instruction>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{}`", path.display()))?;
    load_listing(&content).with_context(|| format!("could not load `{}`", path.display()))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::isa::Stage;

    pub const SAMPLE: &str = r#"
# index address    opcode                           mnemonic
0 0x00000000 00000000011100110000001010110011 add x5, x6, x7
1 0x00000004 00000000010100110000001100010011 addi x6, x6, 5   # bump

2	0x00000008	00000000011000101010000000100011	sw x6, 0(x5)
"#;

    #[test]
    fn test_parse_records() -> Result<()> {
        let records = parse(SAMPLE)?;
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            SourceRecord {
                line: 3,
                index: "0".into(),
                address: "0x00000000".into(),
                opcode: "00000000011100110000001010110011".into(),
                mnemonic: "add x5, x6, x7".into(),
            }
        );
        assert_eq!(records[1].mnemonic, "addi x6, x6, 5");
        assert_eq!(records[2].line, 6);
        assert_eq!(records[2].mnemonic, "sw x6, 0(x5)");
        Ok(())
    }

    #[test]
    fn test_empty_listing() -> Result<()> {
        assert!(parse("")?.is_empty());
        assert!(parse("\n   \n# nothing here\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_mnemonic() {
        let err = parse("0 0x0 00000000000000000000000000110011\n").unwrap_err();
        assert!(format!("{err:#}").contains("fail to parse instruction listing"));
    }

    #[test]
    fn test_load_keeps_malformed_opcode() -> Result<()> {
        let insts = load_listing("0 0x0 0110011 add x1,x2,x3\n1 0x4 zzz nop")?;
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[0].opcode(), "0110011");
        assert_eq!(insts[1].opcode(), "zzz");
        assert_eq!(insts[1].mnemonic(), "nop");
        assert!(insts.iter().all(|i| i.stage() == Stage::Unissued));
        Ok(())
    }

    #[test]
    fn test_crlf_listing() -> Result<()> {
        let insts = load_listing("0 0x0 00000000000000000000000000110011 add x1,x2,x3\r\n")?;
        assert_eq!(insts[0].mnemonic(), "add x1,x2,x3");
        Ok(())
    }
}
