//! Per-cycle trace records and their rendering.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    io::Write,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    isa::{OpcodeKind, Stage},
    utils,
};

/// Separator between two tokens of a stage line. Mnemonics contain spaces and
/// commas, so neither can be used.
pub const TOKEN_SEPARATOR: &str = " | ";

/// One resident instruction as seen at the end of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageToken {
    /// position of the instruction in the input sequence
    pub index: usize,
    pub mnemonic: String,
    pub stage: Stage,
    pub kind: OpcodeKind,
}

impl Display for StageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{}", self.mnemonic, self.stage)
    }
}

/// Snapshot of the pipeline for a single cycle.
///
/// `tokens` lists the resident instructions from the most recently admitted
/// to the oldest one. `head` is the mnemonic of the oldest resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleTrace {
    /// 1-based cycle number
    pub cycle: u64,
    pub head: String,
    /// `tokens` joined by [`TOKEN_SEPARATOR`]
    pub stages: String,
    pub tokens: Vec<StageToken>,
}

impl CycleTrace {
    pub fn new(cycle: u64, head: String, tokens: Vec<StageToken>) -> Self {
        let stages = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(TOKEN_SEPARATOR);
        Self {
            cycle,
            head,
            stages,
            tokens,
        }
    }

    /// Number of resident instructions in this cycle.
    pub fn occupancy(&self) -> usize {
        self.tokens.len()
    }

    /// Stage of the instruction at `index`, if it was resident in this cycle.
    pub fn stage_of(&self, index: usize) -> Option<Stage> {
        self.tokens.iter().find(|t| t.index == index).map(|t| t.stage)
    }

    /// Render with colored stage names for terminal output.
    pub fn colored(&self) -> String {
        let sep = utils::separator_style().paint(TOKEN_SEPARATOR).to_string();
        let stages = self
            .tokens
            .iter()
            .map(|t| {
                let stage = utils::stage_style(t.stage).paint(t.stage.to_string());
                format!("{};{stage}", t.mnemonic)
            })
            .collect::<Vec<_>>()
            .join(sep.as_str());
        format!("{} {stages}", utils::head_style().paint(self.head.as_str()))
    }
}

impl Display for CycleTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.head, self.stages)
    }
}

/// Output layout of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceFormat {
    /// `head stage-line`, one line per cycle
    #[default]
    Text,
    /// same as text, stage names colored
    Colored,
    /// pretty printed json array
    Json,
}

/// Write `traces` to `out` in the given format.
pub fn write_trace(out: &mut impl Write, traces: &[CycleTrace], format: TraceFormat) -> Result<()> {
    match format {
        TraceFormat::Text => {
            for trace in traces {
                writeln!(out, "{trace}").context("write trace line")?;
            }
        }
        TraceFormat::Colored => {
            for trace in traces {
                writeln!(out, "{}", trace.colored()).context("write trace line")?;
            }
        }
        TraceFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, traces).context("serialize trace")?;
            writeln!(out).context("write trace")?;
        }
    }
    Ok(())
}

/// Aggregated facts about a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TraceSummary {
    pub cycles: u64,
    pub instructions: usize,
    pub peak_occupancy: usize,
    /// number of instructions per opcode class
    pub classes: BTreeMap<OpcodeKind, usize>,
}

impl TraceSummary {
    pub fn from_traces(traces: &[CycleTrace]) -> Self {
        let mut seen = BTreeSet::new();
        let mut classes = BTreeMap::new();
        for token in traces.iter().flat_map(|t| &t.tokens) {
            if seen.insert(token.index) {
                *classes.entry(token.kind).or_insert(0) += 1;
            }
        }
        Self {
            cycles: traces.last().map(|t| t.cycle).unwrap_or_default(),
            instructions: seen.len(),
            peak_occupancy: traces.iter().map(CycleTrace::occupancy).max().unwrap_or_default(),
            classes,
        }
    }
}

impl Display for TraceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "cycles:         {}", self.cycles)?;
        writeln!(f, "instructions:   {}", self.instructions)?;
        write!(f, "peak occupancy: {}", self.peak_occupancy)?;
        for kind in OpcodeKind::ALL {
            let count = self.classes.get(&kind).copied().unwrap_or_default();
            write!(f, "\n  {:<13} {count}", format!("{kind}:"))?;
        }
        Ok(())
    }
}
