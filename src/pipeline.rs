//! Cycle-stepped five-stage pipeline.
//!
//! Every cycle runs the same sequence of steps:
//!
//! 1. admission: the next unissued instruction enters IF if a slot is free,
//! 2. classification of every resident opcode,
//! 3. advancement: every other resident moves to the following stage,
//! 4. trace assembly,
//! 5. retirement of the run of WB instructions at the front.
//!
//! Nothing ever stalls, so all residents move in lockstep and each instruction
//! spends exactly one cycle per stage.

use std::collections::VecDeque;

use crate::{
    isa::{Instruction, OpcodeKind, Stage},
    record::{CycleTrace, StageToken},
};

/// Maximum number of resident instructions, one per stage.
pub const PIPELINE_DEPTH: usize = Stage::PIPELINE.len();

/// An instruction held in the pipeline's working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSlot {
    pub inst: Instruction,
    /// position of the instruction in the input sequence
    pub index: usize,
    /// result of the latest classification
    pub kind: OpcodeKind,
}

/// Pipeline simulator.
///
/// Drive it with [`Pipeline::step`] until [`Pipeline::is_terminate`], or use
/// it as an iterator of [`CycleTrace`]s.
#[derive(Debug)]
pub struct Pipeline {
    /// instructions not admitted yet, in program order
    pending: VecDeque<Instruction>,
    /// index of the next instruction to admit
    issued: usize,
    /// working set, oldest resident at the front
    slots: VecDeque<PipelineSlot>,
    retired: Vec<PipelineSlot>,
    cycle_count: u64,
}

impl Pipeline {
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        let pending: VecDeque<Instruction> = instructions.into_iter().collect();
        if pending.is_empty() {
            tracing::debug!("no instructions to simulate");
        }
        Self {
            pending,
            issued: 0,
            slots: VecDeque::with_capacity(PIPELINE_DEPTH),
            retired: Vec::new(),
            cycle_count: 0,
        }
    }

    /// Whether every instruction has retired.
    pub fn is_terminate(&self) -> bool {
        self.pending.is_empty() && self.slots.is_empty()
    }

    /// Number of cycles simulated so far.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Resident instructions, oldest first.
    pub fn resident(&self) -> impl Iterator<Item = &PipelineSlot> {
        self.slots.iter()
    }

    pub fn occupancy(&self) -> usize {
        self.slots.len()
    }

    /// Instructions that left the pipeline, in retirement order.
    pub fn retired(&self) -> &[PipelineSlot] {
        &self.retired
    }

    /// Simulate one cycle. Returns `None` once the pipeline has drained.
    pub fn step(&mut self) -> Option<CycleTrace> {
        if self.is_terminate() {
            return None;
        }
        self.cycle_count += 1;
        let _span = tracing::trace_span!("cycle", n = self.cycle_count).entered();

        let admitted = self.admit();
        self.classify();
        self.advance(admitted);
        let trace = self.assemble();
        self.retire();

        Some(trace)
    }

    /// Move the next unissued instruction into IF if there is room.
    fn admit(&mut self) -> bool {
        if self.slots.len() >= PIPELINE_DEPTH {
            return false;
        }
        let Some(mut inst) = self.pending.pop_front() else {
            return false;
        };
        inst.stage = Stage::If;
        tracing::trace!(index = self.issued, mnemonic = inst.mnemonic(), "admit");
        self.slots.push_back(PipelineSlot {
            inst,
            index: self.issued,
            kind: OpcodeKind::Unknown,
        });
        self.issued += 1;
        true
    }

    fn classify(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.kind = match slot.inst.classify() {
                Ok(kind) => kind,
                Err(err) => {
                    tracing::trace!(index = slot.index, %err, "left unclassified");
                    OpcodeKind::Unknown
                }
            };
            tracing::trace!(index = slot.index, kind = %slot.kind, "classify");
        }
    }

    /// Advance every resident except the one admitted in this cycle, whose
    /// transition for the cycle was UNISSUED -> IF.
    fn advance(&mut self, admitted: bool) {
        let settled = self.slots.len() - usize::from(admitted);
        for slot in self.slots.iter_mut().take(settled) {
            // WB leaves through retirement
            if slot.inst.stage == Stage::Wb {
                continue;
            }
            if let Some(next) = slot.inst.stage.next() {
                slot.inst.stage = next;
            }
        }
    }

    fn assemble(&self) -> CycleTrace {
        let tokens = self
            .slots
            .iter()
            .rev()
            .map(|slot| StageToken {
                index: slot.index,
                mnemonic: slot.inst.mnemonic().to_string(),
                stage: slot.inst.stage,
                kind: slot.kind,
            })
            .collect();
        let head = self
            .slots
            .front()
            .map(|slot| slot.inst.mnemonic().to_string())
            .unwrap_or_default();
        CycleTrace::new(self.cycle_count, head, tokens)
    }

    /// Retire the contiguous run of WB instructions at the front. A WB
    /// instruction behind an older non-WB one stays resident.
    fn retire(&mut self) {
        while self
            .slots
            .front()
            .is_some_and(|slot| slot.inst.stage == Stage::Wb)
        {
            let Some(mut slot) = self.slots.pop_front() else {
                break;
            };
            slot.inst.stage = Stage::Retired;
            tracing::trace!(index = slot.index, mnemonic = slot.inst.mnemonic(), "retire");
            self.retired.push(slot);
        }
    }
}

impl Iterator for Pipeline {
    type Item = CycleTrace;

    fn next(&mut self) -> Option<CycleTrace> {
        self.step()
    }
}

/// Simulate `instructions` until all of them retire, returning one trace per
/// cycle. Empty input gives an empty trace.
pub fn run(instructions: impl IntoIterator<Item = Instruction>) -> Vec<CycleTrace> {
    let traces: Vec<CycleTrace> = Pipeline::new(instructions).collect();
    tracing::debug!(cycles = traces.len(), "simulation finished");
    traces
}
