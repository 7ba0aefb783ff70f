//! Instruction model for the five-stage RV32 pipeline.
//!
//! The tracer never executes anything, so an instruction only carries its
//! textual encoding, the text shown to the user and the stage it currently
//! occupies.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

macro_rules! define_code {
    {
        @mod $modname:ident;
        @type $typ:ty;
        $( $cname:ident = $cval:expr; )*
    } => {
        pub mod $modname {
            $(pub const $cname : $typ = $cval; )*
            #[allow(unused)]
            pub fn name_of(code: $typ) -> &'static str {
                match code {
                    $($cname => stringify!($cname), )*
                    _ => "no name"
                }
            }
        }
    };
}

/// Number of characters of a well-formed textual opcode.
pub const OPCODE_WIDTH: usize = 32;

/// Character range of the 7-bit major opcode inside the textual encoding.
pub const CLASS_FIELD: std::ops::Range<usize> = 25..OPCODE_WIDTH;

define_code! {
    @mod class_code;
    @type &'static str;
    OP = "0110011";
    OP_IMM = "0010011";
    STORE = "0100011";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsaError {
    /// The opcode is too short (or not plain ASCII) to hold the class field.
    #[error("malformed opcode `{opcode}`: expected 32 bits, found {len}")]
    MalformedOpcode { opcode: String, len: usize },
}

/// Coarse category of an instruction, decided by its major opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpcodeKind {
    /// register-register ALU operation
    RegReg,
    /// register-immediate ALU operation
    RegImm,
    Store,
    Unknown,
}

impl OpcodeKind {
    pub const ALL: [OpcodeKind; 4] = [
        OpcodeKind::RegReg,
        OpcodeKind::RegImm,
        OpcodeKind::Store,
        OpcodeKind::Unknown,
    ];
}

impl fmt::Display for OpcodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpcodeKind::RegReg => "reg-reg",
            OpcodeKind::RegImm => "reg-imm",
            OpcodeKind::Store => "store",
            OpcodeKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Classify an opcode by its major opcode field.
///
/// This is a pure function of the text. Opcodes that are long enough but
/// carry an unrecognized field are [`OpcodeKind::Unknown`]; opcodes too short
/// to hold the field are an error.
pub fn classify(opcode: &str) -> Result<OpcodeKind, IsaError> {
    let field = opcode
        .get(CLASS_FIELD)
        .ok_or_else(|| IsaError::MalformedOpcode {
            opcode: opcode.to_string(),
            len: opcode.chars().count(),
        })?;

    Ok(match field {
        class_code::OP => OpcodeKind::RegReg,
        class_code::OP_IMM => OpcodeKind::RegImm,
        class_code::STORE => OpcodeKind::Store,
        _ => OpcodeKind::Unknown,
    })
}

/// Position of an instruction in its life cycle.
///
/// Stages are ordered, so `a < b` means `a` comes earlier in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    /// Not admitted into the pipeline yet.
    #[default]
    Unissued,
    /// instruction fetch
    If,
    /// instruction decode
    Id,
    /// execute
    Ex,
    /// memory access
    Mem,
    /// write back
    Wb,
    /// Left the pipeline after write back.
    Retired,
}

impl Stage {
    /// The stages an instruction occupies while it is resident, in order.
    pub const PIPELINE: [Stage; 5] = [Stage::If, Stage::Id, Stage::Ex, Stage::Mem, Stage::Wb];

    /// The stage that follows this one, if any.
    pub const fn next(self) -> Option<Stage> {
        match self {
            Stage::Unissued => Some(Stage::If),
            Stage::If => Some(Stage::Id),
            Stage::Id => Some(Stage::Ex),
            Stage::Ex => Some(Stage::Mem),
            Stage::Mem => Some(Stage::Wb),
            Stage::Wb => Some(Stage::Retired),
            Stage::Retired => None,
        }
    }

    /// Whether an instruction in this stage occupies a pipeline slot.
    pub const fn is_resident(self) -> bool {
        !matches!(self, Stage::Unissued | Stage::Retired)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unissued => "UNISSUED",
            Stage::If => "IF",
            Stage::Id => "ID",
            Stage::Ex => "EX",
            Stage::Mem => "MEM",
            Stage::Wb => "WB",
            Stage::Retired => "RETIRED",
        };
        // pad() so that width specifiers work when rendering aligned columns
        f.pad(name)
    }
}

/// A decoded instruction.
///
/// `opcode` and `mnemonic` are fixed at creation. Only the pipeline moves
/// `stage` forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: String,
    mnemonic: String,
    pub(crate) stage: Stage,
}

impl Instruction {
    pub fn new(opcode: impl Into<String>, mnemonic: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            mnemonic: mnemonic.into(),
            stage: Stage::Unissued,
        }
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// See [`classify`].
    pub fn classify(&self) -> Result<OpcodeKind, IsaError> {
        classify(&self.opcode)
    }
}
