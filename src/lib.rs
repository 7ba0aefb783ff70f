//! Five-stage pipeline occupancy tracer.
//!
//! Instructions go through IF, ID, EX, MEM and WB one stage per cycle. The
//! tracer records, for every cycle, which instruction sits in which stage. It
//! does not execute anything.
//!
//! ```
//! use rv_pipe_trace::{isa::Instruction, run};
//!
//! let add = Instruction::new("00000000011100110000001010110011", "add x5,x6,x7");
//! let traces = run([add]);
//! assert_eq!(traces.len(), 5);
//! assert_eq!(traces[0].to_string(), "add x5,x6,x7 add x5,x6,x7;IF");
//! ```

pub mod isa;
pub mod parse;
pub mod pipeline;
pub mod record;
pub mod utils;

pub use parse::{load_file, load_listing};
pub use pipeline::{run, Pipeline, PIPELINE_DEPTH};
pub use record::{write_trace, CycleTrace, TraceFormat, TraceSummary};
