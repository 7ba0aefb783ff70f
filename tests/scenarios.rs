// Whole-run behavior of the pipeline on small programs

use std::io::Write;

use pretty_assertions::assert_eq;
use rv_pipe_trace::{
    isa::{Instruction, OpcodeKind, Stage},
    load_file, run, CycleTrace, PIPELINE_DEPTH,
};

const ADD: &str = "00000000000000000000000000110011";

fn adds(n: usize) -> Vec<Instruction> {
    (1..=n)
        .map(|i| Instruction::new(ADD, format!("add x{i},x2,x3")))
        .collect()
}

fn lines(traces: &[CycleTrace]) -> Vec<String> {
    traces.iter().map(|t| t.to_string()).collect()
}

#[test]
fn single_add() {
    let traces = run([Instruction::new(ADD, "add x1,x2,x3")]);

    assert_eq!(traces.len(), 5);
    for (trace, stage) in traces.iter().zip(Stage::PIPELINE) {
        assert_eq!(trace.tokens.len(), 1);
        assert_eq!(trace.stages, format!("add x1,x2,x3;{stage}"));
        assert_eq!(trace.head, "add x1,x2,x3");
        assert_eq!(trace.tokens[0].kind, OpcodeKind::RegReg);
    }
    let cycles: Vec<u64> = traces.iter().map(|t| t.cycle).collect();
    assert_eq!(cycles, [1, 2, 3, 4, 5]);
}

#[test]
fn six_adds_fill_then_drain() {
    let traces = run(adds(6));
    assert_eq!(traces.len(), 6 + 4);

    // cycle 5: five residents, the sixth still waits
    let fifth = &traces[4];
    assert_eq!(fifth.occupancy(), PIPELINE_DEPTH);
    assert_eq!(fifth.stage_of(0), Some(Stage::Wb));
    assert_eq!(fifth.stage_of(5), None);
    assert_eq!(
        fifth.stages,
        "add x5,x2,x3;IF | add x4,x2,x3;ID | add x3,x2,x3;EX | add x2,x2,x3;MEM | add x1,x2,x3;WB"
    );

    // cycle 6: the first one is gone and the sixth enters
    let sixth = &traces[5];
    assert_eq!(sixth.stage_of(0), None);
    assert_eq!(sixth.stage_of(5), Some(Stage::If));
    assert_eq!(sixth.head, "add x2,x2,x3");
    assert_eq!(sixth.occupancy(), PIPELINE_DEPTH);

    assert_eq!(
        lines(&traces[6..]),
        [
            "add x3,x2,x3 add x6,x2,x3;ID | add x5,x2,x3;EX | add x4,x2,x3;MEM | add x3,x2,x3;WB",
            "add x4,x2,x3 add x6,x2,x3;EX | add x5,x2,x3;MEM | add x4,x2,x3;WB",
            "add x5,x2,x3 add x6,x2,x3;MEM | add x5,x2,x3;WB",
            "add x6,x2,x3 add x6,x2,x3;WB",
        ]
    );
}

#[test]
fn empty_input() {
    assert!(run(Vec::new()).is_empty());
}

#[test]
fn short_opcode_still_flows() {
    let traces = run([
        Instruction::new("0110011", "bad"),
        Instruction::new(ADD, "add x1,x2,x3"),
    ]);
    assert_eq!(traces.len(), 2 + 4);

    let stages: Vec<Stage> = traces.iter().filter_map(|t| t.stage_of(0)).collect();
    assert_eq!(stages, Stage::PIPELINE);
    assert!(traces
        .iter()
        .flat_map(|t| &t.tokens)
        .filter(|t| t.index == 0)
        .all(|t| t.kind == OpcodeKind::Unknown));
}

#[test]
fn mixed_classes() {
    let traces = run([
        Instruction::new("00000000011100110000001010110011", "add x5,x6,x7"),
        Instruction::new("00000000010100110000001100010011", "addi x6,x6,5"),
        Instruction::new("00000000011000101010000000100011", "sw x6,0(x5)"),
        Instruction::new("00000000000000000000000001101111", "jal x0,0"),
    ]);
    let kinds: Vec<OpcodeKind> = traces[3].tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [
            OpcodeKind::Unknown,
            OpcodeKind::Store,
            OpcodeKind::RegImm,
            OpcodeKind::RegReg
        ]
    );
}

#[test]
fn listing_file_round_trip() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "0 0x00000000 00000000011100110000001010110011 add x5, x6, x7")?;
    writeln!(file, "1 0x00000004 00000000010100110000001100010011 addi x6, x6, 5")?;
    file.flush()?;

    let traces = run(load_file(file.path())?);
    assert_eq!(traces.len(), 6);
    assert_eq!(traces[1].to_string(), "add x5, x6, x7 addi x6, x6, 5;IF | add x5, x6, x7;ID");
    Ok(())
}

#[test]
fn missing_listing_file() {
    let err = load_file("does/not/exist.csv").unwrap_err();
    assert!(err.to_string().contains("could not read file"));
}
