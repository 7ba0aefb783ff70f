use std::io::Write;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use clap_verbosity_flag as verbose;
use rv_pipe_trace::{load_file, run, utils, write_trace, TraceFormat, TraceSummary};

// Five-stage pipeline occupancy tracer
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = utils::get_styles(),
)]
struct Args {
    /// Path to the instruction listing
    ///
    /// Each line holds `index address opcode mnemonic`, where opcode is a
    /// 32-character binary string and mnemonic is the rest of the line.
    #[arg(default_value = "instructions.csv")]
    input: String,

    /// Write the trace to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Emit the trace as json
    #[arg(long)]
    json: bool,

    /// Color stage names
    ///
    /// Only applies to text traces. This option is conflict with `json`.
    #[arg(long)]
    color: bool,

    /// Print a summary of the run to stderr
    #[arg(short = 's', long)]
    summary: bool,

    /// Write json logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,

    #[command(flatten)]
    verbose: verbose::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.json && args.color {
        let mut cmd = Args::command();
        cmd.error(
            ErrorKind::ArgumentConflict,
            "Can't both specify json and color",
        )
        .exit();
    }

    let log_level = match args.verbose.log_level() {
        Some(verbose::Level::Error) => &tracing::Level::WARN,
        Some(verbose::Level::Warn) => &tracing::Level::INFO,
        Some(verbose::Level::Info) => &tracing::Level::DEBUG,
        Some(verbose::Level::Debug) => &tracing::Level::TRACE,
        Some(verbose::Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    };
    let log_file = match &args.log_file {
        Some(path) => Some(
            std::fs::File::create(path)
                .with_context(|| format!("could not create log file `{path}`"))?,
        ),
        None => None,
    };
    utils::logging_setup(log_level, log_file);

    let instructions = load_file(&args.input)?;
    tracing::info!(count = instructions.len(), "loaded instructions");

    let traces = run(instructions);

    let format = if args.json {
        TraceFormat::Json
    } else if args.color {
        TraceFormat::Colored
    } else {
        TraceFormat::Text
    };

    if let Some(path) = &args.output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("could not write file `{path}`"))?;
        let mut out = std::io::BufWriter::new(file);
        write_trace(&mut out, &traces, format)?;
        out.flush()
            .with_context(|| format!("could not write file `{path}`"))?;
    } else {
        let mut out = std::io::stdout().lock();
        write_trace(&mut out, &traces, format)?;
    }

    if args.summary {
        eprintln!("{}", TraceSummary::from_traces(&traces));
    }
    Ok(())
}
