//! Terminal styling and logging helpers shared by the binary and the renderer.

use ansi_term::{Colour, Style};

use crate::isa::Stage;

/// Color of a stage name in colored traces.
pub fn stage_style(stage: Stage) -> Style {
    match stage {
        Stage::If => Colour::Cyan.normal(),
        Stage::Id => Colour::Blue.normal(),
        Stage::Ex => Colour::Yellow.bold(),
        Stage::Mem => Colour::Purple.normal(),
        Stage::Wb => Colour::Green.bold(),
        Stage::Unissued | Stage::Retired => Colour::Fixed(244).normal(),
    }
}

pub fn head_style() -> Style {
    Style::new().bold()
}

pub fn separator_style() -> Style {
    Colour::Fixed(244).normal()
}

/// Styles of the command line help.
pub fn get_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects, Styles};
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr in a human readable format, or to `log_file` as json
/// lines if a file is given.
pub fn logging_setup(level: &tracing::Level, log_file: Option<std::fs::File>) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(*level)
        .with_target(false);
    match log_file {
        Some(file) => builder
            .json()
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
}
