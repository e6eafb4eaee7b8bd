use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use duet::Instruction;
use tracing::{error, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Standalone,
    Cooperative,
    Both,
}

#[derive(Debug, Parser)]
struct App {
    /// Path to a program, one instruction per line.
    pub program: PathBuf,
    /// Which execution mode to run.
    #[arg(short, long, value_enum, default_value_t = Mode::Both)]
    pub mode: Mode,
    /// Increase log verbosity, may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Runs every selected mode and writes its result to `out`. A failing mode is
/// logged and does not stop the others; the first failure is returned at the end.
fn report(
    mode: Mode,
    program: &[Instruction],
    out: &mut impl Write,
) -> Result<(), anyhow::Error> {
    let mut failure = None;

    if matches!(mode, Mode::Standalone | Mode::Both) {
        match duet::run_standalone(program) {
            Ok(recovered) => writeln!(out, "First recovered value: {recovered}")?,
            Err(e) => {
                error!(error = %e, "standalone run failed");
                failure.get_or_insert(anyhow::Error::new(e).context("Standalone run failed"));
            }
        }
    }

    if matches!(mode, Mode::Cooperative | Mode::Both) {
        match duet::run_cooperative(program) {
            Ok(sent) => writeln!(out, "Values sent by program 1: {sent}")?,
            Err(e) => {
                error!(error = %e, "cooperative run failed");
                failure.get_or_insert(anyhow::Error::new(e).context("Cooperative run failed"));
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> Result<(), anyhow::Error> {
    let app = App::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(app.verbose))
        .with_writer(std::io::stderr)
        .init();

    let source = std::fs::read_to_string(&app.program)
        .with_context(|| format!("Failed to read '{}'", app.program.display()))?;
    let program = duet::decode_program(&source)
        .with_context(|| format!("Failed to decode '{}'", app.program.display()))?;

    report(app.mode, &program, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use duet::{decode_program, CPUError};

    use super::{log_level, report, App, Mode};

    fn report_to_string(mode: Mode, source: &str) -> (String, Result<(), anyhow::Error>) {
        let program = decode_program(source).unwrap();
        let mut out = Vec::new();
        let result = report(mode, &program, &mut out);

        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let app = App::try_parse_from(["duet-runner", "input.txt"]).unwrap();

        assert_eq!(app.mode, Mode::Both);
        assert_eq!(app.verbose, 0);
        assert_eq!(log_level(app.verbose), tracing::Level::WARN);
    }

    #[test]
    fn mode_and_verbosity() {
        let app =
            App::try_parse_from(["duet-runner", "-vv", "--mode", "cooperative", "input.txt"])
                .unwrap();

        assert_eq!(app.mode, Mode::Cooperative);
        assert_eq!(log_level(app.verbose), tracing::Level::DEBUG);
    }

    #[test]
    fn both_modes() {
        let (out, result) = report_to_string(Mode::Both, "snd 4\nrcv a\njgz a 2\nrcv 1\n");

        assert!(result.is_ok());
        assert_eq!(out, "First recovered value: 4\nValues sent by program 1: 1\n");
    }

    #[test]
    fn cooperative_reported_when_standalone_fails() {
        let source = "snd 1\nsnd 2\nsnd p\nrcv a\nrcv b\nrcv c\nrcv d\n";
        let (out, result) = report_to_string(Mode::Both, source);

        assert_eq!(out, "Values sent by program 1: 3\n");

        let error = result.unwrap_err();

        assert_eq!(error.to_string(), "Standalone run failed");
        assert_eq!(
            error.downcast_ref::<CPUError>(),
            Some(&CPUError::NothingRecovered)
        );
    }

    #[test]
    fn standalone_reported_when_cooperative_fails() {
        let (out, result) = report_to_string(Mode::Both, "snd 7\nrcv 3\n");

        assert_eq!(out, "First recovered value: 7\n");
        assert_eq!(result.unwrap_err().to_string(), "Cooperative run failed");
    }

    #[test]
    fn single_mode() {
        let source = "snd 1\nsnd 2\nsnd p\nrcv a\nrcv b\nrcv c\nrcv d\n";
        let (out, result) = report_to_string(Mode::Cooperative, source);

        assert!(result.is_ok());
        assert_eq!(out, "Values sent by program 1: 3\n");
    }
}
