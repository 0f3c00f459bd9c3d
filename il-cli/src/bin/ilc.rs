//! `ilc run <file.il>` — parse, verify, and execute a Viper IL module
//! (spec.md §6.1). Exit code is the program's 64-bit return value truncated
//! to the host's exit range; an unhandled trap or verification failure
//! exits non-zero with diagnostics on stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use il_io::parse_module;
use il_support::SourceManager;
use il_verify::verify_module;
use il_vm::{RuntimeValue, Vm, VmConfig};

#[derive(Parser)]
#[command(name = "ilc")]
#[command(about = "Viper IL toolchain driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify and run a module, printing its return value's exit code.
    Run {
        file: PathBuf,
        /// Enable `[IL]` dispatch tracing on stdout (or set VIPER_TRACE_IL).
        #[arg(long)]
        trace_il: bool,
        /// Enable `[SRC]` source-line tracing on stdout (or set VIPER_TRACE_SRC).
        #[arg(long)]
        trace_src: bool,
        /// `path:line` breakpoint, may be repeated.
        #[arg(long = "break")]
        breakpoints: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, trace_il, trace_src, breakpoints } => run(&file, trace_il, trace_src, &breakpoints),
    }
}

fn run(path: &PathBuf, trace_il: bool, trace_src: bool, breakpoints: &[String]) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut sources = SourceManager::new();
    let file_id = sources.add_file(path);

    let module = match parse_module(&source, file_id) {
        Ok(m) => m,
        Err(diags) => {
            report(&sources, &diags);
            return ExitCode::FAILURE;
        }
    };

    if let Err(diags) = verify_module(&module) {
        report(&sources, &diags);
        return ExitCode::FAILURE;
    }

    let mut config = VmConfig::from_env();
    config.trace.il |= trace_il;
    config.trace.src |= trace_src;
    for spec in breakpoints {
        if let Some((file, line)) = spec.rsplit_once(':') {
            if let Ok(line) = line.parse() {
                config.breakpoints.push((file.to_string(), line));
            }
        }
    }

    let mut vm = Vm::new(&module, config);
    vm.attach_sources(&sources);

    match vm.run("main", Vec::new()) {
        Ok(value) => {
            let code = match value {
                RuntimeValue::Int(v) => v,
                _ => 0,
            };
            ExitCode::from((code & 0xFF) as u8)
        }
        Err(err) => {
            eprintln!("trap: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(sources: &SourceManager, diags: &il_support::Diagnostics) {
    for d in diags.iter() {
        let path = sources.get_path(d.location.file_id);
        let code = d.code.as_deref().unwrap_or("");
        eprintln!("{path}:{}:{}: {}[{code}]: {}", d.location.line, d.location.column, d.severity, d.message);
        if let Ok(contents) = std::fs::read_to_string(path) {
            if let Some(line) = contents.lines().nth(d.location.line.saturating_sub(1) as usize) {
                eprintln!("  {line}");
                eprintln!("  {}^", " ".repeat(d.location.column.saturating_sub(1) as usize));
            }
        }
    }
}
