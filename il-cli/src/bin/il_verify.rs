//! `il-verify <file.il>` — parse and verify a module, printing `OK` on
//! success or one diagnostic line per failure to stderr (spec.md §6.1).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use il_io::parse_module;
use il_support::SourceManager;
use il_verify::verify_module;

#[derive(Parser)]
#[command(name = "il-verify")]
#[command(about = "Parse and verify a Viper IL module", long_about = None)]
struct Cli {
    /// Path to the `.il` file to check
    file: Option<PathBuf>,

    /// Print the IL version banner and exit
    #[arg(long)]
    version: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.version {
        println!("il 0.1");
        return ExitCode::SUCCESS;
    }

    let Some(path) = cli.file else {
        eprintln!("error: missing required argument <file>");
        return ExitCode::FAILURE;
    };

    let source = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut sources = SourceManager::new();
    let file_id = sources.add_file(&path);

    let module = match parse_module(&source, file_id) {
        Ok(m) => m,
        Err(diags) => {
            report(&sources, &diags);
            return ExitCode::FAILURE;
        }
    };

    match verify_module(&module) {
        Ok(()) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Err(diags) => {
            report(&sources, &diags);
            ExitCode::FAILURE
        }
    }
}

/// Renders each diagnostic as `file:line:column: severity[code]: message`
/// (spec.md §7), echoing the source line when the file can still be read.
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
