mod error;

use std::{
    fs,
    io::{self, IsTerminal},
    path::PathBuf,
    process::ExitCode,
};

use asn1_sema::{AsnCompiler, Diagnostic};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::error::{to_error, AsnCompilerCache};

/// Check the structured types of ASN.1 modules: expand `COMPONENTS OF`,
/// assign automatic tags and verify that components can be told apart by
/// their tags.
#[derive(Parser, Debug)]
#[command(name = "asn1-sema", version, about)]
struct Args {
    /// ASN.1 source files, analysed together
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Accept keywords in lower case
    #[arg(long)]
    lowercase_keywords: bool,

    /// Accept non-ascii letters in identifiers
    #[arg(long)]
    unicode_identifiers: bool,

    /// Accept unicode whitespace between tokens
    #[arg(long)]
    unicode_whitespace: bool,

    /// Only check the sources, skip collecting default value constants
    #[arg(short, long)]
    semantic_check_only: bool,

    /// Print the resolved components of every structured type
    #[arg(long)]
    dump: bool,

    /// When to colour diagnostics
    #[arg(long, value_enum, default_value_t = Color::Auto)]
    color: Color,

    /// More verbose logging, can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    fn enabled(self) -> bool {
        match self {
            Color::Auto => io::stderr().is_terminal(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let color = args.color.enabled();

    let mut compiler = AsnCompiler::new();
    compiler.lowercase_keywords = args.lowercase_keywords;
    compiler.unicode_identifiers = args.unicode_identifiers;
    compiler.unicode_whitespace = args.unicode_whitespace;
    compiler.semantic_check_only = args.semantic_check_only;

    let mut failed = false;
    for path in &args.files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                error!(path = %path.display(), "unable to read file: {e}");
                failed = true;
                continue;
            }
        };

        if let Err(e) = compiler.add_file(path.display().to_string(), source) {
            emit(&compiler, &Diagnostic::from(&e), color);
            failed = true;
        }
    }

    if failed {
        return ExitCode::FAILURE;
    }

    let context = match compiler.analysis() {
        Ok(context) => context,
        Err(e) => {
            error!("internal compiler error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.dump {
        print!("{}", context.dump_components());
    }

    debug!(count = context.diagnostics().len(), "reporting diagnostics");
    for diagnostic in context.diagnostics() {
        emit(&context, diagnostic, color);
    }

    if context.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print a diagnostic to stderr, falling back to plain text when it has no
/// location in a source file
fn emit(compiler: &AsnCompiler, diagnostic: &Diagnostic, color: bool) {
    let printed = to_error(diagnostic, color)
        .and_then(|report| Ok(report.eprint(AsnCompilerCache::new(compiler))?));

    if printed.is_err() {
        eprintln!("{diagnostic}");
    }
}
