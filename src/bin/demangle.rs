use std::fs::File;
use std::env;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use cxx_demangle_filter::{
    demangle, filter_lines, DemangleFlags, ExitCode, ItaniumDemangler, LineScanner,
};

const EXIT_CODES: &str = "\
demangle will set the appropriate exit code:
0 - success
1 - this message printed
2 - out of memory
3 - invalid symbol name
4 - invalid argument
5 - unknown error
6 - failed to open input file
7 - failed to create output file
8 - failed to read or write while processing a file";

/// Demangle a single C++ symbol, or all symbols in a file.
///
/// Examples:
///   demangle _ZN12SignalReader10onActivityEPN4maux6WaiterEi
///   demangle --brackets --file source.log destination.log
#[derive(Parser)]
#[command(name = "demangle", verbatim_doc_comment, after_help = EXIT_CODES)]
struct Opts {
    /// Surround demangled names with square brackets.
    #[arg(long)]
    brackets: bool,

    /// Process all mangled names in SOURCE and write the result to
    /// DESTINATION. Either may be `-` for stdin or stdout.
    #[arg(long, num_args = 2, value_names = ["SOURCE", "DESTINATION"], conflicts_with = "symbol")]
    file: Option<Vec<PathBuf>>,

    /// Leave out function parameter lists.
    #[arg(long)]
    no_params: bool,

    /// Leave out the return types of template functions.
    #[arg(long)]
    no_return_type: bool,

    /// Print literals in template arguments without their type.
    #[arg(long)]
    hide_expression_literal_types: bool,

    /// The mangled symbol to demangle.
    symbol: Option<String>,
}

impl Opts {
    fn flags(&self) -> DemangleFlags {
        let mut flags = DemangleFlags::COMPLETE;
        flags.set(DemangleFlags::NO_PARAMS, self.no_params);
        flags.set(DemangleFlags::NO_RETURN_TYPE, self.no_return_type);
        flags.set(
            DemangleFlags::HIDE_EXPRESSION_LITERAL_TYPES,
            self.hide_expression_literal_types,
        );
        flags
    }
}

fn main() -> process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    process::ExitCode::from(run().code())
}

fn run() -> ExitCode {
    // A lone argument that isn't a `--` option is always a symbol, even
    // one that starts with a single `-`.
    let args: Vec<_> = env::args_os().skip(1).collect();
    if let [symbol] = args.as_slice() {
        if let Some(symbol) = symbol.to_str().filter(|s| !s.starts_with("--")) {
            return demangle_one(symbol, DemangleFlags::COMPLETE);
        }
    }

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            // Help and usage errors both count as "this message printed".
            // If even that can't be written there is nobody left to tell.
            let _ = err.print();
            return ExitCode::Help;
        }
    };
    let flags = opts.flags();
    debug!("demangle flags: {:?}", flags);

    match (&opts.file, &opts.symbol) {
        (Some(paths), _) => match paths.as_slice() {
            [source, destination] => demangle_file(source, destination, opts.brackets, flags),
            _ => {
                println!("Source and destination file names expected. Use --help for help.");
                ExitCode::Help
            }
        },
        (None, Some(symbol)) => demangle_one(symbol, flags),
        (None, None) => {
            println!("Nothing to do. Use --help for help.");
            ExitCode::Help
        }
    }
}

fn demangle_one(symbol: &str, flags: DemangleFlags) -> ExitCode {
    match demangle(symbol, flags) {
        Ok(name) => {
            println!("{}", name);
            ExitCode::Success
        }
        Err(err) => {
            debug!("failed to demangle {:?}: {}", symbol, err);
            println!("{}", err.placeholder());
            ExitCode::from(err)
        }
    }
}

fn demangle_file(
    source: &Path,
    destination: &Path,
    brackets: bool,
    flags: DemangleFlags,
) -> ExitCode {
    let reader = match open_source(source) {
        Ok(reader) => reader,
        Err(err) => {
            println!("{:#}", err);
            return ExitCode::NoInputFile;
        }
    };
    let writer = match create_destination(destination) {
        Ok(writer) => writer,
        Err(err) => {
            println!("{:#}", err);
            return ExitCode::NoOutputFile;
        }
    };

    let scanner = LineScanner::new(ItaniumDemangler::new(flags));
    let stats = filter_lines(reader, writer, &scanner, brackets).with_context(|| {
        format!(
            "Failed while processing {} into {}",
            source.display(),
            destination.display()
        )
    });
    match stats {
        Ok(stats) => {
            info!(
                "{} line(s) processed, {} name(s) demangled",
                stats.lines, stats.translated
            );
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::IoFailure
        }
    }
}

fn is_std_stream(path: &Path) -> bool {
    path == Path::new("-")
}

fn open_source(path: &Path) -> Result<Box<dyn BufRead>> {
    if is_std_stream(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn create_destination(path: &Path) -> Result<Box<dyn Write>> {
    if is_std_stream(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
