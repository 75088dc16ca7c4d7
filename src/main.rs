//! simdcsv - Fast SIMD CSV tokenizer
//!
//! Loads a CSV file, indexes its delimiters and reports throughput.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{debug, Level, LevelFilter, Log, Metadata, Record};
use simdcsv::{io::load, Backend, Delimiter, Table};

#[derive(Parser, Debug)]
#[command(name = "simdcsv")]
#[command(about = "A fast SIMD tokenizer for CSV files", long_about = None)]
struct Args {
    /// CSV file to parse
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump every row's fields
    #[arg(short, long)]
    dump: bool,

    /// Number of iterations for benchmarking
    #[arg(short, long, default_value = "100")]
    iterations: usize,

    /// Instruction set used for scanning
    #[arg(short, long, value_enum, default_value_t = BackendArg::Auto)]
    backend: BackendArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Auto,
    Scalar,
    Avx2,
    Neon,
}

impl BackendArg {
    fn resolve(self) -> Backend {
        match self {
            BackendArg::Auto => Backend::detect(),
            BackendArg::Scalar => Backend::Scalar,
            BackendArg::Avx2 => Backend::Avx2,
            BackendArg::Neon => Backend::Neon,
        }
    }
}

/// Writes log records to stderr; progress lines get the `[verbose]` prefix
struct StderrLogger;

fn level_prefix(level: Level) -> &'static str {
    match level {
        Level::Error => "[error]",
        Level::Warn => "[warning]",
        Level::Info | Level::Debug | Level::Trace => "[verbose]",
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {}", level_prefix(record.level()), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn dump_rows(table: &Table<'_>) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    for row in table.rows() {
        write!(out, "{}:", row.number())?;
        for field in row.fields() {
            write!(out, " [{}]", String::from_utf8_lossy(field))?;
        }
        writeln!(out)?;
    }
    out.flush()
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    debug!("loading {}", args.file.display());

    let buffer = match load(&args.file) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("Could not load the file {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    let backend = args.backend.resolve();

    // Warmup run
    let table = match Table::parse_with(&buffer, backend) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Could not index {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("number of rows             : {}", table.row_count());
        for kind in Delimiter::ALL {
            println!(
                "number of {:<8} found    : {}",
                format!("{:?}", kind).to_lowercase(),
                table.index().count(kind)
            );
        }
    }

    // Benchmark runs
    let mut total_time = 0.0;

    for _ in 0..args.iterations {
        let start = Instant::now();
        let _ = Table::parse_with(&buffer, backend);
        total_time += start.elapsed().as_secs_f64();
    }

    if args.dump {
        if let Err(e) = dump_rows(&table) {
            eprintln!("Could not write rows: {}", e);
            std::process::exit(1);
        }
    }

    let volume = args.iterations as f64 * buffer.len() as f64;

    if args.verbose {
        println!("Total time in (s)          = {:.6}", total_time);
        println!("Number of iterations       = {}", args.iterations);
    }

    if total_time > 0.0 {
        let gb_per_s = volume / total_time / (1024.0 * 1024.0 * 1024.0);
        println!(" GB/s: {:.5}", gb_per_s);
    }

    debug!("done");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines_use_verbose_prefix() {
        assert_eq!(level_prefix(Level::Debug), "[verbose]");
        assert_eq!(level_prefix(Level::Info), "[verbose]");
        assert_eq!(level_prefix(Level::Warn), "[warning]");
        assert_eq!(level_prefix(Level::Error), "[error]");
    }

    #[test]
    fn test_backend_arg_resolves() {
        assert_eq!(BackendArg::Auto.resolve(), Backend::detect());
        assert_eq!(BackendArg::Scalar.resolve(), Backend::Scalar);
        assert_eq!(BackendArg::Neon.resolve(), Backend::Neon);
    }
}
