use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use procdb::Engine;
use tracing_subscriber::{EnvFilter, fmt};

/// In-memory process table driven by a line-oriented command language.
#[derive(Parser)]
#[command(name = "procdb", version, about)]
struct Cli {
    /// File of commands, one per line. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write results. Writes stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut engine = Engine::new();
    for line in reader.lines() {
        let line = line?;
        for out in engine.execute_line(line.trim_end_matches('\r')) {
            writeln!(writer, "{out}")?;
        }
    }
    writer.flush()?;

    Ok(())
}
