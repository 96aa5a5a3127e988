use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context};
use tracing::{debug, info};

use lmerge_merge::merge_all_traced;
use lmerge_reader::{AsyncLineReader, ByteSource, IoSource};
use lmerge_types::{BoxedReader, LineReader, LineReaderExt, TracingSink};

use crate::cli::Cli;
use crate::config::MergeConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = MergeConfig::resolve(&cli)?;
    let trace = cli.trace.then(|| TracingSink::shared("lmerge"));

    if cli.inputs.iter().filter(|p| is_stdin(p)).count() > 1 {
        bail!("standard input (`-`) can only be merged once");
    }

    let mut leaves: Vec<BoxedReader> = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        let opened = open_source(path)
            .with_context(|| format!("cannot open {}", path.display()))
            .and_then(|source| {
                AsyncLineReader::with_config(Some(source), trace.clone(), config.reader.clone())
                    .with_context(|| format!("cannot read {}", path.display()))
            });
        match opened {
            Ok(reader) => leaves.push(reader.boxed()),
            Err(e) => {
                close_all(leaves);
                return Err(e);
            }
        }
    }
    debug!(inputs = leaves.len(), order = %config.order, "inputs opened");

    let mut root = merge_all_traced(config.order.predicate(), leaves, trace);
    let written = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()));
            file.and_then(|f| write_lines(&mut root, BufWriter::new(f)))
        }
        None => write_lines(&mut root, BufWriter::new(io::stdout().lock())),
    };
    let closed = root.close().context("closing inputs");

    let lines = written?;
    closed?;
    info!(lines, "merge complete");
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_source(path: &Path) -> io::Result<Box<dyn ByteSource>> {
    if is_stdin(path) {
        return Ok(Box::new(IoSource::new(io::stdin())));
    }
    Ok(Box::new(IoSource::open(path)?))
}

/// Drain `reader` into `out`, one line per row. Returns the number of lines.
fn write_lines<R: LineReader, W: Write>(reader: &mut R, mut out: W) -> anyhow::Result<u64> {
    let mut count = 0u64;
    for line in reader.lines() {
        let line = line.context("reading merged input")?;
        writeln!(out, "{line}").context("writing output")?;
        count += 1;
    }
    out.flush().context("writing output")?;
    Ok(count)
}

fn close_all(leaves: Vec<BoxedReader>) {
    for mut leaf in leaves {
        if let Err(e) = leaf.close() {
            debug!(error = %e, "closing input after failed open");
        }
    }
}
