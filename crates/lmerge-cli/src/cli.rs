use std::path::PathBuf;

use clap::{ArgAction, Parser};

use lmerge_merge::LineOrder;

#[derive(Parser, Debug)]
#[command(
    name = "lmerge",
    about = "Merge already sorted text files into one sorted stream",
    version,
)]
pub struct Cli {
    /// Sorted input files; `-` reads standard input
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write merged lines here instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ordering every input is sorted by: lexicographic, reverse, numeric
    #[arg(long)]
    pub order: Option<LineOrder>,

    /// Bytes requested from an input per read
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// TOML file with `order` and a `[reader]` table
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log every line read and every merge decision (implies -vvv)
    #[arg(long)]
    pub trace: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
