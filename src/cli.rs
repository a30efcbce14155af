use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "marksheet",
    version,
    about = "Marksheet OCR grid correction and structural decoding tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Decode(DecodeArgs),
    Inspect(InspectArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    #[arg(long)]
    pub input_csv: PathBuf,

    #[arg(long, default_value = ".cache/marksheet")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "student_marks.csv")]
    pub output_csv: PathBuf,

    #[arg(long)]
    pub alias_output_csv: Option<PathBuf>,

    #[arg(long)]
    pub subject_catalog: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    pub header_row: usize,

    #[arg(long, default_value_t = 3)]
    pub data_start_row: usize,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long)]
    pub input_csv: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub header_row: usize,

    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/marksheet")]
    pub cache_root: PathBuf,
}
