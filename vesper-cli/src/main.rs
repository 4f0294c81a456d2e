use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vesper_core::{Compiler, execute};

#[derive(Parser, Debug)]
#[command(version, about = "Run or compile Vesper scripts", long_about = None)]
struct Cli {
    /// Script to run; reads stdin when omitted.
    #[arg(short, long)]
    input: Option<String>,

    /// Output path for compiled text. Defaults to `out.<ext>` for the
    /// chosen target.
    #[arg(short, long)]
    output: Option<String>,

    /// Compile for a target (python, javascript, lua) instead of
    /// running the script.
    #[arg(long, value_name = "TARGET")]
    emit: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    match &cli.emit {
        None => {
            let value = execute(&source)?;
            println!("{value}");
        }
        Some(target) => {
            let compiler = Compiler::new();
            let text = compiler.compile(&source, target)?;
            let path = match cli.output {
                Some(path) => path,
                None => {
                    let extension = compiler.extension(target).unwrap_or("txt");
                    format!("out.{extension}")
                }
            };
            write_output(&path, text.as_bytes())?;
            println!("wrote {path}");
        }
    }

    Ok(())
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}
