use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Extract the raw image from a nested firmware image container
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the firmware image container
    input: PathBuf,

    /// Path to write the extracted image to
    output: PathBuf,

    /// Don't print the parsed headers
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let data = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let unwrapped = fwunwrap::unwrap_image(&data)
        .with_context(|| format!("failed to unwrap {}", args.input.display()))?;

    if !args.quiet {
        print!("{}", unwrapped.trace);
    }

    fs::write(&args.output, unwrapped.image)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!(
        "wrote {} bytes to {}",
        unwrapped.image.len(),
        args.output.display()
    );
    Ok(())
}
