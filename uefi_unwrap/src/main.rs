use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;

/// Extract the vendor firmware images from a UEFI firmware management capsule
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the capsule
    input: PathBuf,

    /// Output path; each image gets its index inserted before the extension
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
    let unwrapped = fwunwrap::unwrap_capsule(&data)
        .with_context(|| format!("failed to unwrap {}", args.input.display()))?;

    if !args.quiet {
        print!("{}", unwrapped.trace);
    }
    if unwrapped.images.is_empty() {
        log::warn!("no images found in {}", args.input.display());
    }

    for (index, image) in unwrapped.images.iter().enumerate() {
        let path = index_file_name(&args.output, index);
        fs::write(&path, image).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote image {index}, {} bytes, to {}", image.len(), path.display());
    }
    Ok(())
}

/// `out.bin` -> `out.<index>.bin`, `out` -> `out.<index>`
fn index_file_name(base: &Path, index: usize) -> PathBuf {
    let Some(stem) = base.file_stem() else {
        return base.join(index.to_string());
    };
    let mut name = OsString::from(stem);
    name.push(format!(".{index}"));
    if let Some(ext) = base.extension() {
        name.push(".");
        name.push(ext);
    }
    base.with_file_name(name)
}

#[cfg(test)]
#[test]
fn test() {
    assert_eq!(index_file_name(Path::new("fw.bin"), 0), Path::new("fw.0.bin"));
    assert_eq!(index_file_name(Path::new("out/fw.cap.bin"), 3), Path::new("out/fw.cap.3.bin"));
    assert_eq!(index_file_name(Path::new("dir.d/fw"), 1), Path::new("dir.d/fw.1"));
    assert_eq!(index_file_name(Path::new("/"), 2), Path::new("/2"));
}
