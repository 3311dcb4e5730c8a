use anyhow::{Context, Result};
use mdtables::{artifact, extract};
use std::{env, fs, path::PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

fn print_usage_and_exit(program: &str) -> ! {
    eprintln!("Usage: {} <input.md> [output-dir]", program);
    std::process::exit(1);
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .init();

    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "extract_tables".into());
    let input = match args.next() {
        Some(i) => PathBuf::from(i),
        None => print_usage_and_exit(&prog),
    };
    let out_dir = args.next().map(PathBuf::from);

    let bytes =
        fs::read(&input).with_context(|| format!("reading `{}`", input.display()))?;
    let text = extract::validate_markdown(&bytes)?;
    let tables = extract::extract_tables(text);

    if tables.is_empty() {
        eprintln!("No tables found in {}", input.display());
        std::process::exit(1);
    }

    match out_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating `{}`", dir.display()))?;
            artifact::write_artifact(&dir, &tables)?;
            println!(
                "Wrote {} table{} to {}",
                tables.len(),
                if tables.len() == 1 { "" } else { "s" },
                dir.join(artifact::ARTIFACT_NAME).display()
            );
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
    }

    Ok(())
}
