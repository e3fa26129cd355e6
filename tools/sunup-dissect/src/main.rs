//! Decode an RSB MMIO trace into logical PMIC operations.
//!
//! Takes the CSV a watchpoint logger captured on the RSB register block
//! and prints one annotated line per reconstructed bus operation, so a
//! failing bring-up can be read back as "what did we ask the PMIC to do".

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod capture;
mod dissect;
mod rsb;

fn main() -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: sunup-dissect <capture.csv>");
    };
    let input = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let accesses = capture::parse_capture(&input)?;
    let operations = rsb::assemble(&accesses);
    info!(
        accesses = accesses.len(),
        operations = operations.len(),
        "assembled capture"
    );

    for operation in &operations {
        println!("{}", dissect::render(operation));
    }

    Ok(())
}
