//! Dump the catalog of a BMD file and sample its first variable.
//!
//! Usage: cargo run --example inspect_bmd -- path/to/output.bmd

use bmd_parser::BmdReader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: inspect_bmd <file.bmd>")?;

    println!("Reading BMD file: {path}");
    let mut reader = BmdReader::open(&path)?;

    println!("\n=== Header ===");
    println!("{}", reader.header());
    println!("seed date: {}", reader.seed_date().format("%Y-%m-%d %H:%M:%S"));

    println!("\n=== Variables ({}) ===", reader.variables().len());
    for variable in reader.variables() {
        let min = reader.variable_min(variable.name());
        let max = reader.variable_max(variable.name());
        match (min, max) {
            (Ok(min), Ok(max)) => println!(
                "#{:<3} {:<18} [{}] pcode={} range {:.3} to {:.3}",
                variable.index() + 1,
                variable.name(),
                variable.units(),
                variable.pcode(),
                min,
                max
            ),
            _ => println!(
                "#{:<3} {:<18} [{}] pcode={}",
                variable.index() + 1,
                variable.name(),
                variable.units(),
                variable.pcode()
            ),
        }
    }

    println!("\n=== Segments ({}) ===", reader.segments().len());
    for segment in reader.segments() {
        println!("#{:<3} {}", segment.index() + 1, segment.name());
    }

    let steps = reader.time_steps();
    println!("\n=== Time steps ({}) ===", steps.len());
    if let (Some(first), Some(last)) = (steps.first(), steps.last()) {
        println!("{} to {}", first, last);
    }

    if !reader.variables().is_empty()
        && !reader.segments().is_empty()
        && !reader.time_steps().is_empty()
    {
        println!("\n=== First variable, first segment ===");
        let concentrations = reader
            .new_query()
            .with_variable_indices([0])
            .with_segment_indices([0])
            .with_all_time_steps()
            .execute()?;
        for concentration in &concentrations {
            println!(
                "{}, {}, {}: {}",
                concentration.variable().name(),
                concentration.segment().name(),
                concentration.time_step(),
                concentration.value()
            );
        }
    }

    Ok(())
}
