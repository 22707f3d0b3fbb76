use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use citereport::{BibTex, Bibliography, StyleConfig};

/// CLI app for rendering bibliography entries into reference-list text
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Entries to render (.bib, or .json array of entry objects)
    #[arg(short, long)]
    input: PathBuf,
    /// Style options as a JSON object
    #[arg(short, long)]
    style: Option<PathBuf>,
    /// Extra style option, e.g. --set authorStyle=textbf (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    /// Produce HTML emphasis instead of LaTeX commands
    #[arg(long)]
    html: bool,
    /// Render every entry on its own, followed by its citation summary
    #[arg(long)]
    each: bool,
    /// Clean up harvested records before rendering
    #[arg(long)]
    tidy: bool,
    /// Output file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_entries(path: &Path) -> Result<Bibliography> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries from {:?}", path))?;
    let is_json = path.extension().map_or(false, |ext| ext == "json");
    let bibliography = if is_json {
        Bibliography::from_json_str(&content)
    } else {
        Bibliography::parse_bib(&content)
    }
    .with_context(|| format!("Failed to parse entries in {:?}", path))?;
    Ok(bibliography)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut bibliography = load_entries(&args.input)?;
    if bibliography.is_empty() {
        anyhow::bail!("No entries found in {:?}", args.input);
    }
    if args.tidy {
        bibliography.iter_mut().for_each(|entry| entry.tidy());
    }

    let mut config = match &args.style {
        Some(path) => StyleConfig::from_file(path)
            .with_context(|| format!("Failed to load style from {:?}", path))?,
        None => StyleConfig::new(),
    };
    for assignment in &args.overrides {
        config.apply_override(assignment)?;
    }
    if args.html {
        config.set("html", "true");
    }

    info!("Rendering {} entries", bibliography.len());
    let bibtex = BibTex::new(config);

    let output = if args.each {
        let rendered = bibtex.run_each(&bibliography)?;
        let mut output = String::new();
        for (entry, text) in bibliography.iter().zip(rendered) {
            output.push_str(&text);
            output.push_str("\n\n");
            if let Some(summary) = entry.citation_summary() {
                output.push_str(&summary);
                output.push_str("\n\n");
            }
        }
        output
    } else {
        bibtex.run(&bibliography)?
    };

    // Write output to file or stdout
    if let Some(output_file) = &args.output {
        fs::write(output_file, output)
            .with_context(|| format!("Failed to write output to {:?}", output_file))?;
        info!("Output written to {:?}", output_file);
    } else {
        println!("{}", output);
    }

    Ok(())
}
