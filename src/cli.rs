use crate::config::load_config;
use crate::diagram::Diagram;
use crate::ir::DiagramDocument;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::measure::default_measurer;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dfl",
    version,
    about = "Lay out nested, collapsible container diagrams"
)]
pub struct Args {
    /// Input document (.json / .json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout settings JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Collapse this node after loading (repeatable)
    #[arg(long = "collapse", value_name = "ID")]
    pub collapse: Vec<String>,

    /// Expand this node after loading (repeatable)
    #[arg(long = "expand", value_name = "ID")]
    pub expand: Vec<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let document = DiagramDocument::parse(&input).context("failed to parse diagram document")?;
    let measurer = default_measurer(&config.text);
    let mut diagram = Diagram::from_document(&document, config, measurer)?;

    for key in &args.collapse {
        let id = find(&diagram, key)?;
        diagram.collapse(id)?;
    }
    for key in &args.expand {
        let id = find(&diagram, key)?;
        diagram.expand(id)?;
    }

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &diagram)?,
        None => {
            let dump = LayoutDump::from_diagram(&diagram);
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dump)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn find(diagram: &Diagram, key: &str) -> Result<crate::diagram::NodeId> {
    diagram
        .find(key)
        .ok_or_else(|| anyhow::anyhow!("no node with id `{key}`"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_toggles() {
        let args = Args::try_parse_from([
            "dfl", "-i", "d.json5", "--collapse", "a", "--collapse", "b", "--expand", "c", "-vv",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("d.json5")));
        assert_eq!(args.collapse, vec!["a", "b"]);
        assert_eq!(args.expand, vec!["c"]);
        assert_eq!(args.verbose, 2);
        assert!(args.output.is_none());
    }
}
