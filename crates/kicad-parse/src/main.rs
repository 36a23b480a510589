use clap::Parser;
use kicad_parse::{load_file, parse_document, Document};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kicad-dump", about = "Parse KiCad files to JSON")]
struct Cli {
    /// Input file (.kicad_pcb or .kicad_sch)
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override extension-based detection (board, schematic)
    #[arg(short, long)]
    format: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = if let Some(fmt) = &cli.format {
        if !matches!(fmt.as_str(), "board" | "schematic") {
            eprintln!("Error: unknown format: {fmt}. Use: board, schematic");
            std::process::exit(1);
        }
        let text = match std::fs::read_to_string(&cli.input) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error reading file: {e}");
                std::process::exit(1);
            }
        };
        let parsed = parse_document(&text);
        match (fmt.as_str(), &parsed) {
            ("board", Ok(Document::Board(_)))
            | ("schematic", Ok(Document::Schematic(_)))
            | (_, Err(_)) => parsed,
            (expected, Ok(_)) => {
                eprintln!("Error: file is not a {expected} document");
                std::process::exit(1);
            }
        }
    } else {
        load_file(&cli.input)
    };

    match result {
        Ok(document) => {
            let json = if cli.pretty {
                serde_json::to_string_pretty(&document)
            } else {
                serde_json::to_string(&document)
            };
            let json = match json {
                Ok(j) => j,
                Err(e) => {
                    eprintln!("Error serializing: {e}");
                    std::process::exit(1);
                }
            };
            match &cli.output {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, json) {
                        eprintln!("Error writing output: {e}");
                        std::process::exit(1);
                    }
                }
                None => println!("{json}"),
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
