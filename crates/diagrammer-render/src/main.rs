//! Headless export: load a Diagrammer JSON document and write SVG, PNG or JPG.

use clap::Parser;
use diagrammer_core::{DiagramDocument, Editor, EditorConfig, EditorError, ExportFormat};
use diagrammer_render::ResvgRasterizer;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "diagrammer-export", version, about = "Export a Diagrammer document")]
struct Args {
    /// Input document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    input: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output format (svg, png, jpg). Inferred from the output extension when omitted.
    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    /// Pixels per diagram unit for raster formats
    #[arg(short = 's', long = "scale", default_value_t = 2.0)]
    scale: f32,

    /// Editor configuration JSON (partial overrides are fine)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error on {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error(transparent)]
    Editor(#[from] EditorError),
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let io_err = |source| CliError::Io {
        path: path.display().to_string(),
        source,
    };
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(io_err)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).map_err(io_err)
    }
}

fn output_format(args: &Args) -> Result<ExportFormat, CliError> {
    let name = args.format.clone().or_else(|| {
        args.output
            .as_ref()
            .and_then(|p| p.extension())
            .map(|ext| ext.to_string_lossy().into_owned())
    });
    match name {
        Some(name) => Ok(ExportFormat::from_name(&name)?),
        None => Ok(ExportFormat::Svg),
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_json(&read_input(path)?)?,
        None => EditorConfig::default(),
    };
    let document = DiagramDocument::from_json(&read_input(&args.input)?)?;

    let format = output_format(args)?;
    let mut editor = Editor::new(config);
    editor.load_document(document);
    editor.set_rasterizer(Box::new(ResvgRasterizer::new(args.scale)));
    let image = editor.export(format)?;

    match &args.output {
        Some(path) => std::fs::write(path, &image.data).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?,
        None => io::stdout()
            .write_all(&image.data)
            .map_err(|source| CliError::Io {
                path: "<stdout>".to_string(),
                source,
            })?,
    }
    log::info!("Wrote {} bytes of {}", image.data.len(), image.mime());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("diagrammer-export: {err}");
            ExitCode::FAILURE
        }
    }
}
