use clap::Parser;
use std::path::{Path, PathBuf};

use docxside_forms::{BorderStyle, Config, Error, RadioHandling, config::parse_color};

#[derive(Parser)]
#[command(
    name = "docxside-forms",
    about = "Turn {{kind:name|options}} placeholders in a DOCX file into a fillable PDF"
)]
struct Args {
    /// Input DOCX file
    input: PathBuf,
    /// Output PDF file (defaults to <input stem>_fillable.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// What to do when a radio button cannot be created
    #[arg(long, value_enum, default_value_t = RadioHandling::Fallback)]
    radio_handling: RadioHandling,
    /// Border color of required fields, "r,g,b" in 0..1 or 0..255
    #[arg(long)]
    required_border_color: Option<String>,
    /// Border color of optional fields, "r,g,b" in 0..1 or 0..255
    #[arg(long)]
    default_border_color: Option<String>,
    #[arg(long, default_value_t = BorderStyle::REQUIRED.width)]
    required_border_width: f32,
    #[arg(long, default_value_t = BorderStyle::DEFAULT.width)]
    default_border_width: f32,
}

fn build_config(args: &Args) -> Result<Config, Error> {
    let mut config = Config {
        radio_handling: args.radio_handling,
        ..Config::default()
    };
    if let Some(color) = &args.required_border_color {
        config.required_border.color = parse_color(color)?;
    }
    if let Some(color) = &args.default_border_color {
        config.default_border.color = parse_color(color)?;
    }
    for width in [args.required_border_width, args.default_border_width] {
        if width.is_nan() || width < 0.0 {
            return Err(Error::Config(format!("border width {width} must be non-negative")));
        }
    }
    config.required_border.width = args.required_border_width;
    config.default_border.width = args.default_border_width;
    Ok(config)
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_fillable.pdf"))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    match docxside_forms::convert_docx_to_fillable_pdf(&args.input, &output, &config) {
        Ok(report) => {
            for skipped in &report.skipped {
                eprintln!("Skipped '{}' on page {}: {}", skipped.raw, skipped.page + 1, skipped.error);
            }
            println!(
                "{} field(s) written to {}",
                report.fields.len(),
                output.display()
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
