use anyhow::Result;
use bitmap_transform::{SegmentDecl, DEFAULT_SEGMENT, DEFAULT_SEGMENT_MACRO};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

mod converter;
mod pipeline;

use converter::ImageConverter;
use pipeline::PipelineConfig;

#[derive(Parser)]
#[command(name = "bitmap-asset-tool")]
#[command(about = "Converts images into bit-reversed, segment-qualified firmware bitmap arrays")]
#[command(version = "0.1.0")]
struct Cli {
    /// Image files to convert
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Image conversion command to invoke
    #[arg(long, default_value = "magick")]
    converter: String,

    /// Storage-class macro wrapping the generated array
    #[arg(long, default_value = DEFAULT_SEGMENT_MACRO)]
    segment_macro: String,

    /// Memory segment the array is placed in
    #[arg(long, default_value = DEFAULT_SEGMENT)]
    segment: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Bitmap Asset Tool v0.1.0");

    let config = PipelineConfig {
        converter: ImageConverter::new(&cli.converter),
        decl: SegmentDecl {
            macro_name: cli.segment_macro,
            segment: cli.segment,
            ..SegmentDecl::default()
        },
    };

    let pb = ProgressBar::new(cli.images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );

    let summary = pipeline::run_batch(&config, &cli.images, &pb).await;
    pb.finish_and_clear();

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} input(s) failed",
            summary.failed,
            cli.images.len()
        );
    }

    println!("Converted {} image(s) successfully!", summary.processed);
    Ok(())
}
