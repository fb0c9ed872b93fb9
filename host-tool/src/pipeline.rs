use anyhow::{Context, Result};
use bitmap_transform::{transform_array, SegmentDecl};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::converter::ImageConverter;

/// Explicit per-run configuration; nothing is read from the environment.
pub struct PipelineConfig {
    pub converter: ImageConverter,
    pub decl: SegmentDecl,
}

/// Outcome of a batch run over the input list.
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Output path: same stem as the input, header-file extension.
pub fn output_path(input: &Path) -> PathBuf {
    let mut output = input.to_path_buf();
    output.set_extension("h");
    output
}

/// Runs one input through the full pipeline: convert, read, transform the
/// array elements, rewrite the declaration, write back.
///
/// The read completes before the write begins, and a failed transform never
/// reaches the write, so on failure the converter's output is left on disk
/// exactly as produced.
pub async fn process_file(config: &PipelineConfig, input: &Path) -> Result<PathBuf> {
    let output = output_path(input);

    config
        .converter
        .convert(input, &output)
        .await
        .with_context(|| format!("Conversion failed for {:?}", input))?;

    let text = fs::read_to_string(&output)
        .await
        .with_context(|| format!("Failed to read converter output {:?}", output))?;
    let text = text.replace("\r\n", "\n");

    let transformed = transform_array(&text)
        .with_context(|| format!("Malformed converter output in {:?}", output))?;
    let rewritten = config.decl.rewrite(&transformed);

    fs::write(&output, rewritten)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    Ok(output)
}

/// Processes every input in order. A failed input is reported and counted;
/// it never stops the batch.
pub async fn run_batch(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    progress: &ProgressBar,
) -> BatchSummary {
    let mut summary = BatchSummary {
        processed: 0,
        failed: 0,
    };

    for input in inputs {
        progress.set_message(input.display().to_string());
        match process_file(config, input).await {
            Ok(output) => {
                summary.processed += 1;
                progress.println(format!("✅ {:?} -> {:?}", input, output));
            }
            Err(err) => {
                summary.failed += 1;
                progress.println(format!("❌ {:?}: {:#}", input, err));
            }
        }
        progress.inc(1);
    }

    summary
}
