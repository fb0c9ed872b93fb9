use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Boundary to the external image conversion utility.
///
/// Only its contract matters here: invoked as `<program> <input> xbm:<output>`
/// it must leave a text file at `output` containing a single C-style
/// `static char <name>[] = { ... };` byte-array declaration. ImageMagick's
/// `magick` (or legacy `convert`) satisfies this with its XBM writer.
pub struct ImageConverter {
    program: String,
}

impl ImageConverter {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Runs the converter and waits for it to exit. The tool is assumed to
    /// terminate; no timeout is applied.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg(input)
            .arg(format!("xbm:{}", output.display()))
            .status()
            .await
            .with_context(|| format!("Failed to run image converter `{}`", self.program))?;

        if !status.success() {
            anyhow::bail!("Image converter `{}` exited with {}", self.program, status);
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            anyhow::bail!("Image converter produced no output at {:?}", output);
        }

        Ok(())
    }
}
