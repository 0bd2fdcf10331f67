//! Deobfuscation round-trip through an external mapping-driven filter.
//!
//! The loaded sequence is serialized to canonical frame lines, piped through
//! the filter (ProGuard/R8 `retrace` by default) and re-assembled.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use stacknav_config::{DeobfuscatorConfig, MAPPING_PLACEHOLDER};

use crate::error::FilterError;
use crate::trace::{FrameSequence, TextLines, assemble_text};

/// Result of a successful deobfuscation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deobfuscated {
    pub frames: FrameSequence,
    /// The filter changed the number of frames; callers reset the cursor.
    pub count_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Deobfuscator {
    command: String,
    args: Vec<String>,
}

impl Deobfuscator {
    pub fn new(config: &DeobfuscatorConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    /// Program and arguments for `mapping`.
    ///
    /// `{mapping}` in any argument is replaced by the mapping path; when no
    /// argument carries the placeholder the path is appended.
    pub fn command_line(&self, mapping: &Path) -> Result<(String, Vec<String>), FilterError> {
        let mut argv = shell_words::split(&self.command)
            .map_err(|e| FilterError::InvalidCommand(format!("{}: {e}", self.command)))?;
        if argv.is_empty() {
            return Err(FilterError::InvalidCommand("empty command".to_string()));
        }
        let program = argv.remove(0);

        let mapping = mapping.display().to_string();
        let mut substituted = false;
        for arg in &self.args {
            if arg.contains(MAPPING_PLACEHOLDER) {
                substituted = true;
                argv.push(arg.replace(MAPPING_PLACEHOLDER, &mapping));
            } else {
                argv.push(arg.clone());
            }
        }
        if !substituted {
            argv.push(mapping);
        }
        Ok((program, argv))
    }

    /// Pipe `text` through the filter and return its standard output.
    pub async fn filter(&self, text: &str, mapping: &Path) -> Result<String, FilterError> {
        let (program, args) = self.command_line(mapping)?;
        log::info!("Running deobfuscator: {program} {}", args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FilterError::Spawn {
                command: program.clone(),
                source,
            })?;

        // Feed stdin while stdout is drained.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_string();
            tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await
            })
        });

        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::debug!("Deobfuscator closed stdin early: {e}"),
                Err(e) => log::error!("Deobfuscator stdin task failed: {e}"),
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::debug!("Deobfuscator stderr: {}", stderr.trim());
        }
        if !output.status.success() {
            log::warn!("Deobfuscator exited with {}", output.status);
            return Err(FilterError::EmptyOutput);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(FilterError::EmptyOutput);
        }
        Ok(stdout)
    }

    /// Serialize `sequence`, filter it and re-assemble the output.
    pub async fn deobfuscate(
        &self,
        sequence: &FrameSequence,
        mapping: &Path,
    ) -> Result<Deobfuscated, FilterError> {
        let output = self.filter(&sequence.serialize(), mapping).await?;
        let assembly = assemble_text(&TextLines::new(&output)).map_err(|e| {
            log::warn!("Deobfuscator output did not parse: {e}");
            FilterError::Unparseable
        })?;
        let count_changed = assembly.frames.len() != sequence.len();
        if count_changed {
            log::info!(
                "Deobfuscation changed frame count from {} to {}",
                sequence.len(),
                assembly.frames.len()
            );
        }
        Ok(Deobfuscated {
            frames: assembly.frames,
            count_changed,
        })
    }
}

impl Default for Deobfuscator {
    fn default() -> Self {
        Self::new(&DeobfuscatorConfig::default())
    }
}
