// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete converters: in-process extraction plus ICS rendering, or an
//! external script that writes the calendar itself.
//!
//! [`CommandExtractor`] runs an external program for the extraction step
//! only, so the calendar is still rendered and validated here.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, info};

use aggieace_config::model::ConverterConfig;
use aggieace_core::{AggieError, ClassMetadata, ConversionOutput, Converter, Fingerprint, JobParams};

use crate::events::parse_extracted_events;
use crate::ics::{generate_ics, validate_ics};

/// Bytes of stderr kept in a script failure message.
const STDERR_TAIL: usize = 2048;

/// The model call: turns a document into `Name | Date | Time | Location` lines.
#[async_trait]
pub trait EventExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, document: &Path, metadata: &ClassMetadata) -> Result<String, AggieError>;
}

fn output_path(dir: &Path, fingerprint: &Fingerprint) -> PathBuf {
    dir.join(format!("{fingerprint}.ics"))
}

async fn ensure_dir(dir: &Path) -> Result<(), AggieError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AggieError::Conversion {
            message: format!("failed to create output directory {}: {e}", dir.display()),
            source: Some(Box::new(e)),
        })
}

/// Runs an [`EventExtractor`] and renders its output as iCalendar.
pub struct ExtractionConverter<E> {
    extractor: E,
    output_dir: PathBuf,
}

impl<E: EventExtractor> ExtractionConverter<E> {
    pub fn new(extractor: E, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl<E: EventExtractor> Converter for ExtractionConverter<E> {
    fn name(&self) -> &str {
        self.extractor.name()
    }

    async fn convert(&self, params: &JobParams) -> Result<ConversionOutput, AggieError> {
        let raw = self
            .extractor
            .extract(&params.document_path, &params.metadata)
            .await?;

        let events = parse_extracted_events(&raw, &params.metadata);
        debug!(
            fingerprint = %params.fingerprint,
            events = events.len(),
            "parsed extraction output"
        );

        let calendar_text = generate_ics(&events, &params.metadata)?;
        let event_count = validate_ics(&calendar_text)?;

        ensure_dir(&self.output_dir).await?;
        let path = output_path(&self.output_dir, &params.fingerprint);
        tokio::fs::write(&path, &calendar_text)
            .await
            .map_err(|e| AggieError::Conversion {
                message: format!("failed to write {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })?;

        info!(
            fingerprint = %params.fingerprint,
            event_count,
            path = %path.display(),
            "calendar written"
        );
        Ok(ConversionOutput {
            calendar_text,
            output_ref: Some(path.display().to_string()),
            event_count,
        })
    }
}

/// Spawns an external program that writes the `.ics` file.
///
/// The program receives the configured arguments followed by
/// `--pdf --class-name --section --start-date --end-date --timezone --output`.
#[derive(Debug, Clone)]
pub struct ScriptConverter {
    program: String,
    args: Vec<String>,
    output_dir: PathBuf,
}

impl ScriptConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.output_dir.clone(),
        )
    }

    fn job_args(params: &JobParams, output: &Path) -> Vec<String> {
        let mut args = document_args(&params.document_path, &params.metadata);
        args.push("--output".into());
        args.push(output.display().to_string());
        args
    }
}

fn document_args(document: &Path, meta: &ClassMetadata) -> Vec<String> {
    vec![
        "--pdf".into(),
        document.display().to_string(),
        "--class-name".into(),
        meta.class_name.clone(),
        "--section".into(),
        meta.section_number.clone(),
        "--start-date".into(),
        meta.semester_start.format("%m/%d/%Y").to_string(),
        "--end-date".into(),
        meta.semester_end.format("%m/%d/%Y").to_string(),
        "--timezone".into(),
        meta.timezone.clone(),
    ]
}

async fn run_program(
    program: &str,
    args: &[String],
    job_args: Vec<String>,
) -> Result<Vec<u8>, AggieError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .args(job_args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AggieError::Conversion {
            message: format!("failed to execute {program}: {e}"),
            source: Some(Box::new(e)),
        })?;

    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        return Err(AggieError::conversion(format!(
            "{program} exited with code {exit_code}: {}",
            stderr_tail(&output.stderr)
        )));
    }
    Ok(output.stdout)
}

/// Extracts events by running an external program and reading its stdout.
///
/// The program receives the configured arguments followed by
/// `--pdf --class-name --section --start-date --end-date --timezone` and
/// prints one `Name | Date | Time | Location` line per event.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

#[async_trait]
impl EventExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.program
    }

    async fn extract(&self, document: &Path, metadata: &ClassMetadata) -> Result<String, AggieError> {
        debug!(program = %self.program, document = %document.display(), "spawning extractor");
        let stdout = run_program(&self.program, &self.args, document_args(document, metadata)).await?;
        String::from_utf8(stdout).map_err(|e| AggieError::Conversion {
            message: format!("{} printed non-UTF-8 output", self.program),
            source: Some(Box::new(e)),
        })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let mut start = text.len().saturating_sub(STDERR_TAIL);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[async_trait]
impl Converter for ScriptConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, params: &JobParams) -> Result<ConversionOutput, AggieError> {
        ensure_dir(&self.output_dir).await?;
        let path = output_path(&self.output_dir, &params.fingerprint);

        debug!(program = %self.program, fingerprint = %params.fingerprint, "spawning converter");
        run_program(&self.program, &self.args, Self::job_args(params, &path)).await?;

        let calendar_text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AggieError::Conversion {
                message: format!("converter produced no calendar at {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })?;
        let event_count = validate_ics(&calendar_text)?;

        info!(
            fingerprint = %params.fingerprint,
            event_count,
            path = %path.display(),
            "calendar written"
        );
        Ok(ConversionOutput {
            calendar_text,
            output_ref: Some(path.display().to_string()),
            event_count,
        })
    }
}
