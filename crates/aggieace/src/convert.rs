// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `aggieace convert`: one syllabus through cache, queue and converter.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aggieace_calendar::{CommandExtractor, ExtractionConverter, ScriptConverter};
use aggieace_config::AggieConfig;
use aggieace_config::model::{ConverterConfig, ConverterMode};
use aggieace_core::{AggieError, ClassMetadata, Converter, JobId, JobStatus};
use aggieace_queue::{ConversionService, ConversionWorker, JobQueue, RateLimiter, Submission};
use aggieace_storage::SqliteCache;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Syllabus document to convert.
    #[arg(long)]
    pub pdf: PathBuf,

    /// Course name, e.g. "CSCE 311".
    #[arg(long)]
    pub class_name: String,

    /// Section number, e.g. "546".
    #[arg(long)]
    pub section: String,

    /// First day of the semester (MM/DD/YYYY).
    #[arg(long)]
    pub start_date: String,

    /// Last day of the semester (MM/DD/YYYY).
    #[arg(long)]
    pub end_date: String,

    /// IANA timezone; defaults to `converter.default_timezone`.
    #[arg(long)]
    pub timezone: Option<String>,

    /// Where to write the `.ics` file.
    #[arg(long)]
    pub output: PathBuf,
}

/// What `convert` produced.
#[derive(Debug)]
pub struct ConvertOutcome {
    pub output: PathBuf,
    pub from_cache: bool,
}

/// Build the conversion stack from `config`, convert `args.pdf` and write
/// the calendar to `args.output`.
pub async fn run_convert(
    config: &AggieConfig,
    args: &ConvertArgs,
    shutdown: CancellationToken,
) -> Result<ConvertOutcome, AggieError> {
    let timezone = args
        .timezone
        .as_deref()
        .unwrap_or(&config.converter.default_timezone);
    let metadata = ClassMetadata::parse(
        &args.class_name,
        &args.section,
        &args.start_date,
        &args.end_date,
        timezone,
    )?;
    let converter = build_converter(&config.converter)?;

    let cache = Arc::new(SqliteCache::new(config.storage.clone()));
    cache.initialize().await?;

    let limiter = Arc::new(RateLimiter::new(config.rate_limit));
    let worker = ConversionWorker::new(converter, config.queue.conversion_timeout());
    let queue = JobQueue::new(limiter, worker, cache.clone(), &config.queue);
    let scheduler_token = shutdown.child_token();
    let scheduler = queue.start(scheduler_token.clone());
    let service = ConversionService::new(queue, cache.clone());

    let result = async {
        let (calendar_text, from_cache) = match service.request(&args.pdf, metadata).await? {
            Submission::Cached(entry) => {
                info!(fingerprint = %entry.fingerprint, "using cached calendar");
                (entry.calendar_text, true)
            }
            Submission::Queued(receipt) => {
                info!(
                    job_id = %receipt.job_id,
                    position = receipt.position,
                    "conversion queued"
                );
                (wait_for_job(&service, &receipt.job_id, &shutdown).await?, false)
            }
        };
        write_output(&args.output, &calendar_text).await?;
        Ok(ConvertOutcome {
            output: args.output.clone(),
            from_cache,
        })
    }
    .await;

    scheduler_token.cancel();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "rate limit scheduler ended abnormally");
    }
    if let Err(e) = cache.close().await {
        warn!(error = %e, "failed to checkpoint cache database");
    }

    result
}

/// The converter selected by `converter.mode`.
fn build_converter(config: &ConverterConfig) -> Result<Arc<dyn Converter>, AggieError> {
    if config.program.trim().is_empty() {
        return Err(AggieError::Config("converter.program is empty".into()));
    }
    let converter: Arc<dyn Converter> = match config.mode {
        ConverterMode::Script => Arc::new(ScriptConverter::from_config(config)),
        ConverterMode::Extract => Arc::new(ExtractionConverter::new(
            CommandExtractor::from_config(config),
            &config.output_dir,
        )),
    };
    Ok(converter)
}

/// Poll `job_id` until it reaches a terminal state or `shutdown` fires.
async fn wait_for_job(
    service: &ConversionService,
    job_id: &JobId,
    shutdown: &CancellationToken,
) -> Result<String, AggieError> {
    let mut last_position = None;
    loop {
        let Some(snapshot) = service.status(job_id) else {
            return Err(AggieError::Internal(format!("job {job_id} disappeared")));
        };
        match snapshot.status {
            JobStatus::Completed => {
                return snapshot
                    .result
                    .map(|output| output.calendar_text)
                    .ok_or_else(|| AggieError::Internal("completed job has no result".into()));
            }
            JobStatus::Failed => {
                let reason = snapshot.error.unwrap_or_else(|| "unknown failure".into());
                let reason = reason
                    .strip_prefix("conversion failed: ")
                    .map(str::to_string)
                    .unwrap_or(reason);
                return Err(AggieError::conversion(reason));
            }
            JobStatus::Queued if last_position != Some(snapshot.position) => {
                last_position = Some(snapshot.position);
                let minute = &snapshot.rate_limit.minute;
                let daily = &snapshot.rate_limit.daily;
                info!(
                    position = snapshot.position,
                    minute_remaining = minute.remaining,
                    daily_remaining = daily.remaining,
                    "waiting for dispatch"
                );
            }
            JobStatus::Queued | JobStatus::Processing => {}
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                if service.cancel(job_id) {
                    info!(job_id = %job_id, "queued job cancelled");
                }
                return Err(AggieError::Internal("interrupted before the conversion finished".into()));
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
    }
}

async fn write_output(path: &Path, calendar_text: &str) -> Result<(), AggieError> {
    let io_err = |e: std::io::Error| AggieError::Internal(format!("failed to write {}: {e}", path.display()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, calendar_text).await.map_err(io_err)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Config whose converter is a shell script that counts its runs and
    /// writes a one-event calendar to the `--output` path.
    fn config(dir: &Path) -> AggieConfig {
        let mut config = AggieConfig::default();
        config.storage.database_path = dir.join("cache.db").display().to_string();
        config.converter.output_dir = dir.join("calendars").display().to_string();
        config.converter.program = "sh".into();
        let counter = dir.join("runs");
        config.converter.args = vec![
            "-c".into(),
            format!(
                "echo run >> '{}'; for last; do :; done; \
                 printf 'BEGIN:VCALENDAR\\r\\nVERSION:2.0\\r\\nCALSCALE:GREGORIAN\\r\\nBEGIN:VEVENT\\r\\nEND:VEVENT\\r\\nEND:VCALENDAR\\r\\n' > \"$last\"",
                counter.display()
            ),
            "convert".into(),
        ];
        config
    }

    fn args(dir: &Path, output: &str) -> ConvertArgs {
        ConvertArgs {
            pdf: dir.join("syllabus.pdf"),
            class_name: "CSCE 311".into(),
            section: "546".into(),
            start_date: "08/25/2025".into(),
            end_date: "12/16/2025".into(),
            timezone: None,
            output: dir.join(output),
        }
    }

    fn runs(dir: &Path) -> usize {
        std::fs::read_to_string(dir.join("runs"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn second_conversion_of_same_bytes_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syllabus.pdf"), b"%PDF-1.7 syllabus").unwrap();
        let config = config(dir.path());

        let first = run_convert(&config, &args(dir.path(), "out/first.ics"), CancellationToken::new())
            .await
            .unwrap();
        assert!(!first.from_cache);
        let written = std::fs::read_to_string(&first.output).unwrap();
        assert!(written.contains("BEGIN:VEVENT"));

        let second = run_convert(&config, &args(dir.path(), "second.ics"), CancellationToken::new())
            .await
            .unwrap();
        assert!(second.from_cache);
        assert_eq!(std::fs::read_to_string(&second.output).unwrap(), written);
        assert_eq!(runs(dir.path()), 1);
    }

    #[tokio::test]
    async fn invalid_dates_are_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = args(dir.path(), "out.ics");
        bad.start_date = "2025-08-25".into();

        let err = run_convert(&config(dir.path()), &bad, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AggieError::InvalidInput(_)));
        assert!(!dir.path().join("cache.db").exists());
    }

    #[tokio::test]
    async fn failing_converter_surfaces_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syllabus.pdf"), b"%PDF-1.7 broken").unwrap();
        let mut config = config(dir.path());
        config.converter.args = vec!["-c".into(), "echo 'no events found' >&2; exit 1".into()];

        let err = run_convert(&config, &args(dir.path(), "out.ics"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AggieError::Conversion { .. }), "got: {err:?}");
        assert!(err.to_string().contains("no events found"), "got: {err}");
        assert!(!err.to_string().contains("conversion failed: conversion failed"));
        assert!(!dir.path().join("out.ics").exists());
    }

    #[tokio::test]
    async fn extract_mode_renders_calendar_from_printed_events() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syllabus.pdf"), b"%PDF-1.7 extracted").unwrap();
        let mut config = config(dir.path());
        config.converter.mode = ConverterMode::Extract;
        config.converter.args = vec![
            "-c".into(),
            "printf 'Midterm | 10/15/2025 | 14:00-15:15 | ZACH 350\\nFinal Exam | 12/12/2025 | TBD | TBD\\n'".into(),
        ];

        let outcome = run_convert(&config, &args(dir.path(), "out.ics"), CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.from_cache);
        let written = std::fs::read_to_string(&outcome.output).unwrap();
        assert_eq!(written.matches("BEGIN:VEVENT").count(), 2);
        assert!(written.contains("SUMMARY:CSCE 311 (546) - Midterm"));

        let stored = std::fs::read_dir(dir.path().join("calendars")).unwrap().count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn empty_converter_program_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.converter.program = " ".into();

        let err = run_convert(&config, &args(dir.path(), "out.ics"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AggieError::Config(_)), "got: {err:?}");
        assert!(!dir.path().join("cache.db").exists());
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syllabus.pdf"), b"%PDF-1.7 held").unwrap();
        let mut config = config(dir.path());
        config.converter.args = vec!["-c".into(), "sleep 30".into()];
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let err = run_convert(&config, &args(dir.path(), "out.ics"), shutdown)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("interrupted"), "got: {err}");
    }
}
