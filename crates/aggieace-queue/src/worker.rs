// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs one conversion with a watchdog.
//!
//! The worker makes exactly one external call per job. Retrying, rate
//! limiting and caching all belong to the queue.

use std::sync::Arc;
use std::time::Duration;

use aggieace_core::{AggieError, ConversionOutput, Converter, JobParams};
use tracing::{debug, warn};

/// Wraps a [`Converter`] with a timeout.
#[derive(Clone)]
pub struct ConversionWorker {
    converter: Arc<dyn Converter>,
    timeout: Duration,
}

impl ConversionWorker {
    pub fn new(converter: Arc<dyn Converter>, timeout: Duration) -> Self {
        Self { converter, timeout }
    }

    pub fn converter_name(&self) -> &str {
        self.converter.name()
    }

    /// Convert one document. Expiry of the watchdog yields
    /// [`AggieError::Timeout`]; the in-flight call is dropped.
    pub async fn run(&self, params: &JobParams) -> Result<ConversionOutput, AggieError> {
        debug!(
            converter = self.converter.name(),
            fingerprint = %params.fingerprint,
            "starting conversion"
        );
        match tokio::time::timeout(self.timeout, self.converter.convert(params)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    converter = self.converter.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "conversion watchdog expired"
                );
                Err(AggieError::Timeout {
                    duration: self.timeout,
                })
            }
        }
    }
}

impl std::fmt::Debug for ConversionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionWorker")
            .field("converter", &self.converter.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggieace_core::{ClassMetadata, Fingerprint};
    use async_trait::async_trait;

    struct SlowConverter(Duration);

    #[async_trait]
    impl Converter for SlowConverter {
        fn name(&self) -> &str {
            "slow"
        }

        async fn convert(&self, _params: &JobParams) -> Result<ConversionOutput, AggieError> {
            tokio::time::sleep(self.0).await;
            Ok(ConversionOutput {
                calendar_text: "BEGIN:VCALENDAR".into(),
                output_ref: None,
                event_count: 1,
            })
        }
    }

    fn params() -> JobParams {
        JobParams {
            document_path: "syllabus.pdf".into(),
            fingerprint: Fingerprint("abc".into()),
            metadata: ClassMetadata::parse("CSCE 311", "546", "08/25/2025", "12/16/2025", "UTC")
                .unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_conversion_passes_through() {
        let worker = ConversionWorker::new(
            Arc::new(SlowConverter(Duration::from_secs(1))),
            Duration::from_secs(10),
        );
        let output = worker.run(&params()).await.unwrap();
        assert_eq!(output.event_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_conversion_times_out() {
        let worker = ConversionWorker::new(
            Arc::new(SlowConverter(Duration::from_secs(600))),
            Duration::from_secs(5),
        );
        let err = worker.run(&params()).await.unwrap_err();
        assert!(matches!(err, AggieError::Timeout { duration } if duration == Duration::from_secs(5)));
    }
}
