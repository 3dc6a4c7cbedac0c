// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction text through to an `.ics` file on disk.

use std::path::Path;

use async_trait::async_trait;

use aggieace_calendar::{EventExtractor, ExtractionConverter, validate_ics};
use aggieace_core::{AggieError, ClassMetadata, Converter, Fingerprint, JobParams};

const EXTRACTION: &str = "\
# CSCE 311 Section 546 schedule
Lecture | Tuesdays and Thursdays | 9:35-10:50 | HRBB 124
Lab | F | 13:00-14:50 | ETB 1020
Homework 1 Due | September 5th | 23:59 | Canvas
Midterm Exam | Wednesday, October 15, 2025 | 19:00-21:00 | ZACH 350
Thanksgiving Break | 11/27 | all-day |
Project Demo | See Canvas | TBA | TBA
Final Exam | 12/12/2025 | 10:30-12:30 | HRBB 124
";

struct CannedExtractor;

#[async_trait]
impl EventExtractor for CannedExtractor {
    fn name(&self) -> &str {
        "canned"
    }

    async fn extract(&self, document: &Path, metadata: &ClassMetadata) -> Result<String, AggieError> {
        assert!(document.ends_with("syllabus.pdf"));
        assert_eq!(metadata.class_name, "CSCE 311");
        Ok(EXTRACTION.to_string())
    }
}

fn job(dir: &Path) -> JobParams {
    JobParams {
        document_path: dir.join("syllabus.pdf"),
        fingerprint: Fingerprint("f00d".into()),
        metadata: ClassMetadata::parse(
            "CSCE 311",
            "546",
            "08/25/2025",
            "12/16/2025",
            "America/Chicago",
        )
        .unwrap(),
    }
}

#[tokio::test]
async fn syllabus_extraction_becomes_a_valid_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let converter = ExtractionConverter::new(CannedExtractor, dir.path().join("out"));

    let output = converter.convert(&job(dir.path())).await.unwrap();

    // "See Canvas" has no usable date and is dropped.
    assert_eq!(output.event_count, 6);
    assert_eq!(validate_ics(&output.calendar_text).unwrap(), 6);

    let ics = &output.calendar_text;
    assert!(ics.contains("X-WR-CALNAME:CSCE 311 (546)\r\n"));
    assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=TU,TH;UNTIL=20251216T235959\r\n"));
    assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=FR;UNTIL=20251216T235959\r\n"));
    assert!(ics.contains("DTSTART:20250826T093500\r\n"));
    assert!(ics.contains("DTSTART:20250905T235900\r\n"));
    assert!(ics.contains("DTSTART:20251015T190000\r\n"));
    assert!(ics.contains("DTSTART;VALUE=DATE:20251127\r\n"));
    assert!(ics.contains("SUMMARY:CSCE 311 (546) - Thanksgiving Break\r\n"));
    assert!(ics.contains("LOCATION:TBA\r\n"));
    assert!(!ics.contains("Project Demo"));

    let written = std::fs::read_to_string(output.output_ref.unwrap()).unwrap();
    assert_eq!(&written, ics);
}
