// src/model.rs
//
// Shared record types for one conversion batch: queued inputs, per-item
// output records with their status state machine, and the summary counts
// derived from a finished batch.

use crate::engine::Source;
use std::sync::Arc;

/// Per-item conversion state machine: Queued -> Converting -> Done.
/// Done is terminal; there are no reverse transitions and no retry state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionStatus {
    Queued,
    Converting,
    Done,
}

impl ConversionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Converting => "converting",
            Self::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// A pending conversion input: the original file name, its bytes (in-memory,
/// memory-mapped, or path-backed) and an optional preview owned exclusively
/// by this queue entry. Dropping the entry releases both.
#[derive(Clone, Debug)]
pub struct QueuedImage {
    name: String,
    source: Source,
    preview: Option<Arc<Vec<u8>>>,
}

impl QueuedImage {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: Source::Memory(Arc::new(bytes)),
            preview: None,
        }
    }

    pub fn from_source(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: Vec<u8>) -> Self {
        self.preview = Some(Arc::new(preview));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Original byte size. Zero for path sources that have not been loaded.
    pub fn size(&self) -> u64 {
        self.source.len() as u64
    }

    pub fn preview(&self) -> Option<&[u8]> {
        self.preview.as_deref().map(|v| v.as_slice())
    }
}

/// One output record, index-aligned with the input queue at batch start.
///
/// `output()` is None until the conversion produces bytes. Status Done with
/// an absent output is the observable failed state - there is no separate
/// error status, and downstream consumers (summary counts, download-all)
/// rely on exactly this absence-based check.
#[derive(Clone, Debug)]
pub struct ConvertedImage {
    file_name: String,
    original_name: String,
    original_size: u64,
    converted_size: u64,
    output: Option<Arc<Vec<u8>>>,
    status: ConversionStatus,
    progress: u8,
}

impl ConvertedImage {
    pub(crate) fn queued(
        file_name: String,
        original_name: String,
        original_size: u64,
    ) -> Self {
        Self {
            file_name,
            original_name,
            original_size,
            converted_size: 0,
            output: None,
            status: ConversionStatus::Queued,
            progress: 0,
        }
    }

    pub(crate) fn mark_converting(&mut self) {
        debug_assert_eq!(self.status, ConversionStatus::Queued);
        self.status = ConversionStatus::Converting;
    }

    pub(crate) fn complete(&mut self, output: Arc<Vec<u8>>, converted_size: u64) {
        debug_assert!(!self.status.is_terminal());
        self.output = Some(output);
        self.converted_size = converted_size;
        self.status = ConversionStatus::Done;
        self.progress = 100;
    }

    /// A failed item still terminates as Done, with the output left absent.
    pub(crate) fn fail(&mut self) {
        debug_assert!(!self.status.is_terminal());
        self.status = ConversionStatus::Done;
        self.progress = 100;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn converted_size(&self) -> u64 {
        self.converted_size
    }

    /// Encoded output bytes; None until produced (and forever for failures).
    pub fn output(&self) -> Option<&Arc<Vec<u8>>> {
        self.output.as_ref()
    }

    pub fn status(&self) -> ConversionStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// The absence-based success check shared by all downstream consumers.
    pub fn succeeded(&self) -> bool {
        self.status == ConversionStatus::Done && self.output.is_some()
    }
}

/// Success/failure counts scanned from a finished batch, backing the
/// "all succeeded" / "succeeded with N failures" / "all failed" split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ConvertedImage]) -> Self {
        let succeeded = results.iter().filter(|img| img.succeeded()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ConvertedImage {
        ConvertedImage::queued("out.webp".to_string(), "in.png".to_string(), 1000)
    }

    #[test]
    fn test_status_transitions_to_done_on_success() {
        let mut img = record();
        assert_eq!(img.status(), ConversionStatus::Queued);
        assert_eq!(img.progress(), 0);

        img.mark_converting();
        assert_eq!(img.status(), ConversionStatus::Converting);

        img.complete(Arc::new(vec![1, 2, 3]), 3);
        assert_eq!(img.status(), ConversionStatus::Done);
        assert_eq!(img.progress(), 100);
        assert_eq!(img.converted_size(), 3);
        assert!(img.succeeded());
    }

    #[test]
    fn test_failed_item_is_done_with_absent_output() {
        let mut img = record();
        img.mark_converting();
        img.fail();
        assert_eq!(img.status(), ConversionStatus::Done);
        assert_eq!(img.progress(), 100);
        assert!(img.output().is_none());
        assert!(!img.succeeded());
    }

    #[test]
    fn test_summary_counts() {
        let mut ok = record();
        ok.mark_converting();
        ok.complete(Arc::new(vec![0]), 1);
        let mut bad = record();
        bad.mark_converting();
        bad.fail();

        let summary = BatchSummary::from_results(&[ok.clone(), bad.clone()]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert!(!summary.all_failed());

        let summary = BatchSummary::from_results(&[bad]);
        assert!(summary.all_failed());

        let summary = BatchSummary::from_results(&[]);
        assert!(!summary.all_failed());
        assert!(summary.all_succeeded());
    }

    #[test]
    fn test_queued_image_owns_preview() {
        let img = QueuedImage::from_bytes("a.png", vec![1, 2, 3]).with_preview(vec![9]);
        assert_eq!(img.name(), "a.png");
        assert_eq!(img.size(), 3);
        assert_eq!(img.preview(), Some(&[9u8][..]));
    }
}
