use crate::shared::constants::TRANSCRIPT_UNAVAILABLE_TEXT;

/// Per-chunk transcription results in chronological order.
///
/// A failed chunk contributes an empty entry: a partial transcript is
/// preferred over failing the whole run.
#[derive(Clone, Debug, Default)]
pub struct TranscriptResult {
    texts: Vec<String>,
}

impl TranscriptResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: String) {
        self.texts.push(text);
    }

    /// Record a chunk whose transcription attempt failed.
    pub fn push_failure(&mut self) {
        self.texts.push(String::new());
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.texts.iter().filter(|t| t.trim().is_empty()).count()
    }

    /// Concatenate all chunk texts in order with single spaces. Returns
    /// the unavailable sentinel when nothing was recognized, so the run
    /// always yields a usable string.
    pub fn aggregate(&self) -> String {
        let joined = self
            .texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            TRANSCRIPT_UNAVAILABLE_TEXT.to_string()
        } else {
            joined
        }
    }
}
