use std::sync::Arc;

use tracing::debug;

use super::style_table::{StyleSignature, StyleTable};
use super::tokenizer::Tokenizer;
use crate::app::domain::style::Style;

/// A styled stretch of the document, in character offsets.
///
/// The last run of every computed list is a terminator with `style: None`
/// and `length: 0`, starting at the document's character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRun {
    pub start: usize,
    pub style: Option<Style>,
    pub length: usize,
}

impl FormatRun {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_terminator(&self) -> bool {
        self.style.is_none()
    }
}

struct CacheEntry {
    text: String,
    signature: StyleSignature,
    runs: Arc<[FormatRun]>,
}

/// Single-slot memo of the last computed format runs for one document.
#[derive(Default)]
pub struct FormatCache {
    entry: Option<CacheEntry>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format runs for `text`, reusing the cached ones when both the text
    /// and the style table signature are unchanged.
    pub fn compute(
        &mut self,
        text: &str,
        table: &StyleTable,
        tokenizer: &dyn Tokenizer,
    ) -> Arc<[FormatRun]> {
        let signature = table.signature();
        if let Some(ref entry) = self.entry
            && entry.signature == signature
            && entry.text == text
        {
            return Arc::clone(&entry.runs);
        }

        debug!(
            language = tokenizer.language(),
            bytes = text.len(),
            "format cache miss"
        );
        let runs: Arc<[FormatRun]> = build_runs(text, table, tokenizer).into();
        self.entry = Some(CacheEntry {
            text: text.to_string(),
            signature,
            runs: Arc::clone(&runs),
        });
        runs
    }

    /// Drop the cached entry; the next `compute` recomputes.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// The cached runs, if any, without recomputing.
    pub fn runs(&self) -> Option<Arc<[FormatRun]>> {
        self.entry.as_ref().map(|e| Arc::clone(&e.runs))
    }
}

fn build_runs(text: &str, table: &StyleTable, tokenizer: &dyn Tokenizer) -> Vec<FormatRun> {
    let mut runs = Vec::new();
    let mut offset = 0;
    for (category, token) in tokenizer.tokenize(text) {
        let style = table.get_style(&category);
        for piece in token.split_inclusive('\n') {
            let length = piece.chars().count();
            runs.push(FormatRun {
                start: offset,
                style: Some(style),
                length,
            });
            offset += length;
        }
    }
    runs.push(FormatRun {
        start: offset,
        style: None,
        length: 0,
    });
    runs
}

/// Index of the last run starting at or before `offset`.
pub fn find_run(runs: &[FormatRun], offset: usize) -> usize {
    runs.partition_point(|run| run.start <= offset).saturating_sub(1)
}
