use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::brackets::{BracketMatcher, BracketPair};
use super::format_cache::{FormatCache, find_run};
use super::lines::{Block, BlockIndex, BlockState, TextEdit};
use super::style_table::StyleTable;
use super::tokenizer::{Tokenizer, TokenizerFactory, plain_tokenizer};
use crate::app::domain::settings::HighlightSettings;
use crate::app::domain::style::{Rgb, Style};
use crate::app::infrastructure::error::Result;

/// A styled stretch inside one block, relative to the block start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    pub offset: usize,
    pub length: usize,
    pub style: Style,
}

impl StyledSpan {
    fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// What the host has to repaint after an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Repaint {
    #[default]
    None,
    Blocks(Vec<Block>),
    All,
}

impl Repaint {
    pub fn is_none(&self) -> bool {
        matches!(self, Repaint::None)
    }

    /// Union of two repaint requests.
    pub fn merge(self, other: Repaint) -> Repaint {
        match (self, other) {
            (Repaint::All, _) | (_, Repaint::All) => Repaint::All,
            (Repaint::None, r) | (r, Repaint::None) => r,
            (Repaint::Blocks(mut a), Repaint::Blocks(b)) => {
                a.extend(b);
                Repaint::blocks(a)
            }
        }
    }

    fn blocks(mut blocks: Vec<Block>) -> Repaint {
        if blocks.is_empty() {
            return Repaint::None;
        }
        blocks.sort_by_key(|b| b.index);
        blocks.dedup_by_key(|b| b.index);
        Repaint::Blocks(blocks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Delete,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Click,
}

/// Per-document re-highlight driver.
///
/// The host reports text changes, cursor moves and input events; each call
/// returns the blocks that need repainting, and the host then asks for
/// `style_block` of each visible block.
pub struct IncrementalHighlighter {
    tokenizer: Box<dyn Tokenizer>,
    table: StyleTable,
    cache: FormatCache,
    brackets: BracketMatcher,
    blocks: BlockIndex,
    text: String,
    enabled: bool,
    matched_color: Rgb,
    unmatched_color: Rgb,
    last_full_rehighlight: Option<Duration>,
}

impl IncrementalHighlighter {
    /// Highlighter for `language`, failing with `UnsupportedLanguage` when
    /// no tokenizer knows it. The tokenizer comes from `factory`, so syntax
    /// definitions loaded once are shared by every document.
    pub fn new(
        language: &str,
        table: StyleTable,
        settings: &HighlightSettings,
        factory: &mut TokenizerFactory,
    ) -> Result<Self> {
        let tokenizer = factory.create(language)?;
        Ok(Self::with_tokenizer(tokenizer, table, settings))
    }

    /// Plain-text fallback used when a document's language is unsupported.
    pub fn plain(table: StyleTable) -> Self {
        Self::with_tokenizer(plain_tokenizer(), table, &HighlightSettings::default())
    }

    pub fn with_tokenizer(
        tokenizer: Box<dyn Tokenizer>,
        table: StyleTable,
        settings: &HighlightSettings,
    ) -> Self {
        let (matched_color, unmatched_color) = settings.bracket_colors();
        Self {
            tokenizer,
            table,
            cache: FormatCache::new(),
            brackets: BracketMatcher::new(),
            blocks: BlockIndex::new(""),
            text: String::new(),
            enabled: settings.highlighting_enabled,
            matched_color,
            unmatched_color,
            last_full_rehighlight: None,
        }
    }

    pub fn language(&self) -> &str {
        self.tokenizer.language()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn blocks(&self) -> &BlockIndex {
        &self.blocks
    }

    pub fn block_state(&self, index: usize) -> Option<BlockState> {
        self.blocks.state(index)
    }

    pub fn brackets(&self) -> BracketPair {
        self.brackets.current()
    }

    pub fn style_table(&self) -> &StyleTable {
        &self.table
    }

    /// Mutable access to the table. Changes alter its signature, so the next
    /// `style_block` recomputes runs; call `full_rehighlight` to get every
    /// block repainted.
    pub fn style_table_mut(&mut self) -> &mut StyleTable {
        &mut self.table
    }

    /// Swap the tokenizer, e.g. after a backend change. Text, block index
    /// and bracket pair are kept; every block is restyled.
    pub fn set_tokenizer(&mut self, tokenizer: Box<dyn Tokenizer>) -> Repaint {
        self.tokenizer = tokenizer;
        self.full_rehighlight()
    }

    pub fn set_style_table(&mut self, table: StyleTable) -> Repaint {
        self.table = table;
        self.full_rehighlight()
    }

    pub fn set_bracket_colors(&mut self, matched: Rgb, unmatched: Rgb) {
        self.matched_color = matched;
        self.unmatched_color = unmatched;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Repaint {
        if self.enabled == enabled {
            return Repaint::None;
        }
        self.enabled = enabled;
        self.blocks.mark_all(BlockState::Unstyled);
        Repaint::All
    }

    /// Pick up bracket colors and the enabled flag from `settings`.
    pub fn apply_settings(&mut self, settings: &HighlightSettings) -> Repaint {
        let (matched, unmatched) = settings.bracket_colors();
        self.set_bracket_colors(matched, unmatched);
        self.set_enabled(settings.highlighting_enabled)
    }

    /// Duration of the most recent full rehighlight pass.
    pub fn last_full_rehighlight(&self) -> Option<Duration> {
        self.last_full_rehighlight
    }

    /// Replace the whole document, e.g. after loading a file.
    pub fn set_text(&mut self, text: &str) -> Repaint {
        self.text = text.to_string();
        self.blocks = BlockIndex::new(text);
        self.brackets.reset();
        Repaint::All
    }

    /// Styled spans for the block `[block_start, block_end)`, relative to
    /// `block_start`, with the current bracket pair overlaid.
    pub fn style_block(&mut self, block_start: usize, block_end: usize) -> Vec<StyledSpan> {
        let block = self.blocks.block_at(block_start);
        if block.start == block_start {
            self.blocks.set_state(block.index, BlockState::Styled);
        }
        if !self.enabled || block_end <= block_start {
            return Vec::new();
        }

        let runs = self
            .cache
            .compute(&self.text, &self.table, self.tokenizer.as_ref());
        let mut spans = Vec::new();
        for run in &runs[find_run(&runs, block_start)..] {
            if run.start >= block_end {
                break;
            }
            let Some(style) = run.style else { break };
            let start = run.start.max(block_start);
            let end = run.end().min(block_end);
            if end > start {
                spans.push(StyledSpan {
                    offset: start - block_start,
                    length: end - start,
                    style,
                });
            }
        }

        let pair = self.brackets.current();
        let color = if pair.is_matched() {
            self.matched_color
        } else {
            self.unmatched_color
        };
        for offset in pair.offsets() {
            if (block_start..block_end).contains(&offset) {
                overlay_bracket(&mut spans, offset - block_start, color);
            }
        }
        spans
    }

    /// `style_block` for the block at line `line`.
    pub fn style_line(&mut self, line: usize) -> Vec<StyledSpan> {
        match self.blocks.get(line) {
            Some(block) => self.style_block(block.start, block.end),
            None => Vec::new(),
        }
    }

    /// Drop cached runs, recompute them and mark every block unstyled.
    pub fn full_rehighlight(&mut self) -> Repaint {
        let started = Instant::now();
        self.cache.invalidate();
        let runs = self
            .cache
            .compute(&self.text, &self.table, self.tokenizer.as_ref());
        self.blocks.mark_all(BlockState::Unstyled);
        let elapsed = started.elapsed();
        info!(
            language = self.tokenizer.language(),
            runs = runs.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "full rehighlight"
        );
        self.last_full_rehighlight = Some(elapsed);
        Repaint::All
    }

    /// Record the document's new contents. Only blocks touched by the edit
    /// lose their styled state.
    pub fn on_text_changed(&mut self, new_text: &str) -> Repaint {
        let Some(edit) = TextEdit::between(&self.text, new_text) else {
            return Repaint::None;
        };
        let dirty = self.blocks.apply_edit(new_text, edit);
        self.text = new_text.to_string();
        Repaint::blocks(dirty)
    }

    /// Track the bracket pair at `cursor`; repaint the blocks holding the old
    /// and new bracket offsets.
    pub fn on_cursor_moved(&mut self, cursor: usize) -> Repaint {
        let (old, new) = self.brackets.update(&self.text, cursor);
        if old == new {
            return Repaint::None;
        }
        let blocks = old
            .offsets()
            .chain(new.offsets())
            .map(|offset| self.blocks.block_at(offset))
            .collect();
        Repaint::blocks(blocks)
    }

    /// Handle a key press or click the host has already applied to the text.
    /// Typing the third quote of a triple quote, or deleting next to a quote,
    /// can change the styling of everything after it, so both rehighlight
    /// the whole document.
    pub fn on_key_or_click(&mut self, event: InputEvent, cursor: usize) -> Repaint {
        let repaint = self.on_cursor_moved(cursor);
        let line_start = self.blocks.block_at(cursor).start;

        let needs_full = match event {
            InputEvent::Key(Key::Char('"' | '\'')) => {
                cursor >= line_start + 3
                    && matches!(self.chars_between(cursor - 3, cursor).as_str(), "'''" | "\"\"\"")
            }
            InputEvent::Key(Key::Backspace | Key::Delete) => {
                cursor > line_start
                    && matches!(self.char_at(cursor - 1), Some('"' | '\''))
            }
            _ => false,
        };

        if needs_full {
            debug!(?event, cursor, "quote edit, rehighlighting document");
            return repaint.merge(self.full_rehighlight());
        }
        repaint
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.text.chars().nth(offset)
    }

    fn chars_between(&self, start: usize, end: usize) -> String {
        self.text.chars().skip(start).take(end - start).collect()
    }
}

/// Split the span covering `at` so the bracket gets its own span with
/// `color` as background.
fn overlay_bracket(spans: &mut Vec<StyledSpan>, at: usize, color: Rgb) {
    let Some(i) = spans.iter().position(|s| s.offset <= at && at < s.end()) else {
        let pos = spans.partition_point(|s| s.offset < at);
        spans.insert(
            pos,
            StyledSpan {
                offset: at,
                length: 1,
                style: Style::default().with_background(color),
            },
        );
        return;
    };

    let span = spans[i];
    let mut pieces = Vec::with_capacity(3);
    if at > span.offset {
        pieces.push(StyledSpan {
            length: at - span.offset,
            ..span
        });
    }
    pieces.push(StyledSpan {
        offset: at,
        length: 1,
        style: span.style.with_background(color),
    });
    if at + 1 < span.end() {
        pieces.push(StyledSpan {
            offset: at + 1,
            length: span.end() - at - 1,
            style: span.style,
        });
    }
    spans.splice(i..=i, pieces);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::category::Category;
    use crate::app::infrastructure::error::HighlightError;
    use crate::app::services::syntax::presets::StylePreset;

    const ORANGE: Rgb = Rgb::new(0xff, 0xa5, 0x00);
    const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);

    fn python(text: &str) -> IncrementalHighlighter {
        let table = StyleTable::from_preset(StylePreset::Monokai);
        let mut factory = TokenizerFactory::default();
        let settings = HighlightSettings::default();
        let mut hl = IncrementalHighlighter::new("python", table, &settings, &mut factory).unwrap();
        hl.set_text(text);
        hl
    }

    fn assert_spans_tile(spans: &[StyledSpan], len: usize) {
        let mut expected = 0;
        for span in spans {
            assert_eq!(span.offset, expected);
            assert!(span.length > 0);
            expected = span.end();
        }
        assert_eq!(expected, len);
    }

    #[test]
    fn test_unsupported_language() {
        let mut factory = TokenizerFactory::default();
        let settings = HighlightSettings::default();
        let err = IncrementalHighlighter::new("cobol", StyleTable::new(), &settings, &mut factory)
            .err()
            .unwrap();
        assert!(matches!(err, HighlightError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_style_block_relative_and_clipped() {
        let mut hl = python("x = 1\ndef f():\n    pass\n");
        let block = hl.blocks().get(1).unwrap();
        assert_eq!(block.range(), 6..15);

        let spans = hl.style_block(block.start, block.end);
        assert_spans_tile(&spans, 9);
        let keyword = hl.style_table().get_style(&Category::KEYWORD);
        assert_eq!(spans[0], StyledSpan { offset: 0, length: 3, style: keyword });
        assert_eq!(hl.block_state(1), Some(BlockState::Styled));
        assert_eq!(hl.block_state(0), Some(BlockState::Unstyled));
    }

    #[test]
    fn test_style_block_clips_long_token() {
        let mut hl = python("s = '''one\ntwo\nthree'''\n");
        let spans = hl.style_line(1);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].offset, 0);
        assert_eq!(spans[0].length, 4);
        assert_eq!(spans[0].style, hl.style_table().get_style(&Category::STRING_SINGLE));
        assert!(hl.style_line(99).is_empty());
    }

    #[test]
    fn test_bracket_overlay_matched() {
        let mut hl = python("f(a)\n");
        hl.on_cursor_moved(1);
        let spans = hl.style_line(0);
        assert_spans_tile(&spans, 5);
        let open = spans.iter().find(|s| s.offset == 1).unwrap();
        let close = spans.iter().find(|s| s.offset == 3).unwrap();
        assert_eq!((open.length, open.style.background), (1, Some(ORANGE)));
        assert_eq!((close.length, close.style.background), (1, Some(ORANGE)));
        let other = spans.iter().find(|s| s.offset == 2).unwrap();
        assert_eq!(other.style.background, hl.style_table().get_style(&Category::NAME).background);
    }

    #[test]
    fn test_bracket_overlay_unmatched() {
        let mut hl = python("f(a\n");
        hl.on_cursor_moved(1);
        let spans = hl.style_line(0);
        assert_spans_tile(&spans, 4);
        let open = spans.iter().find(|s| s.offset == 1).unwrap();
        assert_eq!(open.style.background, Some(RED));
    }

    #[test]
    fn test_bracket_overlay_splits_inside_string() {
        let mut hl = python("x = '(a)'\n");
        hl.on_cursor_moved(5);
        let spans = hl.style_line(0);
        assert_spans_tile(&spans, 10);
        let string = hl.style_table().get_style(&Category::STRING_SINGLE);
        let pieces: Vec<(usize, usize)> = spans
            .iter()
            .filter(|s| s.style.foreground == string.foreground)
            .map(|s| (s.offset, s.length))
            .collect();
        assert_eq!(pieces, vec![(4, 1), (5, 1), (6, 1), (7, 1), (8, 1)]);
    }

    #[test]
    fn test_cursor_moves_repaint_old_and_new_blocks() {
        let mut hl = python("(\n)\nx\n");
        match hl.on_cursor_moved(0) {
            Repaint::Blocks(blocks) => {
                let idx: Vec<usize> = blocks.iter().map(|b| b.index).collect();
                assert_eq!(idx, vec![0, 1]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(hl.on_cursor_moved(0), Repaint::None);
        match hl.on_cursor_moved(5) {
            Repaint::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(hl.brackets(), BracketPair::NONE);
    }

    #[test]
    fn test_full_rehighlight_is_idempotent() {
        let mut hl = python("def f(x):\n    return x\n");
        hl.on_cursor_moved(5);
        let before: Vec<Vec<StyledSpan>> = (0..3).map(|i| hl.style_line(i)).collect();

        assert_eq!(hl.full_rehighlight(), Repaint::All);
        assert!(hl.last_full_rehighlight().is_some());
        assert_eq!(hl.block_state(0), Some(BlockState::Unstyled));

        let after: Vec<Vec<StyledSpan>> = (0..3).map(|i| hl.style_line(i)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_text_change_marks_only_edited_blocks() {
        let mut hl = python("a = 1\nb = 2\nc = 3\n");
        for i in 0..4 {
            hl.style_line(i);
        }
        let repaint = hl.on_text_changed("a = 1\nb = 22\nc = 3\n");
        match repaint {
            Repaint::Blocks(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].index, 1);
                assert_eq!(blocks[0].range(), 6..13);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(hl.block_state(0), Some(BlockState::Styled));
        assert_eq!(hl.block_state(1), Some(BlockState::Unstyled));
        assert_eq!(hl.block_state(2), Some(BlockState::Styled));
        assert_eq!(hl.on_text_changed("a = 1\nb = 22\nc = 3\n"), Repaint::None);
    }

    #[test]
    fn test_triple_quote_triggers_full_rehighlight() {
        let mut hl = python("x = ''\n");
        hl.on_text_changed("x = '''\n");
        let repaint = hl.on_key_or_click(InputEvent::Key(Key::Char('\'')), 7);
        assert_eq!(repaint, Repaint::All);
        assert!(hl.last_full_rehighlight().is_some());
    }

    #[test]
    fn test_single_quote_does_not_rehighlight() {
        let mut hl = python("x = '\n");
        let repaint = hl.on_key_or_click(InputEvent::Key(Key::Char('\'')), 5);
        assert_ne!(repaint, Repaint::All);
        assert!(hl.last_full_rehighlight().is_none());

        // Mixed quotes are not a triple quote.
        let mut hl = python("x = '\"'\n");
        assert_ne!(hl.on_key_or_click(InputEvent::Key(Key::Char('\'')), 7), Repaint::All);
    }

    #[test]
    fn test_triple_quote_must_be_on_current_line() {
        let mut hl = python("''\n'\n");
        assert_ne!(hl.on_key_or_click(InputEvent::Key(Key::Char('\'')), 4), Repaint::All);
    }

    #[test]
    fn test_backspace_next_to_quote() {
        let mut hl = python("s = \"ab\n");
        assert_eq!(hl.on_key_or_click(InputEvent::Key(Key::Backspace), 5), Repaint::All);

        let mut hl = python("s = ab\n\"x\n");
        // Cursor at the start of line 1: nothing before it on this line.
        assert_ne!(hl.on_key_or_click(InputEvent::Key(Key::Delete), 7), Repaint::All);
        assert_ne!(hl.on_key_or_click(InputEvent::Key(Key::Delete), 3), Repaint::All);
    }

    #[test]
    fn test_click_only_updates_brackets() {
        let mut hl = python("f()\n");
        let repaint = hl.on_key_or_click(InputEvent::Click, 1);
        assert!(matches!(repaint, Repaint::Blocks(_)));
        assert_eq!(hl.brackets(), BracketPair { open: Some(1), close: Some(2) });
        assert!(hl.last_full_rehighlight().is_none());
    }

    #[test]
    fn test_set_tokenizer_keeps_text_and_brackets() {
        let mut hl = python("f(x)\n");
        hl.on_cursor_moved(1);
        let repaint = hl.set_tokenizer(plain_tokenizer());
        assert_eq!(repaint, Repaint::All);
        assert_eq!(hl.language(), "text");
        assert_eq!(hl.text(), "f(x)\n");
        assert_eq!(hl.brackets(), BracketPair { open: Some(1), close: Some(3) });

        let spans = hl.style_line(0);
        assert_spans_tile(&spans, 5);
        let (brackets, rest): (Vec<&StyledSpan>, Vec<&StyledSpan>) =
            spans.iter().partition(|s| s.style.background == Some(ORANGE));
        assert_eq!(brackets.len(), 2);
        assert!(rest.iter().all(|s| s.style == rest[0].style));
    }

    #[test]
    fn test_set_style_table_repaints_all() {
        let mut hl = python("pass\n");
        let before = hl.style_line(0);
        let repaint = hl.set_style_table(StyleTable::from_preset(StylePreset::Emacs));
        assert_eq!(repaint, Repaint::All);
        assert_ne!(before, hl.style_line(0));
    }

    #[test]
    fn test_style_table_mut_takes_effect() {
        let mut hl = python("pass\n");
        let red = Style::default().with_foreground(RED);
        hl.style_table_mut().set_style(Category::KEYWORD, red);
        assert_eq!(hl.style_line(0)[0].style, red);
    }

    #[test]
    fn test_disabled_highlighting_yields_no_spans() {
        let mut hl = python("pass\n");
        assert_eq!(hl.set_enabled(false), Repaint::All);
        assert!(hl.style_line(0).is_empty());
        assert_eq!(hl.set_enabled(false), Repaint::None);
    }

    #[test]
    fn test_plain_highlighter() {
        let mut table = StyleTable::new();
        let text_style = Style::default().with_foreground(Rgb::new(1, 2, 3));
        table.set_style(Category::TEXT, text_style);
        let mut hl = IncrementalHighlighter::plain(table);
        hl.set_text("def f(): pass\n");
        let spans = hl.style_line(0);
        assert_eq!(spans, vec![StyledSpan { offset: 0, length: 14, style: text_style }]);
        assert_eq!(hl.language(), "text");
    }

    #[test]
    fn test_repaint_merge() {
        let a = Block { index: 2, start: 4, end: 6 };
        let b = Block { index: 0, start: 0, end: 2 };
        assert_eq!(Repaint::None.merge(Repaint::None), Repaint::None);
        assert_eq!(Repaint::Blocks(vec![a]).merge(Repaint::All), Repaint::All);
        assert_eq!(
            Repaint::Blocks(vec![a]).merge(Repaint::Blocks(vec![b, a])),
            Repaint::Blocks(vec![b, a])
        );
        assert_eq!(Repaint::None.merge(Repaint::Blocks(vec![b])), Repaint::Blocks(vec![b]));
    }
}
