use std::ops::Range;

/// Iterator that yields lines including their line endings.
pub struct LinesWithEndings<'a> {
    text: &'a str,
}

impl<'a> LinesWithEndings<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

impl<'a> Iterator for LinesWithEndings<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.text.is_empty() {
            return None;
        }
        let end = self.text.find('\n').map(|i| i + 1).unwrap_or(self.text.len());
        let line = &self.text[..end];
        self.text = &self.text[end..];
        Some(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Unstyled,
    Styled,
}

/// A visual block (one line including its newline) in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Block {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Character-offset edit: `removed` characters at `start` were replaced by
/// `inserted` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl TextEdit {
    /// Smallest edit turning `old` into `new`, found by trimming the common
    /// prefix and suffix. `None` when the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let prefix = old
            .chars()
            .zip(new.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let old_len = old.chars().count();
        let new_len = new.chars().count();
        let max_suffix = old_len.min(new_len) - prefix;
        let suffix = old
            .chars()
            .rev()
            .zip(new.chars().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        Some(Self {
            start: prefix,
            removed: old_len - prefix - suffix,
            inserted: new_len - prefix - suffix,
        })
    }
}

/// Block boundaries of a document and the styling state of each block.
///
/// A document always has at least one block; a trailing newline starts an
/// empty final block.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    starts: Vec<usize>,
    states: Vec<BlockState>,
    char_len: usize,
}

impl BlockIndex {
    pub fn new(text: &str) -> Self {
        let (starts, char_len) = block_starts(text);
        let states = vec![BlockState::Unstyled; starts.len()];
        Self {
            starts,
            states,
            char_len,
        }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn get(&self, index: usize) -> Option<Block> {
        let start = *self.starts.get(index)?;
        let end = self
            .starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.char_len);
        Some(Block { index, start, end })
    }

    /// Block containing `offset`; offsets past the end map to the last block.
    pub fn block_at(&self, offset: usize) -> Block {
        let index = self
            .starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        // `starts` is never empty and `index` is in bounds.
        self.get(index).unwrap_or(Block {
            index: 0,
            start: 0,
            end: self.char_len,
        })
    }

    /// Index of the block starting exactly at `offset`.
    pub fn index_of_start(&self, offset: usize) -> Option<usize> {
        self.starts.binary_search(&offset).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Block> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    pub fn state(&self, index: usize) -> Option<BlockState> {
        self.states.get(index).copied()
    }

    pub fn set_state(&mut self, index: usize, state: BlockState) {
        if let Some(slot) = self.states.get_mut(index) {
            *slot = state;
        }
    }

    pub fn mark_all(&mut self, state: BlockState) {
        self.states.fill(state);
    }

    /// Re-index after `edit` produced `new_text`. BlockIndex outside the edit
    /// keep their state; the edited blocks become unstyled and are returned.
    pub fn apply_edit(&mut self, new_text: &str, edit: TextEdit) -> Vec<Block> {
        let old_first = self.block_at(edit.start).index;
        let old_last = self.block_at(edit.start + edit.removed).index;
        let old_states = std::mem::take(&mut self.states);

        let (starts, char_len) = block_starts(new_text);
        self.starts = starts;
        self.char_len = char_len;

        let new_first = self.block_at(edit.start).index;
        let new_last = self.block_at(edit.start + edit.inserted).index;

        let mut states = Vec::with_capacity(self.starts.len());
        states.extend_from_slice(&old_states[..old_first.min(old_states.len())]);
        states.resize(new_first, BlockState::Unstyled);
        states.resize(new_last + 1, BlockState::Unstyled);
        if old_last + 1 < old_states.len() {
            states.extend_from_slice(&old_states[old_last + 1..]);
        }
        states.resize(self.starts.len(), BlockState::Unstyled);
        self.states = states;

        (new_first..=new_last).filter_map(|i| self.get(i)).collect()
    }
}

fn block_starts(text: &str) -> (Vec<usize>, usize) {
    let mut starts = vec![0];
    let mut char_len = 0;
    for ch in text.chars() {
        char_len += 1;
        if ch == '\n' {
            starts.push(char_len);
        }
    }
    (starts, char_len)
}
