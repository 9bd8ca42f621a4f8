/// Offsets of the bracket pair around the cursor. Either side may be
/// unknown when the bracket is unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BracketPair {
    pub open: Option<usize>,
    pub close: Option<usize>,
}

impl BracketPair {
    pub const NONE: BracketPair = BracketPair {
        open: None,
        close: None,
    };

    pub fn is_empty(&self) -> bool {
        self.open.is_none() && self.close.is_none()
    }

    /// Both sides were found.
    pub fn is_matched(&self) -> bool {
        self.open.is_some() && self.close.is_some()
    }

    pub fn offsets(&self) -> impl Iterator<Item = usize> {
        self.open.into_iter().chain(self.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Depth-counting scan from `index`. `(` adds one and `)` subtracts one in
/// either direction, so a backward scan from `)` goes negative and returns
/// to zero on its `(`. Starting on a non-bracket returns `index`.
pub fn find_match(chars: &[char], index: usize, direction: Direction) -> Option<usize> {
    let mut depth: isize = 0;
    let mut i = index;
    loop {
        match chars.get(i)? {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return Some(i);
        }
        i = match direction {
            Direction::Forward => i + 1,
            Direction::Backward => i.checked_sub(1)?,
        };
    }
}

/// Tracks the bracket pair adjacent to the cursor.
#[derive(Debug, Default)]
pub struct BracketMatcher {
    current: BracketPair,
}

impl BracketMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> BracketPair {
        self.current
    }

    /// Recompute the pair for `cursor` and return `(previous, current)`.
    pub fn update(&mut self, text: &str, cursor: usize) -> (BracketPair, BracketPair) {
        let chars: Vec<char> = text.chars().collect();
        let new = pair_at(&chars, cursor);
        let old = std::mem::replace(&mut self.current, new);
        (old, new)
    }

    pub fn reset(&mut self) -> BracketPair {
        std::mem::take(&mut self.current)
    }
}

/// Checks in order: after is `(`, before is `)`, before is `(`, after is `)`.
fn pair_at(chars: &[char], cursor: usize) -> BracketPair {
    let before = cursor.checked_sub(1).and_then(|i| chars.get(i).copied());
    let after = chars.get(cursor).copied();

    if after == Some('(') {
        BracketPair {
            open: Some(cursor),
            close: find_match(chars, cursor, Direction::Forward),
        }
    } else if before == Some(')') {
        BracketPair {
            open: find_match(chars, cursor - 1, Direction::Backward),
            close: Some(cursor - 1),
        }
    } else if before == Some('(') {
        BracketPair {
            open: Some(cursor - 1),
            close: find_match(chars, cursor - 1, Direction::Forward),
        }
    } else if after == Some(')') {
        BracketPair {
            open: find_match(chars, cursor, Direction::Backward),
            close: Some(cursor),
        }
    } else {
        BracketPair::NONE
    }
}
