use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lexical token category as a dotted path, e.g. `String.Double`.
///
/// The empty path is the root category that every other category descends
/// from. Style lookups fall back along [`Category::ancestors`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    pub const ROOT: Category = Category::new("");
    pub const TEXT: Category = Category::new("Text");
    pub const WHITESPACE: Category = Category::new("Text.Whitespace");
    pub const ERROR: Category = Category::new("Error");
    pub const KEYWORD: Category = Category::new("Keyword");
    pub const KEYWORD_CONSTANT: Category = Category::new("Keyword.Constant");
    pub const KEYWORD_DECLARATION: Category = Category::new("Keyword.Declaration");
    pub const KEYWORD_NAMESPACE: Category = Category::new("Keyword.Namespace");
    pub const KEYWORD_TYPE: Category = Category::new("Keyword.Type");
    pub const NAME: Category = Category::new("Name");
    pub const NAME_BUILTIN: Category = Category::new("Name.Builtin");
    pub const NAME_CLASS: Category = Category::new("Name.Class");
    pub const NAME_DECORATOR: Category = Category::new("Name.Decorator");
    pub const NAME_FUNCTION: Category = Category::new("Name.Function");
    pub const NAME_TAG: Category = Category::new("Name.Tag");
    pub const STRING: Category = Category::new("String");
    pub const STRING_DOC: Category = Category::new("String.Doc");
    pub const STRING_DOUBLE: Category = Category::new("String.Double");
    pub const STRING_SINGLE: Category = Category::new("String.Single");
    pub const STRING_ESCAPE: Category = Category::new("String.Escape");
    pub const STRING_REGEX: Category = Category::new("String.Regex");
    pub const NUMBER: Category = Category::new("Number");
    pub const NUMBER_FLOAT: Category = Category::new("Number.Float");
    pub const NUMBER_HEX: Category = Category::new("Number.Hex");
    pub const NUMBER_INTEGER: Category = Category::new("Number.Integer");
    pub const OPERATOR: Category = Category::new("Operator");
    pub const OPERATOR_WORD: Category = Category::new("Operator.Word");
    pub const PUNCTUATION: Category = Category::new("Punctuation");
    pub const COMMENT: Category = Category::new("Comment");
    pub const COMMENT_HASHBANG: Category = Category::new("Comment.Hashbang");
    pub const COMMENT_MULTILINE: Category = Category::new("Comment.Multiline");
    pub const COMMENT_PREPROC: Category = Category::new("Comment.Preproc");
    pub const COMMENT_SINGLE: Category = Category::new("Comment.Single");
    pub const GENERIC_DELETED: Category = Category::new("Generic.Deleted");
    pub const GENERIC_HEADING: Category = Category::new("Generic.Heading");
    pub const GENERIC_INSERTED: Category = Category::new("Generic.Inserted");

    pub const fn new(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Build a category from a dynamic path. A leading `Token.` or a bare
    /// `Token` is accepted and stripped so that both spellings compare equal.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim().trim_matches('.');
        let stripped = match trimmed {
            "Token" => "",
            other => other.strip_prefix("Token.").unwrap_or(other),
        };
        if stripped.len() == path.len() {
            Self(Cow::Owned(path))
        } else {
            Self(Cow::Owned(stripped.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent category, or `None` for the root.
    pub fn parent(&self) -> Option<Category> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('.') {
            Some(idx) => Some(Self(Cow::Owned(self.0[..idx].to_string()))),
            None => Some(Self::ROOT),
        }
    }

    /// Path prefixes from this category up to (and including) the root,
    /// longest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        let path = self.as_str();
        let cuts = path.rmatch_indices('.').map(|(idx, _)| &path[..idx]);
        std::iter::once(path)
            .chain(cuts)
            .chain((!path.is_empty()).then_some(""))
    }

    pub fn is_descendant_of(&self, other: &Category) -> bool {
        other.is_root()
            || self.0 == other.0
            || (self.0.starts_with(other.as_str())
                && self.0.as_bytes().get(other.0.len()) == Some(&b'.'))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("Token")
        } else {
            write!(f, "Token.{}", self.0)
        }
    }
}

// Lookups in maps keyed by `Category` can use the plain path.
impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Category {
    fn from(path: &'static str) -> Self {
        Self::new(path)
    }
}

/// Categories a color scheme editor offers, with a short description of
/// what each one covers.
pub const STANDARD_CATEGORIES: &[(Category, &str)] = &[
    (Category::ROOT, "Any kind of token not covered by a more specific category"),
    (Category::TEXT, "Plain text"),
    (Category::WHITESPACE, "Whitespace"),
    (Category::ERROR, "Input the lexer could not classify"),
    (Category::KEYWORD, "Any kind of keyword"),
    (Category::KEYWORD_CONSTANT, "Keywords that are constants, e.g. None"),
    (Category::KEYWORD_DECLARATION, "Keywords declaring variables, e.g. let or var"),
    (Category::KEYWORD_NAMESPACE, "Namespace keywords, e.g. import or use"),
    (Category::KEYWORD_TYPE, "Builtin types that cannot be identifiers, e.g. int"),
    (Category::NAME, "Any name: variables, functions, classes"),
    (Category::NAME_BUILTIN, "Names available in the global namespace"),
    (Category::NAME_CLASS, "Class names at their declaration"),
    (Category::NAME_DECORATOR, "Decorators and attributes"),
    (Category::NAME_FUNCTION, "Function names at their declaration"),
    (Category::NAME_TAG, "Tag names in markup or configuration files"),
    (Category::STRING, "Any string literal"),
    (Category::STRING_DOC, "Documentation strings"),
    (Category::STRING_DOUBLE, "Double quoted strings"),
    (Category::STRING_SINGLE, "Single quoted strings"),
    (Category::STRING_ESCAPE, "Escape sequences inside strings"),
    (Category::STRING_REGEX, "Regular expression literals"),
    (Category::NUMBER, "Any number literal"),
    (Category::NUMBER_FLOAT, "Float literals, e.g. 42.0"),
    (Category::NUMBER_HEX, "Hexadecimal literals, e.g. 0xdeadbeef"),
    (Category::NUMBER_INTEGER, "Integer literals, e.g. 42"),
    (Category::OPERATOR, "Punctuation operators, e.g. + or -"),
    (Category::OPERATOR_WORD, "Operators that are words, e.g. not"),
    (Category::PUNCTUATION, "Punctuation that is not an operator, e.g. ( or ["),
    (Category::COMMENT, "Any comment"),
    (Category::COMMENT_HASHBANG, "Hashbang lines, e.g. #!/bin/sh"),
    (Category::COMMENT_MULTILINE, "Multiline comments"),
    (Category::COMMENT_PREPROC, "Preprocessor directives"),
    (Category::COMMENT_SINGLE, "Comments that end at the end of a line"),
    (Category::GENERIC_DELETED, "Text marked as deleted"),
    (Category::GENERIC_HEADING, "Headlines"),
    (Category::GENERIC_INSERTED, "Text marked as inserted"),
];

/// Description shown next to `category` in a color scheme editor.
pub fn describe(category: &Category) -> Option<&'static str> {
    STANDARD_CATEGORIES
        .iter()
        .find(|(c, _)| c == category)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_chain() {
        let cat = Category::new("Name.Variable.Global");
        let parent = cat.parent().unwrap();
        assert_eq!(parent.as_str(), "Name.Variable");
        assert_eq!(parent.parent().unwrap().as_str(), "Name");
        assert!(parent.parent().unwrap().parent().unwrap().is_root());
        assert!(Category::ROOT.parent().is_none());
    }

    #[test]
    fn test_ancestors_longest_first() {
        let cat = Category::new("String.Double");
        let chain: Vec<&str> = cat.ancestors().collect();
        assert_eq!(chain, vec!["String.Double", "String", ""]);

        let root = Category::ROOT;
        let chain: Vec<&str> = root.ancestors().collect();
        assert_eq!(chain, vec![""]);
    }

    #[test]
    fn test_from_path_strips_token_prefix() {
        assert_eq!(Category::from_path("Token.Keyword"), Category::KEYWORD);
        assert_eq!(Category::from_path("Token"), Category::ROOT);
        assert_eq!(Category::from_path("Comment.Single"), Category::COMMENT_SINGLE);
    }

    #[test]
    fn test_descendant() {
        assert!(Category::STRING_DOUBLE.is_descendant_of(&Category::STRING));
        assert!(Category::STRING.is_descendant_of(&Category::ROOT));
        assert!(!Category::new("Stringy").is_descendant_of(&Category::STRING));
    }

    #[test]
    fn test_display_and_describe() {
        assert_eq!(Category::KEYWORD.to_string(), "Token.Keyword");
        assert_eq!(Category::ROOT.to_string(), "Token");
        assert_eq!(describe(&Category::STRING_DOUBLE), Some("Double quoted strings"));
        assert_eq!(describe(&Category::new("Nope")), None);
    }
}
