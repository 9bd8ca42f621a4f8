use std::sync::Arc;

use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};

use super::{Tokenizer, unsupported};
use crate::app::domain::category::Category;
use crate::app::infrastructure::error::Result;
use crate::app::services::syntax::lines::LinesWithEndings;

/// Scope prefixes and the category they map to. Checked in order, so more
/// specific prefixes come first.
const SCOPE_CATEGORIES: &[(&str, Category)] = &[
    ("comment.line", Category::COMMENT_SINGLE),
    ("comment.block.documentation", Category::STRING_DOC),
    ("comment.block", Category::COMMENT_MULTILINE),
    ("comment", Category::COMMENT),
    ("constant.character.escape", Category::STRING_ESCAPE),
    ("string.regexp", Category::STRING_REGEX),
    ("string.quoted.double", Category::STRING_DOUBLE),
    ("string.quoted.single", Category::STRING_SINGLE),
    ("string", Category::STRING),
    ("constant.numeric.float", Category::NUMBER_FLOAT),
    ("constant.numeric.hex", Category::NUMBER_HEX),
    ("constant.numeric.integer", Category::NUMBER_INTEGER),
    ("constant.numeric", Category::NUMBER),
    ("constant.language", Category::KEYWORD_CONSTANT),
    ("constant", Category::new("Name.Constant")),
    ("keyword.operator.word", Category::OPERATOR_WORD),
    ("keyword.operator.logical", Category::OPERATOR_WORD),
    ("keyword.operator", Category::OPERATOR),
    ("keyword.control.import", Category::KEYWORD_NAMESPACE),
    ("keyword", Category::KEYWORD),
    ("storage.type", Category::KEYWORD_DECLARATION),
    ("storage", Category::KEYWORD),
    ("entity.name.function", Category::NAME_FUNCTION),
    ("entity.name.class", Category::NAME_CLASS),
    ("entity.name.struct", Category::NAME_CLASS),
    ("entity.name.type", Category::NAME_CLASS),
    ("entity.name.tag", Category::NAME_TAG),
    ("entity.name.namespace", Category::new("Name.Namespace")),
    ("entity.other.attribute-name", Category::new("Name.Attribute")),
    ("entity.name", Category::NAME),
    ("support.type", Category::KEYWORD_TYPE),
    ("support", Category::NAME_BUILTIN),
    ("variable.language", Category::new("Name.Builtin.Pseudo")),
    ("variable", Category::new("Name.Variable")),
    ("meta.annotation", Category::NAME_DECORATOR),
    ("markup.heading", Category::GENERIC_HEADING),
    ("markup.inserted", Category::GENERIC_INSERTED),
    ("markup.deleted", Category::GENERIC_DELETED),
    ("invalid", Category::ERROR),
    ("punctuation", Category::PUNCTUATION),
];

fn scope_category(scope: &str) -> Option<&'static Category> {
    SCOPE_CATEGORIES
        .iter()
        .find(|(prefix, _)| {
            scope
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
        .map(|(_, cat)| cat)
}

/// Innermost scope with a known category wins. Delimiter punctuation
/// (`punctuation.definition.*`) is skipped so quotes and comment markers
/// take the category of the string or comment around them.
fn stack_category(stack: &ScopeStack) -> Category {
    stack
        .as_slice()
        .iter()
        .rev()
        .map(|scope| scope.build_string())
        .filter(|scope| !scope.starts_with("punctuation.definition"))
        .find_map(|scope| scope_category(&scope).cloned())
        .unwrap_or(Category::TEXT)
}

/// Tokenizer backed by a syntect (Sublime syntax) definition.
pub struct SyntectTokenizer {
    syntax_set: Arc<SyntaxSet>,
    syntax: SyntaxReference,
}

impl SyntectTokenizer {
    pub fn new(syntax_set: Arc<SyntaxSet>, language: &str) -> Result<Self> {
        let syntax = syntax_set
            .find_syntax_by_token(language.trim())
            .ok_or_else(|| unsupported(language))?
            .clone();
        Ok(Self { syntax_set, syntax })
    }

    /// Tokenize one line, appending to `out`. Returns `false` when syntect
    /// reports an error, after covering the rest of the line as plain text.
    fn tokenize_line<'t>(
        &self,
        line: &'t str,
        parse_state: &mut ParseState,
        stack: &mut ScopeStack,
        out: &mut Vec<(Category, &'t str)>,
    ) -> bool {
        let Ok(ops) = parse_state.parse_line(line, &self.syntax_set) else {
            out.push((Category::TEXT, line));
            return false;
        };

        let mut cursor = 0;
        for (offset, op) in ops {
            let offset = offset.min(line.len());
            if offset > cursor {
                out.push((stack_category(stack), &line[cursor..offset]));
                cursor = offset;
            }
            if stack.apply(&op).is_err() {
                if cursor < line.len() {
                    out.push((Category::TEXT, &line[cursor..]));
                }
                return false;
            }
        }
        if cursor < line.len() {
            out.push((stack_category(stack), &line[cursor..]));
        }
        true
    }
}

impl Tokenizer for SyntectTokenizer {
    fn language(&self) -> &str {
        &self.syntax.name
    }

    fn tokenize<'t>(&self, text: &'t str) -> Vec<(Category, &'t str)> {
        let mut parse_state = ParseState::new(&self.syntax);
        let mut stack = ScopeStack::new();
        let mut tokens = Vec::new();
        let mut consumed = 0;

        for line in LinesWithEndings::new(text) {
            if !self.tokenize_line(line, &mut parse_state, &mut stack, &mut tokens) {
                consumed += line.len();
                if consumed < text.len() {
                    tokens.push((Category::TEXT, &text[consumed..]));
                }
                return tokens;
            }
            consumed += line.len();
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> SyntectTokenizer {
        SyntectTokenizer::new(Arc::new(SyntaxSet::load_defaults_newlines()), "python").unwrap()
    }

    #[test]
    fn test_scope_prefix_matching() {
        assert_eq!(
            scope_category("comment.line.number-sign.python"),
            Some(&Category::COMMENT_SINGLE)
        );
        assert_eq!(scope_category("keyword.control.flow.python"), Some(&Category::KEYWORD));
        assert_eq!(scope_category("keywordish"), None);
        assert_eq!(scope_category("source.python"), None);
    }

    #[test]
    fn test_covers_text_and_classifies() {
        let tokenizer = python();
        let text = "# hi\ndef f(x):\n    return \"s\" + 1\n";
        let tokens = tokenizer.tokenize(text);
        let joined: String = tokens.iter().map(|(_, s)| *s).collect();
        assert_eq!(joined, text);

        let comment: String = tokens
            .iter()
            .filter(|(c, _)| c.is_descendant_of(&Category::COMMENT))
            .map(|(_, s)| *s)
            .collect();
        assert!(comment.starts_with("# hi"));

        let has = |pred: &dyn Fn(&Category, &str) -> bool| tokens.iter().any(|(c, s)| pred(c, *s));
        assert!(has(&|c, s| c.is_descendant_of(&Category::STRING) && s.contains('s')));
        assert!(has(&|c, s| *c == Category::NAME_FUNCTION && s == "f"));
        assert!(has(&|c, s| c.is_descendant_of(&Category::KEYWORD) && s == "return"));
    }

    #[test]
    fn test_unknown_language() {
        let set = Arc::new(SyntaxSet::load_defaults_newlines());
        assert!(SyntectTokenizer::new(set, "klingon").is_err());
    }
}
