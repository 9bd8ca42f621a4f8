use regex_lite::Regex;

use super::{Tokenizer, unsupported};
use crate::app::domain::category::Category;
use crate::app::infrastructure::error::{HighlightError, Result};

/// How a rule's match is classified.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Fixed category.
    Token(Category),
    /// Identifier, classified against the language's word lists.
    Word,
}

/// Lexical description of a language for [`KeywordTokenizer`].
///
/// Rules are tried in order at every position; the first non-empty match
/// wins. Patterns are implicitly anchored at the current position.
pub struct LanguageDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub constants: &'static [&'static str],
    pub namespace_keywords: &'static [&'static str],
    pub declaration_keywords: &'static [&'static str],
    pub types: &'static [&'static str],
    pub word_operators: &'static [&'static str],
    pub builtins: &'static [&'static str],
    /// Keywords after which the next identifier names a function.
    pub function_introducers: &'static [&'static str],
    /// Keywords after which the next identifier names a class or type.
    pub class_introducers: &'static [&'static str],
    pub rules: &'static [(&'static str, RuleKind)],
}

impl LanguageDef {
    fn matches(&self, language: &str) -> bool {
        self.name.eq_ignore_ascii_case(language)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(language))
    }

    fn classify_word(&self, word: &str) -> Category {
        if self.constants.contains(&word) {
            Category::KEYWORD_CONSTANT
        } else if self.namespace_keywords.contains(&word) {
            Category::KEYWORD_NAMESPACE
        } else if self.declaration_keywords.contains(&word) {
            Category::KEYWORD_DECLARATION
        } else if self.word_operators.contains(&word) {
            Category::OPERATOR_WORD
        } else if self.keywords.contains(&word) {
            Category::KEYWORD
        } else if self.types.contains(&word) {
            Category::KEYWORD_TYPE
        } else if self.builtins.contains(&word) {
            Category::NAME_BUILTIN
        } else {
            Category::NAME
        }
    }
}

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";

pub static LANGUAGES: &[LanguageDef] = &[PYTHON, RUST, PLAIN];

const PYTHON: LanguageDef = LanguageDef {
    name: "python",
    aliases: &["py", "python3", "py3"],
    extensions: &["py", "pyw", "pyi"],
    keywords: &[
        "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
        "else", "except", "finally", "for", "global", "if", "lambda", "nonlocal", "pass",
        "raise", "return", "try", "while", "with", "yield", "match", "case",
    ],
    constants: &["True", "False", "None"],
    namespace_keywords: &["import", "from", "as"],
    declaration_keywords: &[],
    types: &[],
    word_operators: &["and", "or", "not", "in", "is"],
    builtins: &[
        "abs", "all", "any", "bool", "bytes", "dict", "enumerate", "filter", "float",
        "int", "isinstance", "len", "list", "map", "max", "min", "open", "print",
        "range", "repr", "self", "set", "sorted", "str", "sum", "super", "tuple", "type",
        "zip",
    ],
    function_introducers: &["def"],
    class_introducers: &["class"],
    rules: &[
        (r"[ \t\r\n\x0c]+", RuleKind::Token(Category::WHITESPACE)),
        (r"#![^\n]*", RuleKind::Token(Category::COMMENT_HASHBANG)),
        (r"#[^\n]*", RuleKind::Token(Category::COMMENT_SINGLE)),
        (r#"(?i:[rbuf]{0,2})"""(?s:.*?)(?:"""|\z)"#, RuleKind::Token(Category::STRING_DOUBLE)),
        (r"(?i:[rbuf]{0,2})'''(?s:.*?)(?:'''|\z)", RuleKind::Token(Category::STRING_SINGLE)),
        (r#"(?i:[rbuf]{0,2})"(?:[^"\\\n]|\\.)*"?"#, RuleKind::Token(Category::STRING_DOUBLE)),
        (r"(?i:[rbuf]{0,2})'(?:[^'\\\n]|\\.)*'?", RuleKind::Token(Category::STRING_SINGLE)),
        (r"@[A-Za-z_][A-Za-z0-9_.]*", RuleKind::Token(Category::NAME_DECORATOR)),
        (r"0[xX][0-9a-fA-F_]+", RuleKind::Token(Category::NUMBER_HEX)),
        (
            concat!(
                r"(?:[0-9][0-9_]*\.[0-9_]*|\.[0-9][0-9_]*)(?:[eE][+-]?[0-9]+)?",
                r"|[0-9][0-9_]*[eE][+-]?[0-9]+",
            ),
            RuleKind::Token(Category::NUMBER_FLOAT),
        ),
        (r"[0-9][0-9_]*", RuleKind::Token(Category::NUMBER_INTEGER)),
        (IDENT, RuleKind::Word),
        (r"[-+*/%=<>!&|^~]+", RuleKind::Token(Category::OPERATOR)),
        (r"[()\[\]{},;:.]", RuleKind::Token(Category::PUNCTUATION)),
    ],
};

const RUST: LanguageDef = LanguageDef {
    name: "rust",
    aliases: &["rs"],
    extensions: &["rs"],
    keywords: &[
        "as", "async", "await", "break", "continue", "crate", "dyn", "else", "extern", "for",
        "if", "impl", "in", "loop", "match", "move", "pub", "ref", "return", "unsafe",
        "where", "while",
    ],
    constants: &["true", "false", "None", "Some", "Ok", "Err"],
    namespace_keywords: &["use", "mod"],
    declaration_keywords: &[
        "let", "mut", "const", "static", "fn", "struct", "enum", "trait", "type",
    ],
    types: &[
        "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16",
        "i32", "i64", "i128", "isize", "f32", "f64", "Self",
    ],
    word_operators: &[],
    builtins: &["self", "super", "String", "Vec", "Option", "Result", "Box"],
    function_introducers: &["fn"],
    class_introducers: &["struct", "enum", "trait", "type"],
    rules: &[
        (r"[ \t\r\n\x0c]+", RuleKind::Token(Category::WHITESPACE)),
        (r"///[^\n]*|//![^\n]*", RuleKind::Token(Category::STRING_DOC)),
        (r"//[^\n]*", RuleKind::Token(Category::COMMENT_SINGLE)),
        (r"/\*(?s:.*?)(?:\*/|\z)", RuleKind::Token(Category::COMMENT_MULTILINE)),
        (r"#!?\[[^\]\n]*\]?", RuleKind::Token(Category::NAME_DECORATOR)),
        (r#"b?"(?:[^"\\]|\\(?s:.))*"?"#, RuleKind::Token(Category::STRING_DOUBLE)),
        (r"b?'(?:[^'\\\n]|\\[^\n]+?)'", RuleKind::Token(Category::new("String.Char"))),
        (r"'[A-Za-z_][A-Za-z0-9_]*", RuleKind::Token(Category::new("Name.Label"))),
        (
            r"0[xX][0-9a-fA-F_]+(?:[iu](?:8|16|32|64|128|size))?",
            RuleKind::Token(Category::NUMBER_HEX),
        ),
        (
            r"[0-9][0-9_]*\.[0-9][0-9_]*(?:[eE][+-]?[0-9]+)?(?:f32|f64)?",
            RuleKind::Token(Category::NUMBER_FLOAT),
        ),
        (
            r"[0-9][0-9_]*(?:[iu](?:8|16|32|64|128|size))?",
            RuleKind::Token(Category::NUMBER_INTEGER),
        ),
        (r"[A-Za-z_][A-Za-z0-9_]*!", RuleKind::Token(Category::new("Name.Function.Magic"))),
        (IDENT, RuleKind::Word),
        (r"[-+*/%=<>!&|^~?]+", RuleKind::Token(Category::OPERATOR)),
        (r"[()\[\]{},;:.@#$]", RuleKind::Token(Category::PUNCTUATION)),
    ],
};

const PLAIN: LanguageDef = LanguageDef {
    name: "text",
    aliases: &["plain", "txt", "plaintext"],
    extensions: &["txt"],
    keywords: &[],
    constants: &[],
    namespace_keywords: &[],
    declaration_keywords: &[],
    types: &[],
    word_operators: &[],
    builtins: &[],
    function_introducers: &[],
    class_introducers: &[],
    rules: &[(r"(?s:.)+", RuleKind::Token(Category::TEXT))],
};

struct Rule {
    pattern: Regex,
    kind: RuleKind,
}

/// Generic keyword-aware tokenizer driven by a [`LanguageDef`].
pub struct KeywordTokenizer {
    def: &'static LanguageDef,
    rules: Vec<Rule>,
}

impl KeywordTokenizer {
    pub fn new(def: &'static LanguageDef) -> Result<Self> {
        let rules = def
            .rules
            .iter()
            .map(|(pattern, kind)| {
                let pattern = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                    HighlightError::Syntax(format!("{} rule {pattern:?}: {e}", def.name))
                })?;
                Ok(Rule {
                    pattern,
                    kind: kind.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { def, rules })
    }

    pub fn for_language(language: &str) -> Result<Self> {
        let def = LANGUAGES
            .iter()
            .find(|def| def.matches(language.trim()))
            .ok_or_else(|| unsupported(language))?;
        Self::new(def)
    }

    /// Length and category of the token at the start of `rest`.
    fn next_token(&self, rest: &str, introduced: &mut Option<Category>) -> (usize, Category) {
        for rule in &self.rules {
            let Some(m) = rule.pattern.find(rest) else {
                continue;
            };
            if m.start() != 0 || m.end() == 0 {
                continue;
            }
            let word = m.as_str();
            let category = match rule.kind {
                RuleKind::Token(ref cat) => {
                    if *cat != Category::WHITESPACE {
                        *introduced = None;
                    }
                    cat.clone()
                }
                RuleKind::Word => self.classify(word, introduced),
            };
            return (word.len(), category);
        }

        // Nothing matched: consume one character so the scan always advances.
        *introduced = None;
        let len = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        (len, Category::ERROR)
    }

    fn classify(&self, word: &str, introduced: &mut Option<Category>) -> Category {
        if let Some(cat) = introduced.take() {
            if self.def.classify_word(word) == Category::NAME {
                return cat;
            }
        }
        if self.def.function_introducers.contains(&word) {
            *introduced = Some(Category::NAME_FUNCTION);
        } else if self.def.class_introducers.contains(&word) {
            *introduced = Some(Category::NAME_CLASS);
        }
        self.def.classify_word(word)
    }
}

impl Tokenizer for KeywordTokenizer {
    fn language(&self) -> &str {
        self.def.name
    }

    fn tokenize<'t>(&self, text: &'t str) -> Vec<(Category, &'t str)> {
        let mut tokens = Vec::new();
        let mut introduced = None;
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let (len, category) = self.next_token(rest, &mut introduced);
            tokens.push((category, &rest[..len]));
            pos += len;
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> KeywordTokenizer {
        KeywordTokenizer::for_language("python").unwrap()
    }

    fn rust() -> KeywordTokenizer {
        KeywordTokenizer::for_language("rust").unwrap()
    }

    fn non_ws<'t>(tokens: &[(Category, &'t str)]) -> Vec<(Category, &'t str)> {
        tokens
            .iter()
            .filter(|(c, _)| *c != Category::WHITESPACE)
            .cloned()
            .collect()
    }

    #[test]
    fn test_all_rule_patterns_compile() {
        for def in LANGUAGES {
            assert!(KeywordTokenizer::new(def).is_ok(), "{} rules", def.name);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(KeywordTokenizer::for_language("PY").unwrap().language(), "python");
        assert_eq!(KeywordTokenizer::for_language("rs").unwrap().language(), "rust");
        assert_eq!(KeywordTokenizer::for_language("plain").unwrap().language(), "text");
    }

    #[test]
    fn test_python_function_definition() {
        let tokens = python().tokenize("def f():\n    pass\n");
        assert_eq!(
            non_ws(&tokens),
            vec![
                (Category::KEYWORD, "def"),
                (Category::NAME_FUNCTION, "f"),
                (Category::PUNCTUATION, "("),
                (Category::PUNCTUATION, ")"),
                (Category::PUNCTUATION, ":"),
                (Category::KEYWORD, "pass"),
            ]
        );
        let joined: String = tokens.iter().map(|(_, s)| *s).collect();
        assert_eq!(joined, "def f():\n    pass\n");
    }

    #[test]
    fn test_python_word_classes() {
        let tokens = python().tokenize("from os import path as p\nx = None if not y else len(z)");
        let cats: Vec<(Category, &str)> = non_ws(&tokens);
        assert!(cats.contains(&(Category::KEYWORD_NAMESPACE, "from")));
        assert!(cats.contains(&(Category::KEYWORD_NAMESPACE, "import")));
        assert!(cats.contains(&(Category::KEYWORD_CONSTANT, "None")));
        assert!(cats.contains(&(Category::OPERATOR_WORD, "not")));
        assert!(cats.contains(&(Category::NAME_BUILTIN, "len")));
        assert!(cats.contains(&(Category::NAME, "path")));
        assert!(cats.contains(&(Category::OPERATOR, "=")));
    }

    #[test]
    fn test_python_triple_quoted_string_spans_lines() {
        let text = "x = \"\"\"one\ntwo\"\"\"\ny = 1\n";
        let tokens = python().tokenize(text);
        assert!(tokens.contains(&(Category::STRING_DOUBLE, "\"\"\"one\ntwo\"\"\"")));
        assert!(tokens.contains(&(Category::NUMBER_INTEGER, "1")));
    }

    #[test]
    fn test_python_unterminated_triple_quote_runs_to_end() {
        let text = "s = '''open\nstill open\n";
        let tokens = python().tokenize(text);
        assert_eq!(tokens.last(), Some(&(Category::STRING_SINGLE, "'''open\nstill open\n")));
    }

    #[test]
    fn test_python_comments_and_numbers() {
        let tokens = python().tokenize("#!/usr/bin/env python\nx = 0x1f + 2.5e3  # note\n");
        let cats = non_ws(&tokens);
        assert_eq!(cats[0], (Category::COMMENT_HASHBANG, "#!/usr/bin/env python"));
        assert!(cats.contains(&(Category::NUMBER_HEX, "0x1f")));
        assert!(cats.contains(&(Category::NUMBER_FLOAT, "2.5e3")));
        assert_eq!(cats.last(), Some(&(Category::COMMENT_SINGLE, "# note")));
    }

    #[test]
    fn test_python_class_and_decorator() {
        let tokens = python().tokenize("@dataclass\nclass Point:\n    pass\n");
        let cats = non_ws(&tokens);
        assert_eq!(cats[0], (Category::NAME_DECORATOR, "@dataclass"));
        assert_eq!(cats[1], (Category::KEYWORD, "class"));
        assert_eq!(cats[2], (Category::NAME_CLASS, "Point"));
    }

    #[test]
    fn test_rust_tokens() {
        let text = concat!(
            "/// docs\n#[derive(Debug)]\n",
            "pub fn main() { let x: u8 = 1; println!(\"hi\"); }\n",
        );
        let cats = non_ws(&rust().tokenize(text));
        assert_eq!(cats[0], (Category::STRING_DOC, "/// docs"));
        assert_eq!(cats[1], (Category::NAME_DECORATOR, "#[derive(Debug)]"));
        assert!(cats.contains(&(Category::KEYWORD_DECLARATION, "fn")));
        assert!(cats.contains(&(Category::NAME_FUNCTION, "main")));
        assert!(cats.contains(&(Category::KEYWORD_TYPE, "u8")));
        assert!(cats.contains(&(Category::new("Name.Function.Magic"), "println!")));
        assert!(cats.contains(&(Category::STRING_DOUBLE, "\"hi\"")));
    }

    #[test]
    fn test_rust_lifetime_vs_char() {
        let cats = non_ws(&rust().tokenize("fn f<'a>(c: char) { 'x'; }"));
        assert!(cats.contains(&(Category::new("Name.Label"), "'a")));
        assert!(cats.contains(&(Category::new("String.Char"), "'x'")));
    }

    #[test]
    fn test_unknown_characters_still_covered() {
        let text = "x = «é» $\n";
        let tokens = python().tokenize(text);
        let joined: String = tokens.iter().map(|(_, s)| *s).collect();
        assert_eq!(joined, text);
        assert!(tokens.iter().any(|(c, s)| *c == Category::ERROR && *s == "«"));
    }

    #[test]
    fn test_plain_language_is_one_token() {
        let tokenizer = KeywordTokenizer::for_language("text").unwrap();
        let tokens = tokenizer.tokenize("def (x)\n");
        assert_eq!(tokens, vec![(Category::TEXT, "def (x)\n")]);
    }
}
