use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Rule};
use crate::lexer::{self, TokenKind};
use crate::parser::Parser;
use crate::utils::{GrammarError, Result};

/// Configuration options for grammar behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Maximum non-terminal nesting during generation; `None` means unbounded
    pub max_recursion_depth: Option<usize>,
    /// Whether the loader skips lines starting with `#`
    pub ignore_comments: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            max_recursion_depth: None,
            ignore_comments: true,
        }
    }
}

impl GrammarConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(io::BufReader::new(file))?;
        Ok(config)
    }
}

/// A rule table plus the start symbol generation begins from
#[derive(Debug, Clone)]
pub struct Grammar {
    /// The rules mapping non-terminals to their bodies
    rules: HashMap<String, Expr>,
    /// The starting symbol for generation
    start_symbol: String,
    /// Configuration options
    config: GrammarConfig,
}

impl Grammar {
    /// Create a new empty grammar with a specified start symbol
    pub fn new(start_symbol: &str) -> Self {
        Grammar::with_config(start_symbol, GrammarConfig::default())
    }

    /// Create a new grammar with custom configuration
    pub fn with_config(start_symbol: &str, config: GrammarConfig) -> Self {
        Grammar {
            rules: HashMap::new(),
            start_symbol: start_symbol.to_string(),
            config,
        }
    }

    /// Parse a grammar from a file, one rule per line
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        start_symbol: &str,
        config: GrammarConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading grammar from {}", path.display());
        let file = File::open(path)?;
        let mut grammar = Grammar::with_config(start_symbol, config);

        for (index, line) in io::BufReader::new(file).lines().enumerate() {
            let line = line?;
            grammar.add_rule_line(&line).map_err(|e| GrammarError::AtLine {
                line: index + 1,
                source: Box::new(e),
            })?;
        }

        Ok(grammar)
    }

    /// Parse a grammar held in memory, one rule per line
    pub fn parse_str(source: &str, start_symbol: &str, config: GrammarConfig) -> Result<Self> {
        let mut grammar = Grammar::with_config(start_symbol, config);

        for (index, line) in source.lines().enumerate() {
            grammar.add_rule_line(line).map_err(|e| GrammarError::AtLine {
                line: index + 1,
                source: Box::new(e),
            })?;
        }

        Ok(grammar)
    }

    /// Parse one source line and register the rule it defines, if any.
    ///
    /// Returns whether a rule was added.
    pub fn add_rule_line(&mut self, line: &str) -> Result<bool> {
        if self.config.ignore_comments && line.trim_start().starts_with('#') {
            return Ok(false);
        }
        match Self::parse_rule(line)? {
            Some(rule) => {
                self.add_rule(&rule.head, rule.body);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Parse a `<head> ::= body` line into a rule.
    ///
    /// Blank lines yield `None`. Tokens after a complete body are dropped.
    pub fn parse_rule(line: &str) -> Result<Option<Rule>> {
        let tokens = lexer::scan(line)?;
        let (head, body) = match tokens.as_slice() {
            [] => return Ok(None),
            [head, assign, body @ ..]
                if head.is(TokenKind::NonTerminal) && assign.is(TokenKind::Equals) =>
            {
                (head, body)
            }
            [head, rest @ ..] => {
                let offset = if head.is(TokenKind::NonTerminal) {
                    rest.first().map_or(head.offset + head.width(), |t| t.offset)
                } else {
                    head.offset
                };
                return Err(GrammarError::MalformedRule {
                    offset,
                    line: line.to_string(),
                });
            }
        };

        let mut parser = Parser::new(body, line);
        let expr = parser.parse()?;

        let leftover = parser.remaining();
        if let Some(first) = leftover.first() {
            warn!(
                "ignoring {} trailing token(s) in rule <{}> starting at column {}",
                leftover.len(),
                head.text,
                first.offset
            );
        }

        Ok(Some(Rule {
            head: head.text.clone(),
            body: expr,
        }))
    }

    /// Add a rule to the grammar, replacing any earlier rule with the same head
    pub fn add_rule(&mut self, head: &str, body: Expr) -> &mut Self {
        if self.rules.insert(head.to_string(), body).is_some() {
            debug!("rule <{}> redefined; keeping the latest definition", head);
        } else {
            debug!("registered rule <{}>", head);
        }
        self
    }

    /// Look up the body registered for `name`
    pub fn lookup(&self, name: &str) -> Result<&Expr> {
        self.rules
            .get(name)
            .ok_or_else(|| GrammarError::UnknownSymbol(name.to_string()))
    }

    /// Generate one derivation of the start symbol
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
        self.generate_symbol(&self.start_symbol, rng)
    }

    /// Generate one derivation of an arbitrary non-terminal
    pub fn generate_symbol<R: Rng + ?Sized>(&self, symbol: &str, rng: &mut R) -> Result<String> {
        let body = self.lookup(symbol)?;
        let mut out = String::new();
        self.expand(body, rng, 1, &mut out)?;
        Ok(out)
    }

    /// Randomly expand `expr` into text.
    ///
    /// On failure no partial text is returned.
    pub fn generate_expr<R: Rng + ?Sized>(&self, expr: &Expr, rng: &mut R) -> Result<String> {
        let mut out = String::new();
        self.expand(expr, rng, 0, &mut out)?;
        Ok(out)
    }

    /// Recursively expand `expr`, appending to `out`
    fn expand<R: Rng + ?Sized>(
        &self,
        expr: &Expr,
        rng: &mut R,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        match expr {
            Expr::Sequence(items) => {
                for item in items {
                    self.expand(item, rng, depth, out)?;
                }
            }
            Expr::Choice(alternatives) => {
                debug_assert!(!alternatives.is_empty(), "choice without alternatives");
                let index = rng.gen_range(0..alternatives.len());
                self.expand(&alternatives[index], rng, depth, out)?;
            }
            Expr::Optional(inner) => {
                if rng.gen_bool(0.5) {
                    self.expand(inner, rng, depth, out)?;
                }
            }
            Expr::Repetition { min, max, inner } => {
                let count = rng.gen_range(*min..=*max);
                for _ in 0..count {
                    self.expand(inner, rng, depth, out)?;
                }
            }
            Expr::String(text) | Expr::Digit(text) => out.push_str(text),
            Expr::NonTerminal(name) => {
                let depth = depth + 1;
                if let Some(limit) = self.config.max_recursion_depth {
                    if depth > limit {
                        return Err(GrammarError::RecursionLimit {
                            symbol: name.clone(),
                            depth: limit,
                        });
                    }
                }
                trace!("expanding <{}> at depth {}", name, depth);
                let body = self.lookup(name)?;
                self.expand(body, rng, depth, out)?;
            }
        }
        Ok(())
    }

    /// Check if the grammar contains a specific non-terminal
    pub fn has_non_terminal(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Get a reference to the grammar's rules
    pub fn rules(&self) -> &HashMap<String, Expr> {
        &self.rules
    }

    /// Get the start symbol
    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ParseErrorKind;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    /// An rng whose every draw is zero: first alternative, optional taken,
    /// repetition at its minimum.
    fn low_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn grammar(source: &str, start: &str) -> Grammar {
        Grammar::parse_str(source, start, GrammarConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_rule() {
        let rule = Grammar::parse_rule("<full-name> ::= <first-name> \" \" <last-name>")
            .unwrap()
            .unwrap();
        assert_eq!(rule.head, "full-name");
        assert_eq!(
            rule.body,
            Expr::Sequence(vec![
                Expr::non_terminal("first-name"),
                Expr::string(" "),
                Expr::non_terminal("last-name"),
            ])
        );
    }

    #[test]
    fn test_parse_rule_blank_line() {
        assert!(Grammar::parse_rule("").unwrap().is_none());
        assert!(Grammar::parse_rule("    ").unwrap().is_none());
    }

    #[test]
    fn test_parse_rule_requires_head_and_assignment() {
        let err = Grammar::parse_rule("\"a\" ::= \"b\"").unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { offset: 0, .. }));

        let err = Grammar::parse_rule("<a> \"b\"").unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { offset: 4, .. }));

        let err = Grammar::parse_rule("<a>").unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { offset: 3, .. }));
    }

    #[test]
    fn test_parse_rule_reports_bound_violation() {
        let err = Grammar::parse_rule("<digits> ::= 5*3<digit>").unwrap_err();
        match err {
            GrammarError::Parse(e) => {
                assert_eq!(e.kind, ParseErrorKind::BoundViolation { min: 5, max: 3 });
                assert_eq!(e.offset, 13);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rule_drops_trailing_tokens() {
        let rule = Grammar::parse_rule("<a> ::= \"x\" ) ]").unwrap().unwrap();
        assert_eq!(rule.body, Expr::Sequence(vec![Expr::string("x")]));
    }

    #[test]
    fn test_last_definition_wins() {
        let g = grammar("<s> ::= \"first\"\n<s> ::= \"second\"", "s");
        assert_eq!(g.rules().len(), 1);
        assert_eq!(g.generate(&mut low_rng()).unwrap(), "second");
    }

    #[test]
    fn test_comments_skipped_when_enabled() {
        let g = grammar("# names\n<s> ::= \"a\"", "s");
        assert!(g.has_non_terminal("s"));

        let config = GrammarConfig {
            ignore_comments: false,
            ..GrammarConfig::default()
        };
        let err = Grammar::parse_str("# names\n<s> ::= \"a\"", "s", config).unwrap_err();
        assert!(matches!(err, GrammarError::AtLine { line: 1, .. }));
        assert!(matches!(err.root(), GrammarError::Lex(_)));
    }

    #[test]
    fn test_repetition_exact_count() {
        let g = Grammar::new("s");
        let expr = Expr::repetition(2, 2, Expr::string("x"));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(g.generate_expr(&expr, &mut rng).unwrap(), "xx");
        }
    }

    #[test]
    fn test_repetition_within_bounds() {
        let g = Grammar::new("s");
        let expr = Expr::repetition(3, 5, Expr::Digit("7".to_string()));
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let len = g.generate_expr(&expr, &mut rng).unwrap().len();
            assert!((3..=5).contains(&len), "length {} out of range", len);
        }
    }

    #[test]
    fn test_optional_is_fair() {
        let g = Grammar::new("s");
        let expr = Expr::optional(Expr::string("x"));
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;
        let mut present = 0;
        for _ in 0..trials {
            match g.generate_expr(&expr, &mut rng).unwrap().as_str() {
                "x" => present += 1,
                "" => {}
                other => panic!("unexpected output {:?}", other),
            }
        }
        assert!(
            (4_500..=5_500).contains(&present),
            "optional taken {} of {} times",
            present,
            trials
        );
    }

    #[test]
    fn test_zero_rng_takes_lowest_branches() {
        let g = grammar(
            "<s> ::= (\"a\" | \"b\") [\"?\"] 1*3\"z\" {\"w\"}",
            "s",
        );
        assert_eq!(g.generate(&mut low_rng()).unwrap(), "a?z");
    }

    #[test]
    fn test_choice_only_yields_alternatives() {
        let g = grammar("<s> ::= \"a\" | \"b\"", "s");
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen_a = false;
        let mut seen_b = false;
        for _ in 0..100 {
            match g.generate(&mut rng).unwrap().as_str() {
                "a" => seen_a = true,
                "b" => seen_b = true,
                other => panic!("unexpected output {:?}", other),
            }
        }
        assert!(seen_a && seen_b);
    }

    #[test]
    #[should_panic(expected = "choice without alternatives")]
    fn test_empty_choice_is_rejected() {
        let g = Grammar::new("s");
        let _ = g.generate_expr(&Expr::Choice(vec![]), &mut low_rng());
    }

    #[test]
    fn test_unknown_start_symbol() {
        let g = grammar("<s> ::= \"a\"", "missing");
        let err = g.generate(&mut low_rng()).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol(ref name) if name == "missing"));
        assert!(matches!(g.lookup("missing"), Err(GrammarError::UnknownSymbol(_))));
    }

    #[test]
    fn test_unknown_symbol_is_lazy() {
        let g = grammar("<s> ::= \"ok\" | <undefined>", "s");
        // The zero rng always takes the first alternative, so the missing rule is never visited
        assert_eq!(g.generate(&mut low_rng()).unwrap(), "ok");

        let g = grammar("<s> ::= \"partial\" <undefined>", "s");
        let err = g.generate(&mut low_rng()).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol(ref name) if name == "undefined"));
    }

    #[test]
    fn test_recursion_limit() {
        let config = GrammarConfig {
            max_recursion_depth: Some(5),
            ..GrammarConfig::default()
        };
        let g = Grammar::parse_str("<loop> ::= \"x\" <loop>", "loop", config).unwrap();
        let err = g.generate(&mut low_rng()).unwrap_err();
        assert!(matches!(err, GrammarError::RecursionLimit { depth: 5, .. }));
    }

    #[test]
    fn test_recursion_limit_allows_shallow_grammars() {
        let config = GrammarConfig {
            max_recursion_depth: Some(2),
            ..GrammarConfig::default()
        };
        let g = Grammar::parse_str("<s> ::= <t>\n<t> ::= \"leaf\"", "s", config).unwrap();
        assert_eq!(g.generate(&mut low_rng()).unwrap(), "leaf");
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: GrammarConfig = serde_json::from_str(r#"{"max_recursion_depth": 40}"#).unwrap();
        assert_eq!(config.max_recursion_depth, Some(40));
        assert!(config.ignore_comments);
    }
}
