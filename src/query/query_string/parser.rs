//! Recursive descent parser for query strings
//!
//! # Grammar
//!
//! ```text
//! query       := clause*
//! clause      := conjunction? modifier? (field_query | grouped | term_expr)
//! conjunction := AND | OR
//! modifier    := '+' | '-' | NOT
//! field_query := TERM COLON (grouped | term_expr)
//! grouped     := '(' query ')' boost?
//! term_expr   := TERM boost? | QUOTED (TILDE slop)? boost?
//! boost       := CARET number
//! ```
//!
//! Clauses combine the way the classic Lucene query parser combines them:
//! `AND` makes both neighbours required, `+` and `-`/`NOT` mark a clause
//! required or prohibited, and everything else is combined with the default
//! operator. Unquoted terms go through the analyzer of their field; a term
//! that yields several tokens becomes a phrase, a term that yields none
//! matches nothing.

use super::lexer::{Lexer, Token};
use crate::analysis::{FieldAnalyzers, Term};
use crate::error::{Result, TalkdexError};
use crate::query::ast::{MatchAllQuery, MatchNoneQuery, QueryNode};
use crate::query::nodes::{BoolQuery, PhraseQuery, PrefixQuery, TermQuery};

/// Operator used between clauses without an explicit conjunction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefaultOperator {
    And,
    #[default]
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Occur {
    Must,
    Should,
    MustNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// Deepest group nesting accepted by the parser
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser for Lucene-style query strings
pub struct QueryStringParser<'a> {
    lexer: Lexer,
    current_token: Token,
    /// Char offset of `current_token`
    position: usize,
    analyzers: &'a FieldAnalyzers,
    /// Default field for unqualified terms
    default_field: String,
    /// Default operator between terms (AND or OR)
    default_operator: DefaultOperator,
    /// Groups currently open
    depth: usize,
}

impl<'a> QueryStringParser<'a> {
    /// Create a new parser for the given query string
    pub fn new(
        input: &str,
        analyzers: &'a FieldAnalyzers,
        default_field: impl Into<String>,
    ) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        let position = lexer.token_start();

        Ok(Self {
            lexer,
            current_token,
            position,
            analyzers,
            default_field: default_field.into(),
            default_operator: DefaultOperator::Or,
            depth: 0,
        })
    }

    /// Set the default operator between terms
    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Parse the query string into a query AST
    pub fn parse(&mut self) -> Result<Box<dyn QueryNode>> {
        let query = self.parse_query()?;

        // Ensure we've consumed all input
        if self.current_token != Token::Eof {
            return Err(self.error(format!("Unexpected {}", describe(&self.current_token))));
        }

        Ok(query)
    }

    /// Parse: query := clause*
    fn parse_query(&mut self) -> Result<Box<dyn QueryNode>> {
        let mut clauses: Vec<(Occur, Box<dyn QueryNode>)> = Vec::new();
        let mut first_modifier = Modifier::None;

        while !matches!(self.current_token, Token::Eof | Token::RightParen) {
            let start = self.position;
            let conjunction = self.parse_conjunction()?;
            if conjunction.is_some() && clauses.is_empty() {
                return Err(TalkdexError::query_parse(
                    start,
                    "Expected a term before the operator",
                ));
            }

            let modifier = self.parse_modifier()?;
            if clauses.is_empty() {
                first_modifier = modifier;
            }

            let clause = self.parse_clause()?;
            self.add_clause(&mut clauses, conjunction, modifier, clause);
        }

        if clauses.len() == 1 && first_modifier == Modifier::None {
            if let Some((_, query)) = clauses.pop() {
                return Ok(query);
            }
        }

        if clauses.is_empty() {
            return Ok(Box::new(MatchNoneQuery));
        }

        let mut query = BoolQuery::new();
        for (occur, clause) in clauses {
            query = match occur {
                Occur::Must => query.must_boxed(clause),
                Occur::Should => query.should_boxed(clause),
                Occur::MustNot => query.must_not_boxed(clause),
            };
        }
        Ok(Box::new(query))
    }

    /// Parse: conjunction := AND | OR
    fn parse_conjunction(&mut self) -> Result<Option<DefaultOperator>> {
        let conjunction = match self.current_token {
            Token::And => DefaultOperator::And,
            Token::Or => DefaultOperator::Or,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(conjunction))
    }

    /// Parse: modifier := '+' | '-' | NOT
    fn parse_modifier(&mut self) -> Result<Modifier> {
        let modifier = match self.current_token {
            Token::Plus => Modifier::Required,
            Token::Minus | Token::Not => Modifier::Prohibited,
            _ => return Ok(Modifier::None),
        };
        self.advance()?;
        Ok(modifier)
    }

    fn add_clause(
        &self,
        clauses: &mut Vec<(Occur, Box<dyn QueryNode>)>,
        conjunction: Option<DefaultOperator>,
        modifier: Modifier,
        clause: Box<dyn QueryNode>,
    ) {
        // An explicit conjunction also rewrites the clause before it
        if let Some((previous, _)) = clauses.last_mut() {
            if *previous != Occur::MustNot {
                match (conjunction, self.default_operator) {
                    (Some(DefaultOperator::And), _) => *previous = Occur::Must,
                    (Some(DefaultOperator::Or), DefaultOperator::And) => *previous = Occur::Should,
                    _ => {}
                }
            }
        }

        let occur = match (modifier, self.default_operator) {
            (Modifier::Prohibited, _) => Occur::MustNot,
            (Modifier::Required, _) => Occur::Must,
            (Modifier::None, DefaultOperator::Or) => match conjunction {
                Some(DefaultOperator::And) => Occur::Must,
                _ => Occur::Should,
            },
            (Modifier::None, DefaultOperator::And) => match conjunction {
                Some(DefaultOperator::Or) => Occur::Should,
                _ => Occur::Must,
            },
        };
        clauses.push((occur, clause));
    }

    /// Parse: field_query | grouped | term_expr
    fn parse_clause(&mut self) -> Result<Box<dyn QueryNode>> {
        match self.current_token.clone() {
            Token::Term(text) => {
                let start = self.position;
                self.advance()?;

                // Check if this is a field query (term followed by colon)
                if self.current_token == Token::Colon {
                    self.advance()?;
                    return self.parse_field_value(&text);
                }
                let field = self.default_field.clone();
                self.parse_term(&field, &text, start)
            }
            Token::QuotedString(text) => {
                self.advance()?;
                let field = self.default_field.clone();
                self.parse_phrase(&field, &text)
            }
            Token::LeftParen => self.parse_group(),
            other => Err(self.error(format!("Unexpected {}", describe(&other)))),
        }
    }

    /// Parse the value after `field:`
    fn parse_field_value(&mut self, field: &str) -> Result<Box<dyn QueryNode>> {
        match self.current_token.clone() {
            Token::Term(text) => {
                let start = self.position;
                self.advance()?;
                self.parse_term(field, &text, start)
            }
            Token::QuotedString(text) => {
                self.advance()?;
                self.parse_phrase(field, &text)
            }
            Token::LeftParen => {
                // field:(a OR b) searches every unqualified term of the group in `field`
                let saved = std::mem::replace(&mut self.default_field, field.to_string());
                let result = self.parse_group();
                self.default_field = saved;
                result
            }
            other => Err(self.error(format!(
                "Expected a value after '{}:', found {}",
                field,
                describe(&other)
            ))),
        }
    }

    /// Parse: grouped := '(' query ')' boost?
    fn parse_group(&mut self) -> Result<Box<dyn QueryNode>> {
        let open = self.position;
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TalkdexError::query_parse(
                open,
                format!("Groups nested deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        self.advance()?; // consume '('

        if self.current_token == Token::RightParen {
            return Err(self.error("Empty group"));
        }

        self.depth += 1;
        let inner = self.parse_query();
        self.depth -= 1;
        let inner = inner?;
        if self.current_token != Token::RightParen {
            return Err(self.error(format!(
                "Expected ')' to close the group opened at {}, found {}",
                open,
                describe(&self.current_token)
            )));
        }
        self.advance()?;

        Ok(match self.parse_boost()? {
            Some(boost) => Box::new(BoolQuery::new().must_boxed(inner).with_boost(boost)),
            None => inner,
        })
    }

    /// Parse: TERM boost?
    fn parse_term(&mut self, field: &str, text: &str, start: usize) -> Result<Box<dyn QueryNode>> {
        if matches!(self.current_token, Token::Tilde(_)) {
            return Err(self.error("Fuzzy queries are not supported"));
        }
        let boost = self.parse_boost()?.unwrap_or(1.0);

        if text == "*" {
            return Ok(Box::new(MatchAllQuery::new().with_boost(boost)));
        }

        if let Some(prefix) = text.strip_suffix('*') {
            if prefix.contains('*') {
                return Err(TalkdexError::query_parse(
                    start,
                    "Only trailing wildcards are supported",
                ));
            }
            let prefix = self.analyzers.for_field(field).normalize_prefix(prefix);
            return Ok(Box::new(PrefixQuery::new(field, prefix).with_boost(boost)));
        }

        if text.contains('*') {
            return Err(TalkdexError::query_parse(
                start,
                "Only trailing wildcards are supported",
            ));
        }

        let tokens = self.analyze(field, text);
        Ok(terms_query(field, tokens, 0, boost))
    }

    /// Parse: QUOTED (TILDE slop)? boost?
    fn parse_phrase(&mut self, field: &str, text: &str) -> Result<Box<dyn QueryNode>> {
        let slop = match self.current_token {
            Token::Tilde(Some(slop)) => {
                self.advance()?;
                slop
            }
            Token::Tilde(None) => return Err(self.error("Expected a slop after '~'")),
            _ => 0,
        };
        let boost = self.parse_boost()?.unwrap_or(1.0);

        let tokens = self.analyze(field, text);
        Ok(terms_query(field, tokens, slop, boost))
    }

    fn parse_boost(&mut self) -> Result<Option<f32>> {
        match self.current_token {
            Token::Caret(Some(boost)) => {
                self.advance()?;
                Ok(Some(boost))
            }
            Token::Caret(None) => Err(self.error("Expected a number after '^'")),
            _ => Ok(None),
        }
    }

    fn analyze(&self, field: &str, text: &str) -> Vec<(Term, u32)> {
        self.analyzers
            .for_field(field)
            .tokens(text)
            .map(|token| (token.term, token.position))
            .collect()
    }

    fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> TalkdexError {
        TalkdexError::query_parse(self.position, message)
    }
}

/// Query for the analyzed tokens of one term or phrase
fn terms_query(
    field: &str,
    mut tokens: Vec<(Term, u32)>,
    slop: u32,
    boost: f32,
) -> Box<dyn QueryNode> {
    match tokens.len() {
        0 => Box::new(MatchNoneQuery),
        1 => {
            let (term, _) = tokens.remove(0);
            Box::new(TermQuery::new(field, term).with_boost(boost))
        }
        _ => Box::new(
            PhraseQuery::with_positions(field, tokens)
                .with_slop(slop)
                .with_boost(boost),
        ),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Term(text) => format!("term '{}'", text),
        Token::QuotedString(text) => format!("phrase \"{}\"", text),
        Token::And => "'AND'".to_string(),
        Token::Or => "'OR'".to_string(),
        Token::Not => "'NOT'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Tilde(_) => "'~'".to_string(),
        Token::Caret(_) => "'^'".to_string(),
        Token::LeftParen => "'('".to_string(),
        Token::RightParen => "')'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, AnalyzerKind};
    use crate::models::{DocId, Document, FieldOptions};
    use crate::query::context::QueryContext;
    use crate::query::testing::context_with_docs;

    fn analyzers() -> FieldAnalyzers {
        FieldAnalyzers::new(Analyzer::of(AnalyzerKind::Simple))
            .with_field("category", Analyzer::of(AnalyzerKind::Keyword))
    }

    fn talk(title: &str, speaker: &str, category: &str) -> Document {
        Document::new()
            .with("title", title, FieldOptions::STORED_INDEXED)
            .with("speaker", speaker, FieldOptions::STORED_INDEXED)
            .with("category", category, FieldOptions::STORED_INDEXED)
    }

    fn context() -> QueryContext {
        context_with_docs(
            &analyzers(),
            vec![
                talk("Apache Camel in Action", "Ada Lovelace", "Java"),
                talk("Apache Karaf", "Grace Hopper", "OSGi"),
                talk("Rust Camel", "Ada Lovelace", "Rust"),
                talk("Java Enterprise", "Linus", "Java"),
            ],
        )
    }

    fn parse(input: &str) -> Result<Box<dyn QueryNode>> {
        let analyzers = analyzers();
        QueryStringParser::new(input, &analyzers, "title")?.parse()
    }

    fn search(input: &str) -> Vec<u32> {
        let ctx = context();
        parse(input).unwrap().execute(&ctx).unwrap().iter().collect()
    }

    fn error_position(input: &str) -> usize {
        match parse(input) {
            Err(TalkdexError::QueryParse { position, .. }) => position,
            other => panic!("expected parse error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_single_term() {
        assert_eq!(search("apache"), vec![0, 1]);
        assert_eq!(search("APACHE"), vec![0, 1]);
        assert_eq!(parse("apache").unwrap().query_type(), "term");
    }

    #[test]
    fn test_default_or() {
        assert_eq!(search("apache camel"), vec![0, 1, 2]);
        assert_eq!(search("apache OR rust"), vec![0, 1, 2]);
        assert_eq!(search("apache || rust"), vec![0, 1, 2]);
    }

    #[test]
    fn test_and() {
        assert_eq!(search("apache AND camel"), vec![0]);
        assert_eq!(search("apache && camel"), vec![0]);
    }

    #[test]
    fn test_lowercase_and_is_a_term() {
        assert_eq!(search("apache and camel"), vec![0, 1, 2]);
    }

    #[test]
    fn test_required_and_prohibited() {
        assert_eq!(search("+apache camel"), vec![0, 1]);
        assert_eq!(search("camel -rust"), vec![0]);
        assert_eq!(search("camel NOT rust"), vec![0]);
        assert_eq!(search("camel AND NOT rust"), vec![0]);
        assert_eq!(search("camel !rust"), vec![0]);
    }

    #[test]
    fn test_pure_negation_matches_nothing() {
        assert!(search("-rust").is_empty());
        assert!(search("NOT rust").is_empty());
    }

    #[test]
    fn test_grouping() {
        assert_eq!(search("(apache OR rust) AND camel"), vec![0, 2]);
        assert_eq!(search("+(karaf enterprise) -java"), vec![1]);
    }

    #[test]
    fn test_nesting_depth_limit() {
        let nested = |depth: usize| format!("{}apache{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(search(&nested(MAX_NESTING_DEPTH)), vec![0, 1]);
        assert_eq!(error_position(&nested(MAX_NESTING_DEPTH + 1)), MAX_NESTING_DEPTH);
        assert_eq!(error_position(&nested(20_000)), MAX_NESTING_DEPTH);

        let field_group = format!("speaker:{}", nested(MAX_NESTING_DEPTH + 1));
        assert_eq!(error_position(&field_group), 8 + MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_field_queries() {
        assert_eq!(search("speaker:ada"), vec![0, 2]);
        assert_eq!(search("speaker:(grace OR linus)"), vec![1, 3]);
        assert_eq!(search("speaker:(grace linus) AND title:karaf"), vec![1]);
        assert_eq!(search("speaker:\"ada lovelace\""), vec![0, 2]);
    }

    #[test]
    fn test_field_group_restores_default_field() {
        assert_eq!(search("speaker:(grace) karaf"), vec![1]);
        assert_eq!(search("speaker:(ada) enterprise"), vec![0, 2, 3]);
    }

    #[test]
    fn test_keyword_field_is_exact() {
        assert_eq!(search("category:Java"), vec![0, 3]);
        assert!(search("category:java").is_empty());
    }

    #[test]
    fn test_phrase() {
        assert_eq!(search("\"apache camel\""), vec![0]);
        assert!(search("\"camel apache\"").is_empty());
        assert_eq!(search("\"camel apache\"~2"), vec![0]);
        assert_eq!(parse("\"apache\"").unwrap().query_type(), "term");
    }

    #[test]
    fn test_multi_token_term_becomes_phrase() {
        let query = parse("apache-camel").unwrap();
        assert_eq!(query.query_type(), "phrase");
        assert_eq!(search("apache-camel"), vec![0]);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(search("apa*"), vec![0, 1]);
        assert_eq!(search("APA*"), vec![0, 1]);
        assert_eq!(search("category:Ja*"), vec![0, 3]);
        assert_eq!(parse("apa*").unwrap().query_type(), "prefix");
    }

    #[test]
    fn test_match_all() {
        assert_eq!(search("*"), vec![0, 1, 2, 3]);
        assert_eq!(search("*:*"), vec![0, 1, 2, 3]);
        assert_eq!(search("*:* -java"), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        assert_eq!(parse("").unwrap().query_type(), "match_none");
        assert_eq!(parse("   ").unwrap().query_type(), "match_none");
        assert!(search("").is_empty());
    }

    #[test]
    fn test_stopword_term_matches_nothing() {
        let analyzers = FieldAnalyzers::new(Analyzer::of(AnalyzerKind::German));
        let query = QueryStringParser::new("die", &analyzers, "title")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(query.query_type(), "match_none");
    }

    #[test]
    fn test_boost() {
        let ctx = context();
        let query = parse("apache^3").unwrap();
        assert_eq!(query.score(&ctx, DocId(1)), Some(3.0));

        let query = parse("(apache karaf)^2").unwrap();
        assert_eq!(query.score(&ctx, DocId(1)), Some(4.0));
        assert_eq!(query.score(&ctx, DocId(0)), Some(2.0));
    }

    #[test]
    fn test_default_operator_and() {
        let analyzers = analyzers();
        let ctx = context();
        let run = |input: &str| -> Vec<u32> {
            QueryStringParser::new(input, &analyzers, "title")
                .unwrap()
                .with_default_operator(DefaultOperator::And)
                .parse()
                .unwrap()
                .execute(&ctx)
                .unwrap()
                .iter()
                .collect()
        };
        assert_eq!(run("apache camel"), vec![0]);
        assert_eq!(run("apache OR rust"), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_errors_carry_position() {
        assert_eq!(error_position("apache AND"), 10);
        assert_eq!(error_position("AND apache"), 0);
        assert_eq!(error_position("(apache"), 7);
        assert_eq!(error_position("apache)"), 6);
        assert_eq!(error_position("title:"), 6);
        assert_eq!(error_position("ap*che"), 0);
        assert_eq!(error_position("x ap*che"), 2);
        assert_eq!(error_position("apache~"), 6);
        assert_eq!(error_position("apache^"), 6);
        assert_eq!(error_position("\"a b\"~"), 5);
        assert_eq!(error_position("title:[a TO b]"), 6);
        assert_eq!(error_position("()"), 1);
    }
}
