use std::collections::VecDeque;
use thiserror::Error;

use crate::ast::Term;
use crate::lexer::{Token, TokenIter};
use crate::subst::substitute;

/// Deepest nesting accepted unless configured otherwise. Terms are walked
/// recursively when they are reduced, printed and dropped, so an unbounded
/// depth would let one input exhaust the thread's stack.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Why an expression could not be parsed. Positions are token indices,
/// starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unmatched ')' at token {position}")]
    UnmatchedClose { position: usize },
    #[error("empty parentheses closed at token {position}")]
    EmptyGroup { position: usize },
    #[error("{count} unclosed parentheses")]
    Unclosed { count: usize },
    #[error("expected a single expression, found {count}")]
    TrailingTerms { count: usize },
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Parses `line` into a single term.
///
/// Note that groups of two or more terms keep only their last element as the
/// argument:
///
/// ```
/// # use lambda_calc_rpc::parser::parse;
/// assert_eq!(parse("( x y )").unwrap().to_string(), "(x y)");
/// assert_eq!(parse("f ( a b c )").unwrap().to_string(), "(f c)");
/// assert!(parse("( x").is_err());
/// ```
///
pub fn parse(line: &str) -> Result<Term, ParseError> {
    Parser::new().parse(line)
}

// Terms carry the depth of their tree so the limit is checked without
// walking it.
#[derive(Debug)]
enum Entry {
    OpenParen,
    Term(Term, usize),
}

/// Our hand-written shift/reduce parser.
/// Each instance owns its own stack, so one is used per expression.
///
#[derive(Debug)]
pub struct Parser {
    stack: Vec<Entry>,
    open: usize,
    max_depth: Option<usize>,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser {
            stack: Vec::new(),
            open: 0,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Bounds both the parenthesis nesting and the depth of the built term.
    /// `None` removes the bound.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Parser {
        self.max_depth = max_depth;
        self
    }

    pub fn parse(mut self, line: &str) -> Result<Term, ParseError> {
        for (position, token) in TokenIter::new(line).enumerate() {
            self.feed(token, position)?;
        }
        self.finish()
    }

    fn feed(&mut self, token: Token, position: usize) -> Result<(), ParseError> {
        match token {
            Token::OpenParen => {
                self.check_depth(self.open + 1)?;
                self.open += 1;
                self.stack.push(Entry::OpenParen);
            }
            Token::Id(name) => self.stack.push(Entry::Term(Term::var(name), 0)),
            Token::CloseParen => self.close_group(position)?,
        }
        Ok(())
    }

    fn close_group(&mut self, position: usize) -> Result<(), ParseError> {
        // popping reverses the order, so push to the front
        let mut args = VecDeque::new();
        loop {
            match self.stack.pop() {
                None => return Err(ParseError::UnmatchedClose { position }),
                Some(Entry::OpenParen) => break,
                Some(Entry::Term(term, depth)) => args.push_front((term, depth)),
            }
        }
        self.open -= 1;

        if args.len() == 1 {
            self.stack
                .extend(args.into_iter().map(|(term, depth)| Entry::Term(term, depth)));
            return Ok(());
        }

        let (arg, arg_depth) = args.pop_back().ok_or(ParseError::EmptyGroup { position })?;
        let (func, func_depth) = match self.stack.pop() {
            Some(Entry::Term(term, depth)) => (term, depth),
            other => {
                // nothing precedes the group: it supplies its own head
                self.stack.extend(other);
                args.pop_front().ok_or(ParseError::EmptyGroup { position })?
            }
        };
        let depth = if matches!(func, Term::Abs { .. }) {
            // the argument may land at the bottom of the body
            func_depth + arg_depth
        } else {
            func_depth.max(arg_depth) + 1
        };
        self.check_depth(depth)?;
        self.stack.push(Entry::Term(apply_group(func, arg), depth));
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        match self.max_depth {
            Some(limit) if depth > limit => Err(ParseError::TooDeep { limit }),
            _ => Ok(()),
        }
    }

    fn finish(mut self) -> Result<Term, ParseError> {
        if self.open > 0 {
            return Err(ParseError::Unclosed { count: self.open });
        }
        if self.stack.len() > 1 {
            return Err(ParseError::TrailingTerms {
                count: self.stack.len(),
            });
        }
        match self.stack.pop() {
            Some(Entry::Term(term, _)) => Ok(term),
            Some(Entry::OpenParen) => Err(ParseError::Unclosed { count: 1 }),
            None => Err(ParseError::Empty),
        }
    }
}

// Everything but the last argument of the group has already been dropped.
fn apply_group(func: Term, arg: Term) -> Term {
    match func {
        Term::Abs { param, body } => {
            let body = substitute(&body, &param, &arg);
            Term::Abs {
                param,
                body: Box::new(body),
            }
        }
        func => Term::app(func, arg),
    }
}
