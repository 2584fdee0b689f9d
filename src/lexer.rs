use std::str::SplitWhitespace;

/// Tokens understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    OpenParen,
    CloseParen,
    Id(&'a str),
}

impl<'a> Token<'a> {
    fn classify(word: &'a str) -> Token<'a> {
        match word {
            "(" => Token::OpenParen,
            ")" => Token::CloseParen,
            _ => Token::Id(word),
        }
    }
}

/// An iterator over the tokens of a string. Used by Parser.
///
/// Tokens are separated by runs of whitespace only, so parentheses must
/// stand on their own:
///
/// ```
/// # use lambda_calc_rpc::lexer::{Token, TokenIter};
/// let tokens: Vec<_> = TokenIter::new("( f\tx )").collect();
/// assert_eq!(tokens, vec![
///     Token::OpenParen, Token::Id("f"), Token::Id("x"), Token::CloseParen,
/// ]);
/// ```
///
/// Anything that is not a lone parenthesis is an identifier, even if it
/// contains one:
///
/// ```
/// # use lambda_calc_rpc::lexer::{Token, TokenIter};
/// let mut iter = TokenIter::new("(x)");
/// assert_eq!(iter.next(), Some(Token::Id("(x)")));
/// assert_eq!(iter.next(), None);
/// ```
///
#[derive(Clone)]
pub struct TokenIter<'a> {
    words: SplitWhitespace<'a>,
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.words.next().map(Token::classify)
    }
}

impl<'a> TokenIter<'a> {
    pub fn new(s: &'a str) -> TokenIter<'a> {
        TokenIter {
            words: s.split_whitespace(),
        }
    }
}
