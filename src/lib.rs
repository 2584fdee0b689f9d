//! An untyped lambda calculus evaluator served over a Unix domain socket.
//!
//! Expressions are made of identifiers and whitespace-separated parentheses.
//! They are parsed into a [`Term`](ast::Term), head-reduced, and printed back:
//!
//! ```
//! assert_eq!(lambda_calc_rpc::evaluate_expression("( x y )").unwrap(), "(x y)");
//! ```

pub mod ast;
pub mod client;
pub mod config;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod rpc;
pub mod server;
pub mod subst;

pub use ast::{Term, Var};
pub use client::Client;
pub use config::Config;
pub use error::CoreError;
pub use eval::Evaluator;
pub use parser::{parse, ParseError};
pub use server::{Server, ShutdownHandle};

/// Parses, evaluates and prints `text` with the default evaluator settings.
pub fn evaluate_expression(text: &str) -> Result<String, CoreError> {
    Evaluator::default().evaluate_expression(text)
}
