use thiserror::Error;

use crate::ast::Term;
use crate::error::CoreError;
use crate::parser::{ParseError, Parser, DEFAULT_MAX_DEPTH};
use crate::subst::substitute;

/// Contractions allowed per evaluation unless configured otherwise.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("cannot reduce an application whose head is an application: {term}")]
    UnreducibleHead { term: String },
    #[error("reduction did not finish within {limit} steps")]
    StepLimitExceeded { limit: usize },
}

/// Head-reduction engine.
///
/// Only the leftmost-outermost redex chain is contracted: arguments are
/// passed unevaluated and abstraction bodies are never entered.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    max_steps: Option<usize>,
    max_depth: Option<usize>,
    reduce_head_spine: bool,
}

impl Default for Evaluator {
    fn default() -> Evaluator {
        Evaluator {
            max_steps: Some(DEFAULT_MAX_STEPS),
            max_depth: Some(DEFAULT_MAX_DEPTH),
            reduce_head_spine: true,
        }
    }
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator::default()
    }

    /// `None` lets a diverging term run forever.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Evaluator {
        self.max_steps = max_steps;
        self
    }

    /// Nesting limit for parsed expressions, see `Parser::with_max_depth`.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Evaluator {
        self.max_depth = max_depth;
        self
    }

    /// When disabled, an application headed by another application is
    /// reported as `EvalError::UnreducibleHead` instead of having its head
    /// reduced first.
    pub fn with_head_spine_reduction(mut self, enabled: bool) -> Evaluator {
        self.reduce_head_spine = enabled;
        self
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn reduces_head_spine(&self) -> bool {
        self.reduce_head_spine
    }

    /// Parses, evaluates and prints `text`.
    ///
    /// ```
    /// # use lambda_calc_rpc::eval::Evaluator;
    /// let evaluator = Evaluator::new();
    /// assert_eq!(evaluator.evaluate_expression("( x y )").unwrap(), "(x y)");
    /// assert_eq!(evaluator.evaluate_expression("( ( x ) )").unwrap(), "x");
    /// ```
    ///
    pub fn evaluate_expression(&self, text: &str) -> Result<String, CoreError> {
        let term = self.parse(text)?;
        let result = self.evaluate(term)?;
        Ok(result.to_string())
    }

    pub fn parse(&self, text: &str) -> Result<Term, ParseError> {
        Parser::new().with_max_depth(self.max_depth).parse(text)
    }

    pub fn evaluate(&self, term: Term) -> Result<Term, EvalError> {
        self.evaluate_traced(term, |_| {})
    }

    /// Like evaluate(), but calls `on_step` with the term produced by each
    /// contraction.
    pub fn evaluate_traced<F>(&self, term: Term, mut on_step: F) -> Result<Term, EvalError>
    where
        F: FnMut(&Term),
    {
        let mut steps = 0;
        self.reduce(term, &mut steps, &mut on_step)
    }

    fn reduce(
        &self,
        mut term: Term,
        steps: &mut usize,
        on_step: &mut dyn FnMut(&Term),
    ) -> Result<Term, EvalError> {
        loop {
            let (left, right) = match term {
                Term::App(left, right) => (left, right),
                // variables and abstractions are already in head normal form
                done => return Ok(done),
            };

            let head = if left.is_app() {
                if !self.reduce_head_spine {
                    return Err(EvalError::UnreducibleHead {
                        term: Term::App(left, right).to_string(),
                    });
                }
                self.reduce(*left, steps, on_step)?
            } else {
                *left
            };

            term = match head {
                Term::Abs { param, body } => {
                    self.count_step(steps)?;
                    let contracted = substitute(&body, &param, &right);
                    on_step(&contracted);
                    contracted
                }
                // stuck: the head is a free variable or a stuck application
                head => return Ok(Term::App(Box::new(head), right)),
            };
        }
    }

    fn count_step(&self, steps: &mut usize) -> Result<(), EvalError> {
        if let Some(limit) = self.max_steps {
            if *steps >= limit {
                return Err(EvalError::StepLimitExceeded { limit });
            }
        }
        *steps += 1;
        Ok(())
    }
}
