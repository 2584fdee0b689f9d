use std::fmt;
use std::fmt::{Display, Formatter};

/// A variable, identified by its name only.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Var {
    pub name: String,
}

impl Var {
    pub fn new(name: impl Into<String>) -> Var {
        Var { name: name.into() }
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An expression tree.
///
/// Terms are never mutated after construction: substitution and reduction
/// always build a new tree, and each node owns its children exclusively.
///
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Term {
    Var(Var),
    Abs { param: Var, body: Box<Term> },
    App(Box<Term>, Box<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Term {
        Term::Var(Var::new(name))
    }

    pub fn abs(param: impl Into<String>, body: Term) -> Term {
        Term::Abs {
            param: Var::new(param),
            body: Box::new(body),
        }
    }

    pub fn app(left: Term, right: Term) -> Term {
        Term::App(Box::new(left), Box::new(right))
    }

    pub fn is_app(&self) -> bool {
        matches!(self, Term::App(_, _))
    }
}

/// Prints the term fully parenthesised:
///
/// ```
/// # use lambda_calc_rpc::ast::Term;
/// let term = Term::app(Term::abs("x", Term::var("x")), Term::var("y"));
/// assert_eq!(term.to_string(), "((!x.x) y)");
/// ```
///
impl Display for Term {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Term::Var(var) => write!(f, "{}", var),
            Term::Abs { param, body } => write!(f, "(!{}.{})", param, body),
            Term::App(left, right) => write!(f, "({} {})", left, right),
        }
    }
}
