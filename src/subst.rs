use crate::ast::{Term, Var};

/// Replaces every free occurrence of `var` in `expr` by `value`.
///
/// An abstraction binding the same name shadows `var`, so its body is left
/// alone. No renaming is ever done: free variables of `value` can end up
/// captured by other binders inside `expr`.
///
/// ```
/// # use lambda_calc_rpc::ast::{Term, Var};
/// # use lambda_calc_rpc::subst::substitute;
/// let body = Term::abs("y", Term::app(Term::var("x"), Term::var("y")));
/// let result = substitute(&body, &Var::new("x"), &Term::var("y"));
/// // the substituted `y` is captured by the binder
/// assert_eq!(result.to_string(), "(!y.(y y))");
/// ```
///
pub fn substitute(expr: &Term, var: &Var, value: &Term) -> Term {
    match expr {
        Term::Var(name) => {
            if name == var {
                value.clone()
            } else {
                expr.clone()
            }
        }
        Term::Abs { param, body } => {
            if param.name == var.name {
                expr.clone()
            } else {
                Term::Abs {
                    param: param.clone(),
                    body: Box::new(substitute(body, var, value)),
                }
            }
        }
        Term::App(left, right) => Term::App(
            Box::new(substitute(left, var, value)),
            Box::new(substitute(right, var, value)),
        ),
    }
}
