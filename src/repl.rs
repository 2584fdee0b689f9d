use std::{
    borrow::Cow,
    env,
};
use log::{debug, warn};
use rustyline::{
    CompletionType,
    Context,
    Editor,
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::{Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
};
use rustyline_derive::Helper;

use lambda_calc_rpc::lexer::{Token, TokenIter};
use lambda_calc_rpc::Evaluator;

use crate::cmd::{self, Command};

#[derive(Helper)]
struct RustylineHelper {
    highlighter: MatchingBracketHighlighter,
}

impl Hinter for RustylineHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _context: &Context<'_>) -> Option<String> {
        None
    }
}

// Enter on a line with open groups continues it instead of submitting.
impl Validator for RustylineHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let result = match open_groups(ctx.input()) {
            Ok(0) => ValidationResult::Valid(None),
            Ok(_) => ValidationResult::Incomplete,
            Err(position) => ValidationResult::Invalid(Some(format!(
                "  unmatched ')' at token {}",
                position
            ))),
        };
        Ok(result)
    }
}

/// Counts the groups still open at the end of `input`, or returns the token
/// index of the first `)` closing nothing. Glued parentheses are part of an
/// identifier and do not count.
fn open_groups(input: &str) -> Result<usize, usize> {
    let mut open = 0usize;
    for (position, token) in TokenIter::new(input).enumerate() {
        match token {
            Token::OpenParen => open += 1,
            Token::CloseParen => open = open.checked_sub(1).ok_or(position)?,
            Token::Id(_) => {}
        }
    }
    Ok(open)
}

impl Completer for RustylineHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, cursor_pos: usize, _context: &Context<'_>)
        -> rustyline::Result<(usize, Vec<Self::Candidate>)>
    {
        let null_completion = (0, Vec::with_capacity(0));
        // only command names are completed.
        if cursor_pos == 0 || !line.starts_with(':') || line[..cursor_pos].contains(' ') {
            return Ok(null_completion);
        }
        let completion = cmd::get_commands_starting_with(&line[1..cursor_pos])
            .map(|class| Pair {
                display: class.long_name.to_string(),
                replacement: class.long_name.to_string(),
            })
            .collect();
        Ok((1, completion))
    }
}

impl Highlighter for RustylineHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool
    ) -> Cow<'b, str> {
        self.highlighter.highlight_prompt(prompt, default)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        self.highlighter.highlight_hint(hint)
    }

    fn highlight_candidate<'c>(
        &self,
        candidate: &'c str,
        completion: CompletionType
    ) -> Cow<'c, str> {
        self.highlighter.highlight_candidate(candidate, completion)
    }

    fn highlight_char(&self, line: &str, pos: usize) -> bool {
        self.highlighter.highlight_char(line, pos)
    }
}

fn make_rustyline_editor(histfile: &str) -> Editor<RustylineHelper> {
    let mut rl = Editor::<RustylineHelper>::new();

    let rustyline_helper = RustylineHelper {
        highlighter: MatchingBracketHighlighter::new(),
    };
    rl.set_helper(Some(rustyline_helper));

    if let Err(e) = rl.load_history(histfile) {
        debug!("no history loaded from {}: {}", histfile, e);
    }
    rl
}

fn get_histfile_path() -> String {
    let home_key = "HOME";
    let fallback = "/tmp";
    let filename = "lambda_rpc_hist";
    match env::var(home_key) {
        Ok(home) => format!("{}/.cache/{}", home, filename),
        Err(e) => {
            warn!("failed to read env variable {} ({}), using fallback {}.",
                  home_key, e, fallback);
            format!("{}/{}", fallback, filename)
        },
    }
}

/// Removes whitespace and the line continuation token (if any) from the end
/// of a line, returning whether there was a line continuation token.
///
fn strip_whitespace_and_line_cont(line: &mut String) -> bool {
    let trimmed_len = line.trim_end().len();
    line.truncate(trimmed_len);
    if line.ends_with('\\') {
        line.pop();
        true
    } else {
        false
    }
}

struct Session {
    evaluator: Evaluator,
    trace: bool,
}

impl Session {
    // returns false when the user asked to leave.
    fn exec(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        let rest = match line.strip_prefix(':') {
            None => {
                self.evaluate(line);
                return true;
            },
            Some(rest) => rest,
        };

        let (name, arg) = match rest.find(char::is_whitespace) {
            Some(pos) => (&rest[..pos], rest[pos..].trim()),
            None => (rest, ""),
        };
        let class = match cmd::get_command(name) {
            Some(class) => class,
            None => {
                eprintln!("unknown command ':{}', try :help", name);
                return true;
            },
        };
        if class.arg_expected && arg.is_empty() {
            eprintln!("command ':{}' expects an argument", class.long_name);
            return true;
        }
        match class.cmd {
            Command::Help => cmd::print_usage(),
            Command::Parse => match self.evaluator.parse(arg) {
                Ok(term) => println!("{}", term),
                Err(e) => eprintln!("syntax error: {}", e),
            },
            Command::Trace => {
                self.trace = !self.trace;
                println!("trace mode {}", if self.trace { "on" } else { "off" });
            },
            Command::Quit => return false,
        }
        true
    }

    fn evaluate(&self, line: &str) {
        let term = match self.evaluator.parse(line) {
            Ok(term) => term,
            Err(e) => {
                eprintln!("syntax error: {}", e);
                return;
            },
        };
        let result = if self.trace {
            self.evaluator.evaluate_traced(term, |step| println!("= {}", step))
        } else {
            self.evaluator.evaluate(term)
        };
        match result {
            Ok(term) => println!("{}", term),
            Err(e) => eprintln!("error: {}", e),
        }
    }
}

pub fn read_eval_print_loop(evaluator: Evaluator) {
    let mut session = Session {
        evaluator,
        trace: false,
    };

    let histfile = get_histfile_path();
    let mut rl = make_rustyline_editor(&histfile);

    loop {
        match rl.readline("> ") {
            Ok(mut line) => {
                while strip_whitespace_and_line_cont(&mut line) {
                    match rl.readline("& ") {
                        Ok(new_line) => {
                            line.push(' ');
                            line.push_str(&new_line);
                        },
                        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                        Err(err) => {
                            eprintln!("error: {:?}", err);
                            break;
                        },
                    };
                }
                rl.add_history_entry(line.as_str());
                if !session.exec(&line) {
                    break;
                }
            },
            Err(ReadlineError::Interrupted) => {
                break;
            },
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("error: {:?}", err);
                break;
            },
        };
    }
    if let Err(e) = rl.save_history(&histfile) {
        warn!("failed to save history file: {}", e);
    };
}
