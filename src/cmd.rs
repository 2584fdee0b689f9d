/// Commands understood by the REPL.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Parse,
    Trace,
    Quit,
}

pub struct CommandClassifier<'a> {
    pub short_name: &'a str,
    pub long_name: &'a str,
    pub cmd: Command,
    pub arg_expected: bool,
    description: &'a str,
}

pub const COMMAND_CLASSIFIER: &[CommandClassifier] = &[
    CommandClassifier {
        short_name: "h",
        long_name: "help",
        cmd: Command::Help,
        arg_expected: false,
        description: "print this message.",
    },
    CommandClassifier {
        short_name: "p",
        long_name: "parse",
        cmd: Command::Parse,
        arg_expected: true,
        description: "print how an expression parses, without evaluating it.",
    },
    CommandClassifier {
        short_name: "t",
        long_name: "trace",
        cmd: Command::Trace,
        arg_expected: false,
        description: "toggle trace mode, in which every contraction is printed.",
    },
    CommandClassifier {
        short_name: "q",
        long_name: "quit",
        cmd: Command::Quit,
        arg_expected: false,
        description: "leave the prompt.",
    },
];

pub fn print_usage() {
    println!(
"A lambda calculus evaluator.
Parentheses must be separated by whitespace; a line ending in '\\' continues
on the next one.

Available commands:"
    );
    for command in COMMAND_CLASSIFIER {
        let arg = if command.arg_expected { " <expr>" } else { "" };
        println!(":{}, :{}{}\t{}",
                 command.short_name,
                 command.long_name,
                 arg,
                 command.description);
    }
}

pub fn get_command(name: &str) -> Option<&'static CommandClassifier<'static>> {
    COMMAND_CLASSIFIER
        .iter()
        .find(|class| name == class.short_name || name == class.long_name)
}

// get the commands whose long name starts with prefix.
pub fn get_commands_starting_with(prefix: &str) -> impl Iterator<Item = &'static CommandClassifier<'static>> + '_ {
    COMMAND_CLASSIFIER
        .iter()
        .filter(move |class| class.long_name.starts_with(prefix))
}
