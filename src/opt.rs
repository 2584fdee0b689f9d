use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lambda_calc_rpc::config::{Config, DEFAULT_SOCKET_PATH};
use lambda_calc_rpc::eval::{Evaluator, DEFAULT_MAX_STEPS};
use lambda_calc_rpc::parser::DEFAULT_MAX_DEPTH;

#[derive(Parser, Debug)]
#[command(name = "lambda_calc_rpc")]
#[command(about = "Untyped lambda calculus evaluator served over a Unix domain socket")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do; serves requests when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve evaluate requests on a Unix domain socket
    Serve(ServeArgs),
    /// Evaluate an expression locally and print the result
    Eval {
        /// Expression to evaluate, e.g. "( f x )"
        expression: String,
        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Evaluate an expression through a running server
    Send {
        /// Expression to evaluate
        expression: String,
        /// Path of the server socket
        #[arg(short, long, env = "LAMBDA_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
        socket: PathBuf,
    },
    /// Interactive prompt evaluating expressions locally
    Repl {
        #[command(flatten)]
        eval: EvalArgs,
    },
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Path of the socket file to create
    #[arg(short, long, env = "LAMBDA_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,

    #[command(flatten)]
    pub eval: EvalArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct EvalArgs {
    /// Maximum number of contractions per evaluation, 0 for no limit
    #[arg(long, env = "LAMBDA_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Maximum nesting depth of an expression, 0 for no limit
    #[arg(long, env = "LAMBDA_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Reject applications headed by an application instead of reducing the head first
    #[arg(long)]
    pub strict_head: bool,
}

impl ServeArgs {
    /// Settings used when no subcommand is given: flags are absent, but the
    /// environment still applies.
    pub fn from_env() -> ServeArgs {
        ServeArgs::parse_from(["serve"])
    }

    pub fn config(&self) -> Config {
        self.eval.apply(Config::default().with_socket_path(self.socket.clone()))
    }
}

impl EvalArgs {
    pub fn apply(&self, config: Config) -> Config {
        Config {
            max_steps: if self.max_steps == 0 { None } else { Some(self.max_steps) },
            max_depth: if self.max_depth == 0 { None } else { Some(self.max_depth) },
            reduce_head_spine: !self.strict_head,
            ..config
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        self.apply(Config::default()).evaluator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags() {
        let cli = Cli::parse_from([
            "lambda_calc_rpc", "serve", "--socket", "/tmp/x.sock", "--max-steps", "0", "--max-depth", "64",
            "--strict-head",
        ]);
        let config = match cli.command {
            Some(Commands::Serve(args)) => args.config(),
            other => panic!("unexpected command {:?}", other),
        };
        assert_eq!(PathBuf::from("/tmp/x.sock"), config.socket_path);
        assert_eq!(None, config.max_steps);
        assert_eq!(Some(64), config.max_depth);
        assert!(!config.reduce_head_spine);
    }

    #[test]
    fn eval_defaults() {
        let cli = Cli::parse_from(["lambda_calc_rpc", "-v", "eval", "( x y )"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Eval { expression, eval }) => {
                assert_eq!("( x y )", expression);
                assert!(!eval.strict_head);
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn no_subcommand() {
        let cli = Cli::parse_from(["lambda_calc_rpc"]);
        assert!(cli.command.is_none());
    }
}
