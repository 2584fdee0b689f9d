use std::path::PathBuf;

use crate::eval::{Evaluator, DEFAULT_MAX_STEPS};
use crate::parser::DEFAULT_MAX_DEPTH;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/dev-test/sock";

/// Server settings. The binary fills this in from the command line and
/// environment; tests build it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub socket_path: PathBuf,
    /// Contractions allowed per request, `None` for no limit.
    pub max_steps: Option<usize>,
    /// Nesting allowed in a request's expression, `None` for no limit.
    pub max_depth: Option<usize>,
    pub reduce_head_spine: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            max_steps: Some(DEFAULT_MAX_STEPS),
            max_depth: Some(DEFAULT_MAX_DEPTH),
            reduce_head_spine: true,
        }
    }
}

impl Config {
    pub fn with_socket_path(mut self, socket_path: impl Into<PathBuf>) -> Config {
        self.socket_path = socket_path.into();
        self
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new()
            .with_max_steps(self.max_steps)
            .with_max_depth(self.max_depth)
            .with_head_spine_reduction(self.reduce_head_spine)
    }
}
