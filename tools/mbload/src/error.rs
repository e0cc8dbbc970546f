use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("timed out waiting for {0:?}")]
    Timeout(String),

    #[error("board stopped responding")]
    Disconnected,

    #[error("could not enter raw REPL, board said {0:?}")]
    NoRawRepl(String),

    #[error("could not exec command, expected OK, board said {0:?}")]
    NotOk(String),

    #[error("board reported an error:\n{0}")]
    Remote(String),
}
