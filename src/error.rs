use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

use crate::codec::ParseError;

#[derive(Error, Debug)]
pub(crate) enum CountError {
    #[error("cannot open {}: {source}", path.display())]
    SourceOpen { path: PathBuf, source: io::Error },
    #[error("read failed: {0}")]
    SourceRead(#[from] io::Error),
    #[error("record of at least {len} bytes exceeds the {max} byte limit")]
    CapacityExceeded { len: usize, max: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("pipeline task failed: {0}")]
    Task(#[from] JoinError),
}
