//! Runtime error types

use thiserror::Error;

/// Errors surfaced by [`LinkHandle`](crate::LinkHandle)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Link task has stopped; command channel closed")]
    ChannelClosed,

    #[error("Link task dropped the reply for {request}")]
    ReplyDropped { request: &'static str },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
