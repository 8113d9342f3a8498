//! Graphics error types.
//!
//! Errors here are runtime conditions surfaced from execution and resource
//! creation. Compilation errors have their own type,
//! [`CompileError`](crate::compiler::CompileError), because they are reported
//! before any GPU-visible state changes.

use std::fmt;

use crate::compiler::CompileError;

/// Errors that can occur in the graphics system at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    InitializationFailed(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// Out of GPU memory at the driver level.
    OutOfMemory,
    /// The GPU device was lost. The frame is lost; the application is
    /// expected to tear down and recover.
    DeviceLost,
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// An internal error occurred.
    Internal(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Failure of a full-frame round trip ([`crate::GraphicsDevice::execute_graph`]).
///
/// Compilation errors are recoverable: nothing was submitted and the graph
/// returns to building. Execution errors mean the frame is lost; already
/// submitted work is not rolled back.
#[derive(Debug)]
pub enum FrameError {
    /// The graph could not be compiled; the frame was never submitted.
    Compile(CompileError),
    /// The backend rejected a submission.
    Execution(GraphicsError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(err) => write!(f, "graph compilation failed: {err}"),
            Self::Execution(err) => write!(f, "frame submission failed: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compile(err) => Some(err),
            Self::Execution(err) => Some(err),
        }
    }
}

impl From<CompileError> for FrameError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

impl From<GraphicsError> for FrameError {
    fn from(err: GraphicsError) -> Self {
        Self::Execution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::DeviceLost;
        assert_eq!(err.to_string(), "GPU device lost");

        let err = GraphicsError::InvalidParameter("bad size".to_string());
        assert_eq!(err.to_string(), "invalid parameter: bad size");
    }

    #[test]
    fn test_frame_error_carries_source() {
        use std::error::Error;

        let err = FrameError::from(GraphicsError::DeviceLost);
        assert!(err.to_string().contains("GPU device lost"));
        assert!(err.source().is_some());
    }
}
