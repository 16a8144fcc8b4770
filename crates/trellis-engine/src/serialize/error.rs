use std::fmt;

/// A parse error from a scene file.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParseError {
    pub message: String,
    /// 1-based line number where the error occurred.
    pub line: usize,
}

impl SceneParseError {
    pub(crate) fn new(msg: impl Into<String>, line: usize) -> Self {
        Self { message: msg.into(), line }
    }
}

impl fmt::Display for SceneParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene parse error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SceneParseError {}
