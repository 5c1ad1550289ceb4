use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("edge endpoint `{0}` is not part of the layout request")]
    UnknownNode(String),
    #[error("node `{0}` has a non-finite size")]
    InvalidSize(String),
    #[error("layout backend failed: {0}")]
    Backend(String),
}
