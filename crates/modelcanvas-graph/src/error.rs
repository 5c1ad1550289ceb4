use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("duplicate entity id: {0}")]
    DuplicateEntity(String),

    #[error("unsupported model version {found} (newest supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("relationship {from} -> {to} references unknown entity {missing}")]
    DanglingRelationship {
        from: String,
        to: String,
        missing: String,
    },
}
