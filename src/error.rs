use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{collection} already contains id {id}")]
    DuplicateId {
        collection: &'static str,
        id: String,
    },
}
