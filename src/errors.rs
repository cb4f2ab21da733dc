/// Errors surfaced by the mutation and strict-parameter-access surface.
///
/// Parsing itself never fails (see the crate-level docs): malformed markup
/// is absorbed by the tokenizer and tree builder. These variants only cover
/// the handful of invalid-argument / key-not-found cases a caller can
/// trigger after the tree exists.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum DomError {
    #[error("remove_item() cannot match a content item of this type")]
    UnsupportedRemoveItem,

    #[error("replace_with() requires a Tag when keep_content is false")]
    ReplaceWithTypeMismatch,

    #[error("slice assignment index is out of range")]
    SliceIndexOutOfRange,

    #[error("parameter {0:?} not found (strict mode)")]
    KeyNotFound(String),
}
