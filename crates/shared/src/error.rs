use thiserror::Error;

/// An item whose fields do not match the shape its app schema promises.
/// Raised by the typed accessors during rendering and status computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedItem {
    #[error("item {item_id} has no '{external_id}' field")]
    MissingField { item_id: i64, external_id: String },
    #[error("item {item_id} field '{external_id}' has no values")]
    EmptyField { item_id: i64, external_id: String },
    #[error(
        "item {item_id} field '{external_id}' holds a {actual} value where {expected} was expected"
    )]
    WrongShape {
        item_id: i64,
        external_id: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("item {item_id} field '{external_id}' has no category options configured")]
    MissingOptions { item_id: i64, external_id: String },
    #[error("item {item_id} field '{external_id}' has no option labeled '{label}'")]
    UnknownOption {
        item_id: i64,
        external_id: String,
        label: String,
    },
}
