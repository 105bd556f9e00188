pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the whole document. Problems local to one element are reported through the
/// [`Notifier`](crate::notify::Notifier) instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Not supported: Page size in '{unit}'.")]
    UnsupportedRootUnit { unit: String },
}
