use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The named bucket does not exist.
  #[error("bucket {0:?} not found")]
  BucketNotFound(String),
  /// A value could not be encoded to or decoded from JSON.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  /// A stored value was read as a string but is not valid UTF-8.
  #[error("value is not utf-8: {0}")]
  Utf8(#[from] FromUtf8Error),
  /// Any fault surfaced by the Bolt engine.
  #[error("engine error: {0}")]
  Engine(#[from] bbolt_rs::Error),
  /// Filesystem errors raised outside the engine, such as creating a temporary
  /// database file to open a store on.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("unable to build iteration worker pool: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
  /// One or more concurrent iteration callbacks panicked.
  /// Every other callback still ran to completion.
  #[error("{panicked} iteration callback(s) panicked")]
  CallbackPanicked { panicked: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn bucket_not_found<B: AsRef<[u8]>>(bucket: B) -> Error {
  Error::BucketNotFound(String::from_utf8_lossy(bucket.as_ref()).into_owned())
}
