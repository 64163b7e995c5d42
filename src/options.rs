use crate::common::defaults::DEFAULT_ITER_WORKERS;
use crate::Store;
use bbolt_rs::{Bolt, BoltOptions};
use getset::CopyGetters;
use std::path::Path;
use typed_builder::TypedBuilder;

/// How write operations commit to the engine.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WriteMode {
  /// Each write runs in its own `update` transaction and is durable when the call returns.
  #[default]
  Update,
  /// Writes go through the engine's `batch`, which may coalesce concurrent writers into
  /// a single commit. Higher throughput, with added per-call latency.
  ///
  /// An error from a caller's own write (an empty key, say) is returned to that caller
  /// and the rest of the batch is retried without it. The engine does not report a
  /// failed commit of the batch itself, so such a failure surfaces as `Ok` to callers
  /// whose writes succeeded. Use [`WriteMode::Update`] when a returned `Ok` must mean
  /// the write is on disk.
  Batch,
}

/// Configuration for a [`Store`].
///
/// ```no_run
/// use blight::{StoreOptions, WriteMode};
///
/// let store = StoreOptions::builder()
///   .write_mode(WriteMode::Batch)
///   .iter_workers(8)
///   .build()
///   .open("widgets.db")?;
/// # Ok::<(), blight::Error>(())
/// ```
#[derive(Debug, Clone, CopyGetters, TypedBuilder)]
#[getset(get_copy = "pub")]
pub struct StoreOptions {
  #[builder(default)]
  write_mode: WriteMode,
  /// Size of the worker pool used by `all_func_concurrent`. Zero is treated as one.
  #[builder(default = DEFAULT_ITER_WORKERS)]
  iter_workers: usize,
}

impl Default for StoreOptions {
  fn default() -> Self {
    StoreOptions::builder().build()
  }
}

impl StoreOptions {
  /// Opens or creates the database file at `path`.
  pub fn open<P: AsRef<Path>>(self, path: P) -> crate::Result<Store> {
    let db = BoltOptions::default().open(path.as_ref())?;
    self.wrap(db)
  }

  /// Opens a database backed by memory only.
  pub fn open_mem(self) -> crate::Result<Store> {
    let db = BoltOptions::default().open_mem()?;
    self.wrap(db)
  }

  /// Wraps an already open engine handle.
  pub fn wrap(self, db: Bolt) -> crate::Result<Store> {
    Store::with_options(db, self)
  }
}
