use crate::common::errors::bucket_not_found;
use crate::{Error, Store};
use bbolt_rs::{BucketApi, DbApi, TxApi};
use log::warn;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

impl Store {
  /// Calls `f` for every key/value pair in the bucket in ascending key order.
  ///
  /// The whole iteration runs inside one read transaction, so `f` sees a consistent
  /// snapshot. Nested buckets are skipped.
  pub fn all_func<B, F>(&self, bucket: B, mut f: F) -> crate::Result<()>
  where
    B: AsRef<[u8]>,
    F: FnMut(&[u8], &[u8]),
  {
    let bucket = bucket.as_ref();
    let mut found = true;
    self.db.view(|tx| {
      match tx.bucket(bucket) {
        Some(b) => {
          for (k, v) in b.iter_entries() {
            f(k, v);
          }
        }
        None => found = false,
      }
      Ok(())
    })?;
    if !found {
      return Err(bucket_not_found(bucket));
    }
    Ok(())
  }

  /// Like [`all_func`](Store::all_func), but `f` runs on the store's worker pool.
  ///
  /// At most `iter_workers` callbacks run at once and no order is guaranteed, but
  /// every pair is visited exactly once. The read transaction stays open until every
  /// callback has returned.
  ///
  /// The pool is started by the first call on this store or any of its clones.
  ///
  /// A panicking callback does not stop the others. Once all have finished the call
  /// returns [`Error::CallbackPanicked`] with the number that panicked.
  pub fn all_func_concurrent<B, F>(&self, bucket: B, f: F) -> crate::Result<()>
  where
    B: AsRef<[u8]>,
    F: Fn(&[u8], &[u8]) + Sync,
  {
    let bucket = bucket.as_ref();
    let pool = self.pool()?;
    let panicked = AtomicUsize::new(0);
    let mut found = true;
    self.db.view(|tx| {
      let Some(b) = tx.bucket(bucket) else {
        found = false;
        return Ok(());
      };
      let (f, panicked) = (&f, &panicked);
      pool.in_place_scope(|s| {
        for (k, v) in b.iter_entries() {
          s.spawn(move |_| {
            if panic::catch_unwind(AssertUnwindSafe(|| f(k, v))).is_err() {
              panicked.fetch_add(1, Ordering::Relaxed);
            }
          });
        }
      });
      Ok(())
    })?;
    if !found {
      return Err(bucket_not_found(bucket));
    }
    match panicked.into_inner() {
      0 => Ok(()),
      n => {
        warn!(
          "{} callback(s) panicked iterating {:?}",
          n,
          String::from_utf8_lossy(bucket)
        );
        Err(Error::CallbackPanicked { panicked: n })
      }
    }
  }

  /// Number of key/value pairs in the bucket.
  pub fn count<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<usize> {
    let mut n = 0usize;
    self.all_func(bucket, |_, _| n += 1)?;
    Ok(n)
  }
}
