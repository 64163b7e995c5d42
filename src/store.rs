use crate::common::defaults::ITER_THREAD_PREFIX;
use crate::common::errors::bucket_not_found;
use crate::{Error, SeqId, StoreOptions, WriteMode};
use bbolt_rs::{Bolt, BucketApi, BucketRwApi, DbApi, DbRwAPI, TxApi, TxRwRefApi};
use getset::Getters;
use log::{debug, trace};
use parking_lot::Mutex;
use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runs `$body` in a write transaction using the store's [`WriteMode`].
///
/// The closure is `move` and may be invoked more than once when batched, so the body
/// must only borrow its captures and must only capture owned, `'static` values.
/// `update` hands the closure an owned transaction while `batch` hands it `&mut`.
macro_rules! write_tx {
  ($store:expr, |$tx:ident| $body:block) => {{
    let mut db = $store.db.clone();
    match $store.options.write_mode() {
      WriteMode::Update => db.update(move |mut $tx| $body),
      WriteMode::Batch => db.batch(move |$tx| $body),
    }
  }};
}

/// Bucket helpers over a single open Bolt database.
///
/// Every method runs exactly one engine transaction. Bucket names and keys accept
/// anything that is `AsRef<[u8]>`, so `&str`, `String` and byte slices all work.
///
/// A `Store` is cheap to clone. Clones share the database handle and the iteration
/// worker pool, which is only started by the first concurrent iteration.
#[derive(Clone, Getters)]
pub struct Store {
  /// The underlying engine handle.
  #[getset(get = "pub")]
  pub(crate) db: Bolt,
  #[getset(get = "pub")]
  pub(crate) options: StoreOptions,
  pub(crate) pool: Arc<OnceCell<ThreadPool>>,
}

impl Store {
  /// Opens or creates the database file at `path` with default options.
  pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Store> {
    StoreOptions::default().open(path)
  }

  /// Opens a memory backed database with default options.
  pub fn open_mem() -> crate::Result<Store> {
    StoreOptions::default().open_mem()
  }

  /// Wraps an already open engine handle with default options.
  pub fn new(db: Bolt) -> crate::Result<Store> {
    Store::with_options(db, StoreOptions::default())
  }

  pub fn with_options(db: Bolt, options: StoreOptions) -> crate::Result<Store> {
    Ok(Store {
      db,
      options,
      pool: Arc::new(OnceCell::new()),
    })
  }

  /// The iteration worker pool, built on first use.
  pub(crate) fn pool(&self) -> crate::Result<&ThreadPool> {
    self.pool.get_or_try_init(|| {
      let workers = self.options.iter_workers().max(1);
      debug!("starting {} iteration workers", workers);
      let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("{}-{}", ITER_THREAD_PREFIX, i))
        .build()?;
      Ok(pool)
    })
  }

  /// Close releases the database.
  /// It blocks until every open transaction has finished.
  pub fn close(self) {
    self.db.close();
  }

  /// Stores `value` under `key`, creating the bucket if needed.
  /// An existing value is overwritten.
  pub fn set<B, K, V>(&self, bucket: B, key: K, value: V) -> crate::Result<()>
  where
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
  {
    let bucket = bucket.as_ref().to_vec();
    let key = key.as_ref().to_vec();
    let value = value.as_ref().to_vec();
    trace!(
      "set {:?}/{:?} ({} bytes)",
      String::from_utf8_lossy(&bucket),
      String::from_utf8_lossy(&key),
      value.len()
    );
    write_tx!(self, |tx| {
      let mut b = tx.create_bucket_if_not_exists(bucket.as_slice())?;
      b.put(key.as_slice(), value.as_slice())
    })?;
    Ok(())
  }

  /// Stores `value` under the bucket's next sequence number, creating the bucket if needed.
  ///
  /// Keys are 8-byte big-endian so iteration returns appended values in insertion order.
  /// Returns the sequence number assigned to the value.
  pub fn append<B, V>(&self, bucket: B, value: V) -> crate::Result<SeqId>
  where
    B: AsRef<[u8]>,
    V: AsRef<[u8]>,
  {
    let bucket = bucket.as_ref().to_vec();
    let value = value.as_ref().to_vec();
    let (name, len) = (String::from_utf8_lossy(&bucket).into_owned(), value.len());
    let assigned = Arc::new(Mutex::new(SeqId::default()));
    let slot = assigned.clone();
    write_tx!(self, |tx| {
      let mut b = tx.create_bucket_if_not_exists(bucket.as_slice())?;
      let id = SeqId(b.next_sequence()?);
      b.put(id.to_key().as_slice(), value.as_slice())?;
      *slot.lock() = id;
      Ok(())
    })?;
    let id = *assigned.lock();
    trace!("append {:?}/{} ({} bytes)", name, id, len);
    Ok(id)
  }

  /// Retrieves the value stored under `key`.
  ///
  /// Returns [`Error::BucketNotFound`](crate::Error::BucketNotFound) if the bucket does
  /// not exist and `Ok(None)` if the bucket exists but the key does not.
  pub fn get<B, K>(&self, bucket: B, key: K) -> crate::Result<Option<Vec<u8>>>
  where
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
  {
    let (bucket, key) = (bucket.as_ref(), key.as_ref());
    let mut found = true;
    let mut value = None;
    self.db.view(|tx| {
      match tx.bucket(bucket) {
        Some(b) => value = b.get(key).map(|v| v.to_vec()),
        None => found = false,
      }
      Ok(())
    })?;
    if !found {
      return Err(bucket_not_found(bucket));
    }
    trace!(
      "get {:?}/{:?} hit: {}",
      String::from_utf8_lossy(bucket),
      String::from_utf8_lossy(key),
      value.is_some()
    );
    Ok(value)
  }

  /// [`get`](Store::get) decoded as a UTF-8 string.
  pub fn get_string<B, K>(&self, bucket: B, key: K) -> crate::Result<Option<String>>
  where
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
  {
    match self.get(bucket, key)? {
      Some(v) => Ok(Some(String::from_utf8(v)?)),
      None => Ok(None),
    }
  }

  /// Retrieves a value stored by [`append`](Store::append).
  pub fn get_seq<B: AsRef<[u8]>>(&self, bucket: B, id: SeqId) -> crate::Result<Option<Vec<u8>>> {
    self.get(bucket, id.to_key())
  }

  /// Removes `key` from the bucket. Removing a missing key is not an error,
  /// but the bucket itself must exist.
  pub fn delete<B, K>(&self, bucket: B, key: K) -> crate::Result<()>
  where
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
  {
    let bucket = bucket.as_ref().to_vec();
    let key = key.as_ref().to_vec();
    trace!(
      "delete {:?}/{:?}",
      String::from_utf8_lossy(&bucket),
      String::from_utf8_lossy(&key)
    );
    let name = String::from_utf8_lossy(&bucket).into_owned();
    let missing = Arc::new(AtomicBool::new(false));
    let flag = missing.clone();
    write_tx!(self, |tx| {
      match tx.bucket_mut(bucket.as_slice()) {
        Some(mut b) => {
          flag.store(false, Ordering::Release);
          b.delete(key.as_slice())
        }
        None => {
          flag.store(true, Ordering::Release);
          Ok(())
        }
      }
    })?;
    if missing.load(Ordering::Acquire) {
      return Err(Error::BucketNotFound(name));
    }
    Ok(())
  }

  /// Empties the bucket by dropping and recreating it in one write transaction.
  /// Readers never observe the bucket as missing.
  ///
  /// Returns [`Error::BucketNotFound`] and creates nothing if the bucket does not exist.
  pub fn reset_bucket<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<()> {
    let bucket = bucket.as_ref().to_vec();
    let name = String::from_utf8_lossy(&bucket).into_owned();
    let missing = Arc::new(AtomicBool::new(false));
    let flag = missing.clone();
    write_tx!(self, |tx| {
      let exists = tx.bucket(bucket.as_slice()).is_some();
      flag.store(!exists, Ordering::Release);
      if !exists {
        return Ok(());
      }
      tx.delete_bucket(bucket.as_slice())?;
      tx.create_bucket(bucket.as_slice())?;
      Ok(())
    })?;
    if missing.load(Ordering::Acquire) {
      return Err(Error::BucketNotFound(name));
    }
    debug!("reset bucket {:?}", name);
    Ok(())
  }

  /// Creates the bucket if it does not already exist.
  pub fn create_bucket<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<()> {
    let bucket = bucket.as_ref().to_vec();
    let name = String::from_utf8_lossy(&bucket).into_owned();
    write_tx!(self, |tx| {
      tx.create_bucket_if_not_exists(bucket.as_slice())?;
      Ok(())
    })?;
    debug!("create bucket {:?}", name);
    Ok(())
  }

  /// Deletes the bucket and everything in it if it exists.
  pub fn delete_bucket<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<()> {
    let bucket = bucket.as_ref().to_vec();
    let name = String::from_utf8_lossy(&bucket).into_owned();
    write_tx!(self, |tx| {
      if tx.bucket(bucket.as_slice()).is_some() {
        tx.delete_bucket(bucket.as_slice())?;
      }
      Ok(())
    })?;
    debug!("delete bucket {:?}", name);
    Ok(())
  }

  pub fn bucket_exists<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<bool> {
    let bucket = bucket.as_ref();
    let mut exists = false;
    self.db.view(|tx| {
      exists = tx.bucket(bucket).is_some();
      Ok(())
    })?;
    Ok(exists)
  }

  /// The bucket's current sequence number, without incrementing it.
  /// This is the id handed to the most recent `append`, or zero.
  pub fn sequence<B: AsRef<[u8]>>(&self, bucket: B) -> crate::Result<SeqId> {
    let bucket = bucket.as_ref();
    let mut seq = None;
    self.db.view(|tx| {
      seq = tx.bucket(bucket).map(|b| SeqId(b.sequence()));
      Ok(())
    })?;
    seq.ok_or_else(|| bucket_not_found(bucket))
  }
}
