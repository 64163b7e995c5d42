//! Bucket, JSON and append helpers over the Bolt embedded database.
//!
//! ```no_run
//! use blight::Store;
//!
//! let store = Store::open("widgets.db")?;
//! store.set("widgets", "foo", "bar")?;
//! assert_eq!(Some("bar".to_string()), store.get_string("widgets", "foo")?);
//!
//! let id = store.append_json("events", &serde_json::json!({"kind": "created"}))?;
//! store.all_func("events", |k, v| println!("{:?} {}", k, String::from_utf8_lossy(v)))?;
//! # let _ = id;
//! # Ok::<(), blight::Error>(())
//! ```
mod common;
mod iter;
mod json;
mod options;
mod store;
#[cfg(test)]
mod test_support;

pub use common::errors::{Error, Result};
pub use common::SeqId;
pub use options::{StoreOptions, WriteMode};
pub use store::Store;
