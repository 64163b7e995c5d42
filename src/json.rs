use crate::{SeqId, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl Store {
  /// Stores `value` encoded as JSON under `key`, creating the bucket if needed.
  pub fn set_json<B, K, T>(&self, bucket: B, key: K, value: &T) -> crate::Result<()>
  where
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
    T: Serialize + ?Sized,
  {
    let bytes = serde_json::to_vec(value)?;
    self.set(bucket, key, bytes)
  }

  /// Appends `value` encoded as JSON. See [`append`](Store::append).
  pub fn append_json<B, T>(&self, bucket: B, value: &T) -> crate::Result<SeqId>
  where
    B: AsRef<[u8]>,
    T: Serialize + ?Sized,
  {
    let bytes = serde_json::to_vec(value)?;
    self.append(bucket, bytes)
  }

  /// Retrieves and decodes a JSON value.
  ///
  /// A missing key is `Ok(None)`, the same as [`get`](Store::get), rather than a decode
  /// error for empty input. A value that does not decode as `T` is a
  /// [`Serialization`](crate::Error::Serialization) error.
  pub fn get_json<T, B, K>(&self, bucket: B, key: K) -> crate::Result<Option<T>>
  where
    T: DeserializeOwned,
    B: AsRef<[u8]>,
    K: AsRef<[u8]>,
  {
    match self.get(bucket, key)? {
      Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      None => Ok(None),
    }
  }

  /// Retrieves and decodes a JSON value stored by [`append_json`](Store::append_json).
  pub fn get_seq_json<T, B>(&self, bucket: B, id: SeqId) -> crate::Result<Option<T>>
  where
    T: DeserializeOwned,
    B: AsRef<[u8]>,
  {
    self.get_json(bucket, id.to_key())
  }
}

#[cfg(test)]
mod test {
  use crate::test_support::TestStore;
  use crate::{Error, SeqId};
  use fake::faker::lorem::en::Words;
  use fake::faker::name::en::Name;
  use fake::{Dummy, Fake, Faker};
  use serde::{Deserialize, Serialize};
  use serde_json::{json, Value};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Dummy)]
  struct Widget {
    #[dummy(faker = "Name()")]
    name: String,
    #[dummy(faker = "1..1000")]
    count: u32,
    #[dummy(faker = "Words(0..5)")]
    tags: Vec<String>,
  }

  #[test]
  fn test_json_set_get() -> crate::Result<()> {
    let store = TestStore::new()?;
    store.set_json("widgets", "a", &json!({"a": 1}))?;
    let out: Option<Value> = store.get_json("widgets", "a")?;
    assert_eq!(Some(json!({"a": 1})), out);
    assert_eq!(Some(r#"{"a":1}"#.to_string()), store.get_string("widgets", "a")?);
    Ok(())
  }

  #[test]
  fn test_json_struct_roundtrip() -> crate::Result<()> {
    let store = TestStore::new()?;
    let widgets: Vec<Widget> = (0..20).map(|_| Faker.fake()).collect();
    for (i, widget) in widgets.iter().enumerate() {
      store.set_json("widgets", format!("widget-{:02}", i), widget)?;
    }
    for (i, widget) in widgets.iter().enumerate() {
      let out = store.get_json::<Widget, _, _>("widgets", format!("widget-{:02}", i))?;
      assert_eq!(Some(widget), out.as_ref());
    }
    Ok(())
  }

  #[test]
  fn test_json_missing_key() -> crate::Result<()> {
    let store = TestStore::new()?;
    store.create_bucket("widgets")?;
    assert_eq!(None, store.get_json::<Widget, _, _>("widgets", "foo")?);
    Ok(())
  }

  #[test]
  fn test_json_missing_bucket() -> crate::Result<()> {
    let store = TestStore::new()?;
    assert!(matches!(
      store.get_json::<Widget, _, _>("widgets", "foo"),
      Err(Error::BucketNotFound(_))
    ));
    Ok(())
  }

  #[test]
  fn test_json_decode_error() -> crate::Result<()> {
    let store = TestStore::new()?;
    store.set("widgets", "foo", "not json")?;
    assert!(matches!(
      store.get_json::<Widget, _, _>("widgets", "foo"),
      Err(Error::Serialization(_))
    ));
    store.set_json("widgets", "bar", &json!({"a": 1}))?;
    assert!(matches!(
      store.get_json::<Widget, _, _>("widgets", "bar"),
      Err(Error::Serialization(_))
    ));
    Ok(())
  }

  #[test]
  fn test_json_encode_error() -> crate::Result<()> {
    use std::collections::HashMap;
    let store = TestStore::new()?;
    // JSON object keys must be strings.
    let mut bad = HashMap::new();
    bad.insert(vec![1u8, 2], 3u8);
    assert!(matches!(
      store.set_json("widgets", "foo", &bad),
      Err(Error::Serialization(_))
    ));
    assert!(!store.bucket_exists("widgets")?);
    Ok(())
  }

  #[test]
  fn test_json_append() -> crate::Result<()> {
    let store = TestStore::new()?;
    let first: Widget = Faker.fake();
    let second: Widget = Faker.fake();
    assert_eq!(SeqId(1), store.append_json("widgets", &first)?);
    assert_eq!(SeqId(2), store.append_json("widgets", &second)?);
    assert_eq!(Some(first), store.get_seq_json("widgets", SeqId(1))?);
    assert_eq!(Some(second), store.get_seq_json("widgets", SeqId(2))?);
    Ok(())
  }
}
