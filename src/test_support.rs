use crate::{Store, StoreOptions};
use std::ops::Deref;
use tempfile::{Builder, NamedTempFile};

pub(crate) struct TestStore {
  pub(crate) tmp_file: NamedTempFile,
  pub(crate) store: Store,
}

impl Deref for TestStore {
  type Target = Store;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl TestStore {
  pub(crate) fn new() -> crate::Result<TestStore> {
    Self::with_options(StoreOptions::default())
  }

  pub(crate) fn with_options(options: StoreOptions) -> crate::Result<TestStore> {
    let tmp_file = Builder::new()
      .prefix("blight-")
      .suffix(".db")
      .tempfile()?;
    let store = options.open(tmp_file.path())?;

    Ok(TestStore { tmp_file, store })
  }

  pub(crate) fn clone_store(&self) -> Store {
    self.store.clone()
  }

  /// Closes the database and opens the same file again with the same options.
  pub(crate) fn reopen(self) -> crate::Result<TestStore> {
    let TestStore { tmp_file, store } = self;
    let options = store.options().clone();
    store.close();
    let store = options.open(tmp_file.path())?;
    Ok(TestStore { tmp_file, store })
  }
}
