#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::{Matrix, Number, Realness, VariableCategory};

/// A stored variable: its value grid and its announced realness
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StoredValue {
    pub value: Matrix,
    pub realness: Realness,
}

impl StoredValue {
    /// Creates a new [StoredValue].
    pub fn new(value: Matrix, realness: Realness) -> Self {
        Self { value, realness }
    }

    /// Creates a 1x1 [StoredValue] from a single number, deriving the
    /// realness from its imaginary part.
    pub fn scalar(value: Number) -> Self {
        Self {
            realness: Realness::from(value.is_complex()),
            value: Matrix::scalar(value),
        }
    }
}

/// Lookup interface driven by the transaction state machine
///
/// Implementations are called from the dispatcher task while host code may
/// hold its own handle, so every operation is a single atomic step.
pub trait ValueStore {
    /// Gets a copy of the entry for `(category, name)`.
    fn get(&self, category: VariableCategory, name: &str) -> Option<StoredValue>;

    /// Inserts or replaces the entry for `(category, name)`.
    fn put(&self, category: VariableCategory, name: &str, value: StoredValue);

    /// Lists the names stored under a category, in unspecified order.
    fn names(&self, category: VariableCategory) -> Vec<String>;
}

#[cfg(feature = "std")]
mod data_store {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::{StoredValue, ValueStore};
    use crate::VariableCategory;

    type StoreMap = BTreeMap<(VariableCategory, String), StoredValue>;

    /// Concurrency-safe in-memory variable store
    ///
    /// Cloning returns another handle to the same underlying store, so a
    /// host inspector can watch entries while the link dispatcher writes
    /// them.
    #[derive(Clone, Debug, Default)]
    pub struct DataStore {
        inner: Arc<Mutex<StoreMap>>,
    }

    impl DataStore {
        /// Creates a new empty [DataStore].
        pub fn new() -> Self {
            Self::default()
        }

        /// Gets the total number of entries across all categories.
        pub fn len(&self) -> usize {
            self.lock().len()
        }

        /// Gets whether the store holds no entries.
        pub fn is_empty(&self) -> bool {
            self.lock().is_empty()
        }

        fn lock(&self) -> MutexGuard<'_, StoreMap> {
            match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }

    impl ValueStore for DataStore {
        fn get(&self, category: VariableCategory, name: &str) -> Option<StoredValue> {
            self.lock().get(&(category, name.into())).cloned()
        }

        fn put(&self, category: VariableCategory, name: &str, value: StoredValue) {
            self.lock().insert((category, name.into()), value);
        }

        fn names(&self, category: VariableCategory) -> Vec<String> {
            self.lock()
                .keys()
                .filter(|(c, _)| *c == category)
                .map(|(_, name)| name.clone())
                .collect()
        }
    }
}

#[cfg(feature = "std")]
pub use data_store::DataStore;

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::{Number, Result};

    #[test]
    fn test_put_get_replace() -> Result<()> {
        let store = DataStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(VariableCategory::Variable, "A"), None);

        let first = StoredValue::scalar(Number::from_real(1.0));
        store.put(VariableCategory::Variable, "A", first.clone());
        assert_eq!(store.get(VariableCategory::Variable, "A"), Some(first));

        let second = StoredValue::scalar(Number::new(2.0, 3.0));
        store.put(VariableCategory::Variable, "A", second.clone());
        assert_eq!(store.get(VariableCategory::Variable, "A"), Some(second));
        assert_eq!(store.len(), 1);

        Ok(())
    }

    #[test]
    fn test_names_per_category() {
        let store = DataStore::new();
        store.put(
            VariableCategory::Variable,
            "A",
            StoredValue::scalar(Number::from_real(1.0)),
        );
        store.put(
            VariableCategory::Variable,
            "B",
            StoredValue::scalar(Number::from_real(2.0)),
        );
        store.put(
            VariableCategory::Matrix,
            "M",
            StoredValue::scalar(Number::from_real(3.0)),
        );

        let mut names = store.names(VariableCategory::Variable);
        names.sort();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(store.names(VariableCategory::Matrix), ["M"]);
        assert!(store.names(VariableCategory::List).is_empty());
    }

    #[test]
    fn test_clone_shares_entries() {
        let store = DataStore::new();
        let handle = store.clone();

        handle.put(
            VariableCategory::List,
            "L",
            StoredValue::scalar(Number::from_real(9.0)),
        );

        assert_eq!(
            store.get(VariableCategory::List, "L"),
            Some(StoredValue::scalar(Number::from_real(9.0)))
        );
    }
}
