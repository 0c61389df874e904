//! Object store contract and an in-process implementation.

use crate::StoreError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Destination for quarantined objects.
///
/// A single `put_object` is assumed atomic; nothing else is.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

/// Object captured by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// A store that keeps objects in memory, or rejects every write.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<Vec<StoredObject>>,
    rejection: Option<StoreError>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self {
            objects: Mutex::default(),
            rejection: Some(error),
        }
    }

    /// Objects written so far, in write order.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().expect("lock poisoned").clone()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .expect("lock poisoned")
            .iter()
            .rev()
            .find(|o| o.key == key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        if let Some(error) = &self.rejection {
            return Err(error.clone());
        }
        self.objects
            .lock()
            .expect("lock poisoned")
            .push(StoredObject {
                key: key.to_string(),
                body,
                content_type: content_type.to_string(),
            });
        Ok(())
    }
}
