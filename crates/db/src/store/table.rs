//! Locked documents and record tables.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use rolapet_common::{AppError, AppResult};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use super::KeyValueStore;

/// A record with a stable string identifier.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Primary key.
    fn id(&self) -> &str;
}

/// One JSON document behind the collection lock.
pub struct Document<T> {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            key: self.key.clone(),
            lock: Arc::clone(&self.lock),
            _marker: PhantomData,
        }
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    pub(super) fn new(kv: Arc<dyn KeyValueStore>, key: &str, lock: Arc<Mutex<()>>) -> Self {
        Self {
            kv,
            key: key.to_string(),
            lock,
            _marker: PhantomData,
        }
    }

    /// Collection key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the document; an absent key reads as `T::default()`.
    pub async fn load(&self) -> AppResult<T> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Whether the document has ever been written.
    pub async fn exists(&self) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        Ok(self.kv.get(&self.key).await?.is_some())
    }

    /// Overwrite the document.
    pub async fn replace(&self, value: &T) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        self.write(value).await
    }

    /// Write `value` only if the key is absent. Returns whether it was written.
    pub async fn init_if_absent(&self, value: &T) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        if self.kv.get(&self.key).await?.is_some() {
            return Ok(false);
        }
        self.write(value).await?;
        Ok(true)
    }

    /// Load, apply `f`, and store the result as one locked cycle.
    ///
    /// Nothing is written when `f` fails.
    pub async fn modify<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut T) -> AppResult<R>,
    {
        let _guard = self.lock.lock().await;
        let mut value = self.read().await?;
        let result = f(&mut value)?;
        self.write(&value).await?;
        Ok(result)
    }

    async fn read(&self) -> AppResult<T> {
        match self.kv.get(&self.key).await? {
            Some(raw) => serde_json::from_value(raw).map_err(|e| {
                AppError::Serialization(format!("collection {}: {e}", self.key))
            }),
            None => Ok(T::default()),
        }
    }

    async fn write(&self, value: &T) -> AppResult<()> {
        let raw = serde_json::to_value(value)?;
        self.kv.set(&self.key, raw).await
    }
}

/// A collection of records stored as one ordered JSON array.
///
/// Insertion order is preserved, so it doubles as chronological order.
pub struct Table<T> {
    doc: Document<Vec<T>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            doc: self.doc.clone(),
        }
    }
}

impl<T: Record> Table<T> {
    pub(super) const fn new(doc: Document<Vec<T>>) -> Self {
        Self { doc }
    }

    /// Collection key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.doc.key()
    }

    /// All records in insertion order.
    pub async fn all(&self) -> AppResult<Vec<T>> {
        self.doc.load().await
    }

    /// Find a record by ID.
    pub async fn find(&self, id: &str) -> AppResult<Option<T>> {
        Ok(self.all().await?.into_iter().find(|row| row.id() == id))
    }

    /// Records matching a predicate, in insertion order.
    pub async fn filter<P>(&self, predicate: P) -> AppResult<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|row| predicate(row))
            .collect())
    }

    /// Whether the collection has ever been written.
    pub async fn exists(&self) -> AppResult<bool> {
        self.doc.exists().await
    }

    /// Append a record. Fails with `Duplicate` if the ID is taken.
    pub async fn insert(&self, row: T) -> AppResult<T> {
        self.mutate(move |rows| {
            rows.push(row.clone())?;
            Ok(row)
        })
        .await
    }

    /// Apply `f` to one record. Returns `None` if no record has that ID.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<Option<R>>
    where
        F: FnOnce(&mut T) -> AppResult<R>,
    {
        self.mutate(|rows| rows.get_mut(id).map(f).transpose()).await
    }

    /// Run `f` over the whole collection as one locked cycle.
    pub async fn mutate<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Rows<T>) -> AppResult<R>,
    {
        self.doc
            .modify(|stored| {
                let mut rows = Rows::new(std::mem::take(stored));
                let result = f(&mut rows);
                *stored = rows.into_inner();
                result
            })
            .await
    }

    /// Overwrite the collection.
    pub async fn replace_all(&self, rows: Vec<T>) -> AppResult<()> {
        self.doc.replace(&rows).await
    }

    /// Seed the collection if it has never been written.
    pub async fn init_if_absent(&self, rows: Vec<T>) -> AppResult<bool> {
        self.doc.init_if_absent(&rows).await
    }
}

/// In-memory view of a table during [`Table::mutate`], indexed by ID.
#[derive(Debug)]
pub struct Rows<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Record> Rows<T> {
    fn new(rows: Vec<T>) -> Self {
        let mut this = Self {
            rows,
            index: HashMap::new(),
        };
        this.reindex();
        this
    }

    fn reindex(&mut self) {
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.id().to_string(), i))
            .collect();
    }

    fn into_inner(self) -> Vec<T> {
        self.rows
    }

    /// Record by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    /// Mutable record by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.index.get(id).map(|&i| &mut self.rows[i])
    }

    /// Whether a record with this ID exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// First record matching a predicate.
    pub fn find<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.iter().find(|row| predicate(row))
    }

    /// First mutable record matching a predicate.
    pub fn find_mut<P>(&mut self, predicate: P) -> Option<&mut T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.iter_mut().find(|row| predicate(row))
    }

    /// Append a record. Fails with `Duplicate` if the ID is taken.
    pub fn push(&mut self, row: T) -> AppResult<()> {
        if self.contains(row.id()) {
            return Err(AppError::Duplicate(format!("record {}", row.id())));
        }
        self.index.insert(row.id().to_string(), self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Keep only records matching a predicate. Returns how many were removed.
    pub fn retain<P>(&mut self, predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(predicate);
        self.reindex();
        before - self.rows.len()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    /// Mutable records in insertion order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.rows.iter_mut()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
