//! In-memory backends for tests and demos.
//!
//! Both keep everything behind a `std::sync::Mutex` and support fault
//! injection so failure paths can be exercised without a database.

use crate::document::DocumentClient;
use crate::error::BackendError;
use crate::relational::{LogRow, RelationalBackend, Session};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Document client storing JSON documents per `(database, collection)`.
#[derive(Default)]
pub struct MemoryDocumentClient {
    collections: Mutex<HashMap<(String, String), Vec<Value>>>,
    fail: AtomicBool,
}

impl MemoryDocumentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail (or succeed again).
    pub fn fail_inserts(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Value> {
        lock(&self.collections)
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: &Map<String, Value>,
    ) -> Result<(), BackendError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("insert rejected by memory client".into());
        }
        lock(&self.collections)
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .push(Value::Object(document.clone()));
        Ok(())
    }
}

/// Step at which [`MemoryRelationalBackend`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Open,
    Add,
    Commit,
}

#[derive(Default)]
struct RelationalState {
    rows: Vec<LogRow>,
    calls: Vec<&'static str>,
    fail_at: Option<FailAt>,
    fail_rollback: bool,
    fail_close: bool,
}

/// Relational backend that commits rows into a vector and records every
/// session call in order (`"open"`, `"add"`, `"commit"`, `"rollback"`,
/// `"close"`).
#[derive(Default, Clone)]
pub struct MemoryRelationalBackend {
    state: Arc<Mutex<RelationalState>>,
}

impl MemoryRelationalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, step: Option<FailAt>) {
        lock(&self.state).fail_at = step;
    }

    pub fn fail_rollback(&self, fail: bool) {
        lock(&self.state).fail_rollback = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        lock(&self.state).fail_close = fail;
    }

    /// Committed rows.
    pub fn rows(&self) -> Vec<LogRow> {
        lock(&self.state).rows.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }
}

#[async_trait]
impl RelationalBackend for MemoryRelationalBackend {
    async fn open_session(&self) -> Result<Box<dyn Session>, BackendError> {
        let refuse = {
            let mut state = lock(&self.state);
            state.calls.push("open");
            state.fail_at == Some(FailAt::Open)
        };
        if refuse {
            return Err("connection refused".into());
        }
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }
}

struct MemorySession {
    state: Arc<Mutex<RelationalState>>,
    pending: Vec<LogRow>,
}

impl MemorySession {
    fn step(&self, name: &'static str, fail: bool) -> Result<(), BackendError> {
        lock(&self.state).calls.push(name);
        if fail {
            Err(format!("{} failed", name).into())
        } else {
            Ok(())
        }
    }

    fn fails_at(&self, step: FailAt) -> bool {
        lock(&self.state).fail_at == Some(step)
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn add(&mut self, row: &LogRow) -> Result<(), BackendError> {
        self.step("add", self.fails_at(FailAt::Add))?;
        self.pending.push(row.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BackendError> {
        self.step("commit", self.fails_at(FailAt::Commit))?;
        let pending = std::mem::take(&mut self.pending);
        lock(&self.state).rows.extend(pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), BackendError> {
        self.pending.clear();
        let fail = lock(&self.state).fail_rollback;
        self.step("rollback", fail)
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.pending.clear();
        let fail = lock(&self.state).fail_close;
        self.step("close", fail)
    }
}
