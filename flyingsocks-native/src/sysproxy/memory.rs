use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use super::store::{ERROR_MORE_DATA, QueryError, SettingsKey, SettingsStore};

pub(crate) const ERROR_FILE_NOT_FOUND: u32 = 2;
pub(crate) const ERROR_ACCESS_DENIED: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Dword(u32),
    /// UTF-16 units including the terminator.
    Sz(Vec<u16>),
}

/// Registry stand-in that keeps values in memory and counts key handles.
#[derive(Default, Clone)]
pub(crate) struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    values: Mutex<HashMap<String, Value>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    string_queries: AtomicUsize,
    deny_open: AtomicBool,
    deny_write: AtomicBool,
    always_more_data: AtomicBool,
}

impl MemoryStore {
    pub fn value(&self, name: &str) -> Option<Value> {
        self.inner.values.lock().unwrap().get(name).cloned()
    }

    pub fn put(&self, name: &str, value: Value) {
        self.inner
            .values
            .lock()
            .unwrap()
            .insert(name.to_owned(), value);
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn string_queries(&self) -> usize {
        self.inner.string_queries.load(Ordering::SeqCst)
    }

    pub fn deny_open(&self, deny: bool) {
        self.inner.deny_open.store(deny, Ordering::SeqCst);
    }

    pub fn deny_write(&self, deny: bool) {
        self.inner.deny_write.store(deny, Ordering::SeqCst);
    }

    /// Every string query reports that a bigger buffer is needed, as if
    /// another writer kept growing the value.
    pub fn always_more_data(&self, on: bool) {
        self.inner.always_more_data.store(on, Ordering::SeqCst);
    }
}

impl SettingsStore for MemoryStore {
    type Key = MemoryKey;

    fn open(&self) -> Result<MemoryKey, u32> {
        if self.inner.deny_open.load(Ordering::SeqCst) {
            return Err(ERROR_ACCESS_DENIED);
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryKey {
            inner: self.inner.clone(),
        })
    }
}

pub(crate) struct MemoryKey {
    inner: Arc<Inner>,
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl MemoryKey {
    fn write(&self, name: &str, value: Value) -> Result<(), u32> {
        if self.inner.deny_write.load(Ordering::SeqCst) {
            return Err(ERROR_ACCESS_DENIED);
        }
        self.inner
            .values
            .lock()
            .unwrap()
            .insert(name.to_owned(), value);
        Ok(())
    }
}

impl SettingsKey for MemoryKey {
    fn get_dword(&self, value: &str) -> Result<u32, u32> {
        match self.inner.values.lock().unwrap().get(value) {
            Some(Value::Dword(v)) => Ok(*v),
            Some(Value::Sz(_)) => Err(ERROR_UNSUPPORTED_TYPE),
            None => Err(ERROR_FILE_NOT_FOUND),
        }
    }

    fn set_dword(&self, value: &str, data: u32) -> Result<(), u32> {
        self.write(value, Value::Dword(data))
    }

    fn query_string(&self, value: &str, buf: &mut [u16]) -> Result<usize, QueryError> {
        self.inner.string_queries.fetch_add(1, Ordering::SeqCst);
        let values = self.inner.values.lock().unwrap();
        let units = match values.get(value) {
            Some(Value::Sz(units)) => units,
            Some(Value::Dword(_)) => return Err(QueryError::Os(ERROR_UNSUPPORTED_TYPE)),
            None => return Err(QueryError::Os(ERROR_FILE_NOT_FOUND)),
        };
        if self.inner.always_more_data.load(Ordering::SeqCst) {
            return Err(QueryError::MoreData {
                required: buf.len() + 1,
            });
        }
        if units.len() > buf.len() {
            return Err(QueryError::MoreData {
                required: units.len(),
            });
        }
        buf[..units.len()].copy_from_slice(units);
        Ok(units.len())
    }

    fn set_string(&self, value: &str, data: &str) -> Result<(), u32> {
        let units = data.encode_utf16().chain(std::iter::once(0)).collect();
        self.write(value, Value::Sz(units))
    }
}

const ERROR_UNSUPPORTED_TYPE: u32 = 1630;

#[test]
fn test_more_data_code() {
    assert_eq!(QueryError::MoreData { required: 1 }.code(), ERROR_MORE_DATA);
}
