use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;

use super::{resolve_range, MetricsStore};

/// In-process list. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    list: Mutex<VecDeque<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.list.lock().await.len()
    }
}

fn trim_list(list: &mut VecDeque<String>, start: isize, stop: isize) {
    match resolve_range(list.len(), start, stop) {
        Some((start, stop)) => {
            list.truncate(stop + 1);
            list.drain(..start);
        }
        None => list.clear(),
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn push_front(&self, value: String) -> Result<(), StoreError> {
        self.list.lock().await.push_front(value);
        Ok(())
    }

    async fn trim(&self, start: isize, stop: isize) -> Result<(), StoreError> {
        let mut list = self.list.lock().await;
        trim_list(&mut list, start, stop);
        Ok(())
    }

    async fn range(&self, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        let list = self.list.lock().await;
        Ok(match resolve_range(list.len(), start, stop) {
            Some((start, stop)) => list.range(start..=stop).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn push_front_capped(&self, value: String, capacity: usize) -> Result<(), StoreError> {
        let mut list = self.list.lock().await;
        list.push_front(value);
        list.truncate(capacity);
        Ok(())
    }
}
