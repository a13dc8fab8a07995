// src/classify/cache.rs
//! In-memory classification cache. Only successful classifications are stored,
//! so a provider outage is retried on the next request.

use async_trait::async_trait;
use metrics::counter;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{Classifier, ClassifyResult, DynClassifier};
use crate::report::ClassifiedReport;

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, ClassifiedReport>,
    // insertion order, oldest first
    order: VecDeque<String>,
}

pub struct CachingClassifier {
    inner: DynClassifier,
    capacity: usize,
    state: Mutex<CacheState>,
}

fn cache_key(text: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(text.as_bytes()))
}

impl CachingClassifier {
    pub fn new(inner: DynClassifier, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<ClassifiedReport> {
        let guard = self.state.lock().ok()?;
        guard.entries.get(key).cloned()
    }

    fn store(&self, key: String, report: &ClassifiedReport) {
        let Ok(mut guard) = self.state.lock() else {
            return;
        };
        if guard.entries.contains_key(&key) {
            return;
        }
        while guard.entries.len() >= self.capacity {
            match guard.order.pop_front() {
                Some(oldest) => {
                    guard.entries.remove(&oldest);
                }
                None => break,
            }
        }
        guard.order.push_back(key.clone());
        guard.entries.insert(key, report.clone());
    }
}

#[async_trait]
impl Classifier for CachingClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult {
        let key = cache_key(text);
        if let Some(hit) = self.lookup(&key) {
            counter!("classifier_cache_hits_total").increment(1);
            return Ok(hit);
        }
        let fresh = self.inner.classify(text).await?;
        self.store(key, &fresh);
        Ok(fresh)
    }

    fn batch_concurrency(&self) -> usize {
        self.inner.batch_concurrency()
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
