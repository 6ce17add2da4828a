//! Scripted sources shared by the behavior tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rotating_proxy_pool::{
    Capabilities, Protocol, ProxyEndpoint, ProxyItem, ProxySource, SourceError,
};
use tokio::sync::Semaphore;

pub fn endpoint(tag: usize) -> ProxyEndpoint {
    ProxyEndpoint::new(format!("192.0.2.{tag}"), 8080, Protocol::Http)
}

fn items(name: &str, seq: &AtomicUsize, count: usize) -> Vec<ProxyItem> {
    (0..count)
        .map(|_| {
            let n = seq.fetch_add(1, Ordering::Relaxed) + 1;
            ProxyItem::new(format!("{name}-{n}"), name, endpoint(n % 250))
        })
        .collect()
}

/// Yields up to `per_call` fresh items on every fetch.
pub struct YieldingSource {
    name: &'static str,
    per_call: usize,
    fetch_calls: AtomicUsize,
    seq: AtomicUsize,
}

impl YieldingSource {
    pub fn new(name: &'static str, per_call: usize) -> Self {
        Self {
            name,
            per_call,
            fetch_calls: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxySource for YieldingSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(items(self.name, &self.seq, count.min(self.per_call)))
    }
}

/// Fails every fetch.
pub struct FailingSource {
    name: &'static str,
    fetch_calls: AtomicUsize,
}

impl FailingSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxySource for FailingSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::fetch(self.name, "provider unreachable"))
    }
}

/// Returns an empty batch from every fetch.
pub struct EmptySource {
    name: &'static str,
}

impl EmptySource {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl ProxySource for EmptySource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        Ok(Vec::new())
    }
}

/// Release-capable source recording every release it receives.
pub struct RecordingReleaseSource {
    name: &'static str,
    per_call: usize,
    fail_release: bool,
    released: Mutex<Vec<String>>,
    seq: AtomicUsize,
}

impl RecordingReleaseSource {
    pub fn new(name: &'static str, per_call: usize) -> Self {
        Self {
            name,
            per_call,
            fail_release: false,
            released: Mutex::new(Vec::new()),
            seq: AtomicUsize::new(0),
        }
    }

    pub fn failing_release(name: &'static str, per_call: usize) -> Self {
        Self {
            fail_release: true,
            ..Self::new(name, per_call)
        }
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl ProxySource for RecordingReleaseSource {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(true, false)
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        Ok(items(self.name, &self.seq, count.min(self.per_call)))
    }

    async fn release(&self, id: &str) -> Result<(), SourceError> {
        self.released.lock().push(id.to_string());
        if self.fail_release {
            return Err(SourceError::release(self.name, "vendor rejected the call"));
        }
        Ok(())
    }
}

/// First fetch succeeds immediately; later fetches block until `open()`.
pub struct GatedSource {
    name: &'static str,
    first: usize,
    later: usize,
    gate: Semaphore,
    fetch_calls: AtomicUsize,
    seq: AtomicUsize,
}

impl GatedSource {
    pub fn new(name: &'static str, first: usize, later: usize) -> Self {
        Self {
            name,
            first,
            later,
            gate: Semaphore::new(0),
            fetch_calls: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
        }
    }

    /// Let every pending and future gated fetch proceed.
    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxySource for GatedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            return Ok(items(self.name, &self.seq, count.min(self.first)));
        }
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| SourceError::fetch(self.name, "gate closed"))?;
        permit.forget();
        Ok(items(self.name, &self.seq, count.min(self.later)))
    }
}

/// First fetch succeeds; every later fetch fails.
pub struct FailingAfterFirstSource {
    name: &'static str,
    first: usize,
    fetch_calls: AtomicUsize,
    seq: AtomicUsize,
}

impl FailingAfterFirstSource {
    pub fn new(name: &'static str, first: usize) -> Self {
        Self {
            name,
            first,
            fetch_calls: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProxySource for FailingAfterFirstSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            Ok(items(self.name, &self.seq, count.min(self.first)))
        } else {
            Err(SourceError::fetch(self.name, "quota exceeded"))
        }
    }
}

/// First fetch fails; every later fetch yields `later` items.
pub struct RecoveringSource {
    name: &'static str,
    later: usize,
    fetch_calls: AtomicUsize,
    seq: AtomicUsize,
}

impl RecoveringSource {
    pub fn new(name: &'static str, later: usize) -> Self {
        Self {
            name,
            later,
            fetch_calls: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProxySource for RecoveringSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            Err(SourceError::fetch(self.name, "provider warming up"))
        } else {
            Ok(items(self.name, &self.seq, count.min(self.later)))
        }
    }
}
