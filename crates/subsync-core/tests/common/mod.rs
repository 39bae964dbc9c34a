//! Test doubles and common utilities for sync contract tests
//!
//! This module provides minimal collaborators that record how the engine
//! uses them, without any real I/O.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subsync_core::error::{Error, Result};
use subsync_core::traits::{
    FetchRequest, FetchResponse, HttpFetcher, Notifier, ResolverBackend, Server, ServerStore,
    Severity, ShareLinkParser,
};
use subsync_core::{MemoryServerStore, SyncComponents};

type Responder = Box<dyn Fn(usize) -> Result<FetchResponse> + Send + Sync>;

/// An HttpFetcher that answers from per-URL scripts
pub struct ScriptedFetcher {
    /// URL → responder receiving the 0-based call index for that URL
    responders: HashMap<String, Responder>,
    /// Per-URL call counters
    calls: Mutex<HashMap<String, usize>>,
    /// Every request received, in order
    requests: Mutex<Vec<FetchRequest>>,
    /// Artificial latency per request
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            responders: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Always answer `url` with `status` and `body`
    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        let body = body.to_string();
        self.respond_with(url, move |_| {
            Ok(FetchResponse {
                status,
                body: body.clone(),
            })
        })
    }

    /// Always fail `url` at the transport level
    pub fn fail(self, url: &str, message: &str) -> Self {
        let message = message.to_string();
        self.respond_with(url, move |_| Err(Error::http(message.clone())))
    }

    /// Answer `url` with a function of the call index
    pub fn respond_with(
        mut self,
        url: &str,
        responder: impl Fn(usize) -> Result<FetchResponse> + Send + Sync + 'static,
    ) -> Self {
        self.responders.insert(url.to_string(), Box::new(responder));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let index = {
            let mut calls = self.calls.lock().unwrap();
            let counter = calls.entry(request.url.clone()).or_insert(0);
            let index = *counter;
            *counter += 1;
            index
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.responders.get(&request.url) {
            Some(responder) => responder(index),
            None => Ok(FetchResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }

    fn fetcher_name(&self) -> &'static str {
        "scripted"
    }
}

/// A parser that reads one hostname per line
///
/// - Blank lines and lines starting with `#` are ignored
/// - A line `INVALID` makes the whole payload a parse error
/// - A line `PANIC` panics (to exercise task isolation)
pub struct LineParser;

impl ShareLinkParser for LineParser {
    fn parse(&self, text: &str) -> Result<Vec<Server>> {
        let mut servers = Vec::new();
        for line in text.lines().map(str::trim) {
            match line {
                "" => {}
                "INVALID" => return Err(Error::parse("unrecognized share link")),
                "PANIC" => panic!("parser exploded"),
                line if line.starts_with('#') => {}
                line => servers.push(Server::new(line, 443).with_remark(line)),
            }
        }
        Ok(servers)
    }

    fn parser_name(&self) -> &'static str {
        "lines"
    }
}

/// A Notifier that records every message
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

/// A ResolverBackend with fixed answers that counts calls
pub struct CountingResolver {
    answers: HashMap<String, String>,
    call_count: Arc<AtomicUsize>,
    proxies: Mutex<Vec<String>>,
}

impl CountingResolver {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(h, ip)| (h.to_string(), ip.to_string()))
                .collect(),
            call_count: Arc::new(AtomicUsize::new(0)),
            proxies: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Upstream proxies the backend was called with
    pub fn proxies(&self) -> Vec<String> {
        self.proxies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResolverBackend for CountingResolver {
    async fn resolve(
        &self,
        upstream_proxy: &str,
        hostnames: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.proxies.lock().unwrap().push(upstream_proxy.to_string());
        Ok(self
            .answers
            .iter()
            .filter(|(hostname, _)| hostnames.contains(*hostname))
            .map(|(h, ip)| (h.clone(), ip.clone()))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// A ServerStore whose replaces always fail
pub struct FailingStore;

#[async_trait]
impl ServerStore for FailingStore {
    async fn replace_group(&self, _group: &str, _servers: Vec<Server>) -> Result<usize> {
        Err(Error::store("disk full"))
    }

    async fn servers(&self) -> Result<Vec<Server>> {
        Ok(Vec::new())
    }

    async fn group(&self, _group: &str) -> Result<Vec<Server>> {
        Ok(Vec::new())
    }

    async fn groups(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Wire doubles into engine components
pub fn components(
    fetcher: Arc<ScriptedFetcher>,
    store: Arc<dyn ServerStore>,
    notifier: Arc<RecordingNotifier>,
    resolver: Option<Arc<CountingResolver>>,
) -> SyncComponents {
    SyncComponents {
        http: fetcher,
        parser: Arc::new(LineParser),
        resolver: resolver.map(|r| r as Arc<dyn ResolverBackend>),
        store,
        notifier,
    }
}

/// An empty in-memory store behind the trait object
pub fn memory_store() -> Arc<MemoryServerStore> {
    Arc::new(MemoryServerStore::new())
}

/// Hostnames of `servers`, in order
pub fn hostnames(servers: &[Server]) -> Vec<String> {
    servers.iter().map(|s| s.hostname.clone()).collect()
}
