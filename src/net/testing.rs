//! Test doubles for the network layer

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::error::TransportError;
use super::resolver::Resolver;
use super::transport::{FetchRequest, FetchedPage, HttpTransport};

pub(crate) fn page(final_url: &str, body: &str) -> FetchedPage {
    FetchedPage {
        final_url: final_url.to_string(),
        body: body.to_string(),
        headers: HeaderMap::new(),
    }
}

/// Replies from a per-URL script; the last reply repeats
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<FetchedPage, TransportError>>>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, url: &str, replies: Vec<Result<FetchedPage, TransportError>>) -> Self {
        self.scripts.lock().unwrap().insert(url.to_string(), replies.into());
        self
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requested_urls(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.url.to_string()).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: &FetchRequest) -> Result<FetchedPage, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut scripts = self.scripts.lock().unwrap();
        let Some(replies) = scripts.get_mut(request.url.as_str()) else {
            return Err(TransportError::Other(format!("no script for {}", request.url)));
        };
        match replies.len() {
            0 => Err(TransportError::Other("empty script".to_string())),
            1 => replies[0].clone(),
            _ => replies.pop_front().unwrap_or_else(|| Err(TransportError::Other("empty script".to_string()))),
        }
    }
}

/// Resolves everything except the listed hosts
#[derive(Default)]
pub(crate) struct StaticResolver {
    unresolvable: HashSet<String>,
}

impl StaticResolver {
    pub(crate) fn unresolvable<'a>(hosts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            unresolvable: hosts.into_iter().map(str::to_string).collect(),
        }
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolves(&self, host: &str) -> bool {
        !self.unresolvable.contains(host)
    }
}
