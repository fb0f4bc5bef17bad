//! Test utilities for driving the crawler without a real server.
//!
//! [`ScriptedLister`] answers in memory. [`VaultStub`] is a tiny local
//! HTTP server for exercising [`crate::VaultClient`] and the binary.
//!
//! This module is only compiled for tests, benchmarks and the
//! `test-utils` feature.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::client::{KeyLister, ListError};
use crate::tree::{NodeId, SecretStore};

#[derive(Debug, Clone)]
enum Response {
    Keys(Vec<String>),
    Leaf,
    Denied,
    Broken(u16),
}

/// In-memory [`KeyLister`] answering from a path → response script.
///
/// Paths that are not scripted behave as leaves. Every call is recorded
/// in order.
#[derive(Debug, Default)]
pub struct ScriptedLister {
    script: HashMap<String, Response>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `path` to return `keys`.
    pub fn keys(mut self, path: &str, keys: &[&str]) -> Self {
        let keys = keys.iter().map(|k| k.to_string()).collect();
        self.script.insert(path.to_string(), Response::Keys(keys));
        self
    }

    /// Script `path` to return no key list.
    pub fn leaf(mut self, path: &str) -> Self {
        self.script.insert(path.to_string(), Response::Leaf);
        self
    }

    /// Script `path` to fail with permission denied.
    pub fn deny(mut self, path: &str) -> Self {
        self.script.insert(path.to_string(), Response::Denied);
        self
    }

    /// Script `path` to fail with an HTTP status.
    pub fn fail(mut self, path: &str, status: u16) -> Self {
        self.script.insert(path.to_string(), Response::Broken(status));
        self
    }

    /// Paths listed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Build a script describing a uniform tree `width` wide and `depth`
    /// deep below `base`.
    pub fn uniform(base: &str, width: usize, depth: usize) -> Self {
        let mut lister = Self::new();
        let mut level = vec![base.to_string()];
        for d in 0..depth {
            let mut next = Vec::new();
            for path in &level {
                let keys: Vec<String> = (0..width)
                    .map(|i| {
                        if d + 1 < depth {
                            format!("node-{}-{}/", d, i)
                        } else {
                            format!("leaf-{}", i)
                        }
                    })
                    .collect();
                for key in &keys {
                    next.push(format!("{}/{}", path, key.trim_end_matches('/')));
                }
                lister.script.insert(path.clone(), Response::Keys(keys));
            }
            level = next;
        }
        lister
    }
}

impl KeyLister for ScriptedLister {
    fn list(&self, path: &str) -> Result<Option<Vec<String>>, ListError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(path.to_string());
        }
        match self.script.get(path) {
            Some(Response::Keys(keys)) => Ok(Some(keys.clone())),
            Some(Response::Leaf) | None => Ok(None),
            Some(Response::Denied) => Err(ListError::PermissionDenied {
                path: path.to_string(),
            }),
            Some(Response::Broken(status)) => Err(ListError::Status {
                path: path.to_string(),
                status: *status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: String,
}

/// One request received by a [`VaultStub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRequest {
    /// Raw request target, query included
    pub target: String,
    pub token: Option<String>,
}

/// Local HTTP server answering Vault list requests from a script.
///
/// Routes match the raw, still percent-encoded request path without its
/// query. Unscripted paths answer 404.
#[derive(Debug, Default, Clone)]
pub struct VaultStub {
    routes: HashMap<String, Reply>,
}

impl VaultStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the listing of keyspace `path` with `keys`.
    pub fn keys(self, path: &str, keys: &[&str]) -> Self {
        let body = serde_json::json!({ "data": { "keys": keys } }).to_string();
        self.reply(&format!("/v1/{}", path), 200, &body)
    }

    /// Answer requests for the raw path `target` with `status` and `body`.
    pub fn reply(mut self, target: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            target.to_string(),
            Reply {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// Serve on an ephemeral loopback port until the process exits.
    pub fn start(self) -> io::Result<RunningStub> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let address = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let routes = self.routes;
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let _ = answer(stream, &routes, &seen);
            }
        });

        Ok(RunningStub { address, requests })
    }
}

/// Handle on a started [`VaultStub`].
#[derive(Debug, Clone)]
pub struct RunningStub {
    address: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl RunningStub {
    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

fn answer(
    stream: TcpStream,
    routes: &HashMap<String, Reply>,
    seen: &Mutex<Vec<StubRequest>>,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut token = None;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header.trim_end().is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-vault-token") {
                token = Some(value.trim().to_string());
            }
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let route = target.split('?').next().unwrap_or(target);
    if let Ok(mut seen) = seen.lock() {
        seen.push(StubRequest {
            target: target.to_string(),
            token,
        });
    }

    let reply = routes.get(route).cloned().unwrap_or(Reply {
        status: 404,
        body: r#"{"errors":[]}"#.to_string(),
    });
    let body = if reply.status == 204 { "" } else { reply.body.as_str() };
    let reason = match reply.status {
        200 => "OK",
        204 => "No Content",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    };

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason,
        body.len(),
        body
    )?;
    stream.flush()
}

/// Build a store directly from `(parent_path, child_path)` pairs.
///
/// Parents must be registered before their children.
pub fn store_from_edges(root: &str, edges: &[(&str, &str)]) -> SecretStore {
    let mut store = SecretStore::with_root(root);
    for (parent, child) in edges {
        let parent: NodeId = store
            .lookup(parent)
            .unwrap_or_else(|| panic!("parent '{}' not registered", parent));
        store.register(parent, *child);
    }
    store
}
