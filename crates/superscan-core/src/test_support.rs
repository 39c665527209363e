//! In-memory backends and fixtures shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::source::{Backend, SourceKind};
use crate::tree::{
    BuiltTree, DirectoryLister, ListedEntry, ListingTarget, ObjectLister, ObjectPage,
    ObjectSummary, TreeNode,
};

/// `proj/` holding `src/main.txt` (10 bytes) and an empty `docs/`.
pub fn scenario_tree() -> TreeNode {
    TreeNode::dir(
        "proj",
        vec![
            TreeNode::dir("src", vec![TreeNode::file("main.txt", 10)]),
            TreeNode::dir("docs", vec![]),
        ],
    )
}

pub fn dir_entry(name: &str, id: &str) -> ListedEntry {
    ListedEntry {
        name: name.to_string(),
        is_dir: true,
        size: 0,
        id: id.to_string(),
    }
}

pub fn file_entry(name: &str, size: u64) -> ListedEntry {
    ListedEntry {
        name: name.to_string(),
        is_dir: false,
        size,
        id: String::new(),
    }
}

/// A hierarchical backend keyed by directory id.
#[derive(Default)]
pub struct MemoryLister {
    dirs: HashMap<String, Vec<ListedEntry>>,
    failing: Vec<String>,
    hide_dotfiles: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, id: &str, entries: Vec<ListedEntry>) -> Self {
        self.dirs.insert(id.to_string(), entries);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    pub fn hiding_dotfiles(mut self) -> Self {
        self.hide_dotfiles = true;
        self
    }

    /// Ids listed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Paths listed so far, in call order.
    pub fn paths(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, path)| path.clone()).collect()
    }
}

#[async_trait]
impl DirectoryLister for MemoryLister {
    fn skips_hidden(&self) -> bool {
        self.hide_dotfiles
    }

    async fn list_entries(
        &self,
        target: ListingTarget<'_>,
        _log: &dyn Logger,
    ) -> CoreResult<Vec<ListedEntry>> {
        self.calls
            .lock()
            .unwrap()
            .push((target.id.to_string(), target.path.to_string()));
        if self.failing.iter().any(|id| id == target.id) {
            return Err(CoreError::BackendUnavailable(format!("cannot list {}", target.id)));
        }
        self.dirs
            .get(target.id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(target.id.to_string()))
    }
}

/// An object store serving fixed pages. Page tokens are page indices.
#[derive(Default)]
pub struct MemoryObjects {
    pages: Vec<Vec<ObjectSummary>>,
    fail: bool,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl MemoryObjects {
    pub fn single_page(objects: &[(&str, u64)]) -> Self {
        Self::paged(vec![objects.to_vec()])
    }

    pub fn paged(pages: Vec<Vec<(&str, u64)>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|(key, size)| ObjectSummary {
                        key: key.to_string(),
                        size,
                    })
                    .collect()
            })
            .collect();
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl ObjectLister for MemoryObjects {
    async fn list_objects(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> CoreResult<ObjectPage> {
        self.requests
            .lock()
            .unwrap()
            .push((prefix.to_string(), page_token.map(str::to_string)));
        if self.fail {
            return Err(CoreError::BackendUnavailable("bucket unreachable".to_string()));
        }
        let index = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| CoreError::BackendUnavailable(format!("bad token {token}")))?,
        };
        let Some(objects) = self.pages.get(index) else {
            return Ok(ObjectPage::default());
        };
        let next_page_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
        Ok(ObjectPage {
            objects: objects.clone(),
            next_page_token,
        })
    }
}

/// A backend whose downloads write registered contents and record every key asked for.
#[derive(Default)]
pub struct FakeBackend {
    files: HashMap<String, Vec<u8>>,
    attempts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, key: &str, contents: &[u8]) -> Self {
        self.files.insert(key.to_string(), contents.to_vec());
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Filesystem
    }

    async fn build_tree(&self, source_path: &str, _log: &dyn Logger) -> CoreResult<BuiltTree> {
        Err(CoreError::NotFound(source_path.to_string()))
    }

    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()> {
        self.attempts.lock().unwrap().push(source_path.to_string());
        let contents = self
            .files
            .get(source_path)
            .ok_or_else(|| CoreError::NotFound(source_path.to_string()))?;
        std::fs::write(destination, contents).map_err(|e| CoreError::local_io(destination, e))
    }
}

/// What the stub server sends back for one request: status and body.
pub type StubReply = (u16, String);

/// A loopback HTTP/1.1 server answering each request from a closure.
///
/// Every connection carries one request and is closed after the reply.
/// Request targets (path and query, still encoded) are recorded in order.
pub struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&Url) -> StubReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let Some(target) = read_request_target(&mut socket).await else {
                    continue;
                };
                seen.lock().unwrap().push(target.clone());
                let url = Url::parse(&format!("http://stub{target}")).unwrap();
                let (status, body) = respond(&url);
                let head = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n",
                    reason(status),
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base, requests }
    }

    /// `http://127.0.0.1:<port>`, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Reads a request head and returns the target of its request line.
async fn read_request_target(socket: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = socket.read(&mut buf).await.ok()?;
        if read == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..read]);
    }
    let text = String::from_utf8_lossy(&head);
    text.lines().next()?.split(' ').nth(1).map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    }
}

/// Decoded value of query parameter `key`.
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
