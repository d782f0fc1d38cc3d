//! Shared helpers for the integration tests: a scripted in-memory fetcher

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_test::io::{Builder, Mock};
use url::Url;

use fetchlist::app::client::{BodyReader, FetchResponse, HttpFetcher};
use fetchlist::errors::{DownloadError, DownloadResult};

/// One scripted answer to a GET
pub enum Reply {
    /// Status with an empty body
    Status(u16),
    /// 200 with the given declared length and body
    Body { length: Option<u64>, body: Mock },
    /// 200 with an arbitrary body reader
    Reader { length: Option<u64>, body: BodyReader },
    /// The request itself fails
    Fail(String),
    /// The server never sends response headers
    Silent,
}

/// 200 with `content` as the body and its exact length declared
pub fn ok(content: &[u8]) -> Reply {
    Reply::Body {
        length: Some(content.len() as u64),
        body: Builder::new().read(content).build(),
    }
}

/// 200 with `content` as the body and no declared length
pub fn ok_unsized(content: &[u8]) -> Reply {
    Reply::Body {
        length: None,
        body: Builder::new().read(content).build(),
    }
}

/// [`HttpFetcher`] answering from per-URL queues of scripted replies.
///
/// A URL with nothing left in its queue answers 404.
#[derive(Default)]
pub struct FakeFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, reply: Reply) -> &Self {
        let key = Url::parse(url).unwrap().to_string();
        self.replies
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(reply);
        self
    }

    /// Number of GETs issued for `url`
    pub fn calls(&self, url: &str) -> usize {
        let key = Url::parse(url).unwrap().to_string();
        self.calls.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(&self, url: &Url) -> DownloadResult<FetchResponse> {
        let key = url.to_string();
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Status(status)) => {
                let body: BodyReader = Box::new(tokio::io::empty());
                Ok(FetchResponse::new(status, Some(0), body))
            }
            Some(Reply::Body { length, body }) => Ok(FetchResponse::new(200, length, Box::new(body))),
            Some(Reply::Reader { length, body }) => Ok(FetchResponse::new(200, length, body)),
            Some(Reply::Fail(message)) => Err(DownloadError::Other(message)),
            Some(Reply::Silent) => std::future::pending().await,
            None => Ok(FetchResponse::new(404, None, Box::new(tokio::io::empty()))),
        }
    }
}

/// Body that yields `content` once, then removes every in-progress download
/// file in `dir` just before reporting end of stream
pub struct VanishingTempBody {
    content: Vec<u8>,
    dir: PathBuf,
    sent: bool,
}

impl VanishingTempBody {
    pub fn new(content: &[u8], dir: &Path) -> Self {
        Self {
            content: content.to_vec(),
            dir: dir.to_path_buf(),
            sent: false,
        }
    }
}

impl AsyncRead for VanishingTempBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.sent {
            self.sent = true;
            buf.put_slice(&self.content);
        } else {
            for name in file_names(&self.dir) {
                if name.ends_with(".download") {
                    std::fs::remove_file(self.dir.join(name))?;
                }
            }
        }
        Poll::Ready(Ok(()))
    }
}

/// Names of the files directly inside `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// True if any in-progress download file is left in `dir`
pub fn has_temp_files(dir: &Path) -> bool {
    file_names(dir).iter().any(|name| name.ends_with(".download"))
}

pub fn read(path: &PathBuf) -> String {
    std::fs::read_to_string(path).unwrap()
}
