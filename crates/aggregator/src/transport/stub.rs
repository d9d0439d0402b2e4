//! In-memory transport for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Clone)]
enum Reply {
    Response(HttpResponse),
    Error(TransportError),
}

/// Transport answering from a URL → reply table, counting every call.
///
/// Unknown URLs answer `404`. Query strings are ignored when matching; the
/// recorded requests let tests assert on them.
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: Mutex<HashMap<String, (Reply, Duration)>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.insert(url, Reply::Response(HttpResponse::new(status, body)), Duration::ZERO)
    }

    pub(crate) fn respond_after(self, url: &str, delay: Duration, body: &str) -> Self {
        self.insert(url, Reply::Response(HttpResponse::new(200, body)), delay)
    }

    pub(crate) fn fail(self, url: &str, error: TransportError) -> Self {
        self.insert(url, Reply::Error(error), Duration::ZERO)
    }

    fn insert(self, url: &str, reply: Reply, delay: Duration) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), (reply, delay));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_for(&self, url: &str) -> Option<HttpRequest> {
        self.requests().into_iter().find(|r| r.url == url)
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().get(&request.url).cloned();
        self.requests.lock().unwrap().push(request);

        match reply {
            Some((reply, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match reply {
                    Reply::Response(response) => Ok(response),
                    Reply::Error(error) => Err(error),
                }
            }
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}
