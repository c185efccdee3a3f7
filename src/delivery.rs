//! Fire-and-forget callback delivery.
//!
//! Each delivery runs on its own tokio task. A semaphore caps how many are
//! in flight; at capacity new deliveries are dropped with a warning rather
//! than queued.
//!
//! ```text
//! handle() ─► DeliveryQueue::submit ─┬─► permit ─► tokio::spawn ─► transport.post
//!                                    └─► no permit ─► warn + drop
//! ```
//!
//! Failures are logged and dropped. Nothing is retried and nothing flows
//! back into the reply that triggered the delivery.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{StatusCode, Uri};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::codec::WireMessage;
use crate::error::{CloudEventError, Result};

/// Default maximum concurrent deliveries.
pub const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 64;

/// Boxed future returned by transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends an encoded event to a callback URL.
pub trait CallbackTransport: Send + Sync + 'static {
    /// POST `message` to `url`, resolving to the response status.
    fn post(&self, url: Uri, message: WireMessage) -> BoxFuture<'static, Result<StatusCode>>;
}

/// Parse and check a callback URL.
///
/// Only absolute `http` and `https` URLs are accepted.
pub fn parse_callback_url(url: &str) -> Result<Uri> {
    let invalid = || CloudEventError::InvalidCallbackUrl(url.to_string());
    let uri: Uri = url.trim().parse().map_err(|_| invalid())?;

    let scheme_ok = matches!(uri.scheme_str(), Some("http") | Some("https"));
    if !scheme_ok || uri.authority().is_none() {
        return Err(invalid());
    }
    Ok(uri)
}

/// Bounded fire-and-forget delivery of encoded events.
#[derive(Clone)]
pub struct DeliveryQueue {
    transport: Arc<dyn CallbackTransport>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl DeliveryQueue {
    /// Create a queue over `transport` allowing `max_concurrent` in flight.
    pub fn new(transport: Arc<dyn CallbackTransport>, max_concurrent: usize) -> Self {
        Self {
            transport,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Maximum deliveries in flight.
    #[inline]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Free delivery slots right now.
    #[inline]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Start delivering `message` to `url`.
    ///
    /// Returns the delivery task, or `None` when the queue is at capacity
    /// and the message was dropped. An invalid URL is rejected before any
    /// task is spawned. Must be called inside a tokio runtime.
    pub fn submit(&self, url: &str, message: WireMessage) -> Result<Option<JoinHandle<()>>> {
        let uri = parse_callback_url(url)?;

        let permit = match self.semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!("Delivery capacity reached, dropping callback to {}", uri);
                return Ok(None);
            }
        };

        let transport = self.transport.clone();
        let handle = tokio::spawn(async move {
            // Permit is held until the post completes
            let _permit = permit;

            match transport.post(uri.clone(), message).await {
                Ok(status) if status.as_u16() < 300 => {
                    tracing::debug!("Callback to {} answered {}", uri, status);
                }
                Ok(status) => {
                    tracing::warn!("Callback to {} rejected with {}", uri, status);
                }
                Err(e) => {
                    tracing::warn!("Callback to {} failed: {}", uri, e);
                }
            }
        });
        Ok(Some(handle))
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("max_concurrent", &self.max_concurrent)
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every post and answers with a fixed result.
    struct Recording {
        posts: Mutex<Vec<(Uri, WireMessage)>>,
        status: StatusCode,
        fail: bool,
    }

    impl Recording {
        fn answering(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                posts: Mutex::new(Vec::new()),
                status,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                posts: Mutex::new(Vec::new()),
                status: StatusCode::OK,
                fail: true,
            })
        }
    }

    impl CallbackTransport for Recording {
        fn post(&self, url: Uri, message: WireMessage) -> BoxFuture<'static, Result<StatusCode>> {
            self.posts.lock().unwrap().push((url, message));
            let result = if self.fail {
                Err(CloudEventError::Delivery("connection refused".to_string()))
            } else {
                Ok(self.status)
            };
            Box::pin(async move { result })
        }
    }

    /// Blocks every post until the gate gets permits.
    struct Gated {
        gate: Arc<Semaphore>,
    }

    impl CallbackTransport for Gated {
        fn post(&self, _url: Uri, _message: WireMessage) -> BoxFuture<'static, Result<StatusCode>> {
            let gate = self.gate.clone();
            Box::pin(async move {
                let _pass = gate.acquire().await;
                Ok(StatusCode::OK)
            })
        }
    }

    #[test]
    fn test_parse_callback_url() {
        assert!(parse_callback_url("https://srcdog.com/madlibs/event").is_ok());
        assert!(parse_callback_url("http://localhost:8080/in").is_ok());

        for bad in ["", "not a url", "/relative/path", "ftp://host/x", "srcdog.com/x"] {
            match parse_callback_url(bad) {
                Err(CloudEventError::InvalidCallbackUrl(u)) => assert_eq!(u, bad),
                other => panic!("expected InvalidCallbackUrl for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[tokio::test]
    async fn test_submit_posts_message() {
        let transport = Recording::answering(StatusCode::OK);
        let queue = DeliveryQueue::new(transport.clone(), 4);

        let mut message = WireMessage::default();
        message.body = bytes::Bytes::from_static(b"{}");

        let handle = queue.submit("http://sink/in", message).unwrap().unwrap();
        handle.await.unwrap();

        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "http://sink/in");
        assert_eq!(&posts[0].1.body[..], b"{}");
        assert_eq!(queue.available(), 4);
    }

    #[tokio::test]
    async fn test_rejected_status_is_not_retried() {
        let transport = Recording::answering(StatusCode::BAD_GATEWAY);
        let queue = DeliveryQueue::new(transport.clone(), 4);

        let handle = queue.submit("http://sink/in", WireMessage::default()).unwrap().unwrap();
        handle.await.unwrap();
        assert_eq!(transport.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_swallowed() {
        let transport = Recording::failing();
        let queue = DeliveryQueue::new(transport.clone(), 4);

        let handle = queue.submit("http://sink/in", WireMessage::default()).unwrap().unwrap();
        assert!(handle.await.is_ok());
        assert_eq!(queue.available(), 4);
    }

    #[tokio::test]
    async fn test_invalid_url_spawns_nothing() {
        let transport = Recording::answering(StatusCode::OK);
        let queue = DeliveryQueue::new(transport.clone(), 4);

        let result = queue.submit("nope", WireMessage::default());
        assert!(matches!(result, Err(CloudEventError::InvalidCallbackUrl(_))));
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drops_at_capacity() {
        let gate = Arc::new(Semaphore::new(0));
        let queue = DeliveryQueue::new(Arc::new(Gated { gate: gate.clone() }), 2);

        let first = queue.submit("http://sink/1", WireMessage::default()).unwrap();
        let second = queue.submit("http://sink/2", WireMessage::default()).unwrap();
        let third = queue.submit("http://sink/3", WireMessage::default()).unwrap();

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(third.is_none());
        assert_eq!(queue.available(), 0);

        gate.add_permits(2);
        first.unwrap().await.unwrap();
        second.unwrap().await.unwrap();
        assert_eq!(queue.available(), 2);
    }
}
