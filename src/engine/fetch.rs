use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;

use super::traits::{CancelHandle, EngineConfig, LoadError, LoadErrorKind, TaskEvent};

/// Streams a remote document into memory, reporting byte progress along
/// the way. The cancel flag is checked between chunks.
#[derive(Debug, Clone)]
pub(crate) struct RemoteFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl RemoteFetcher {
    pub(crate) fn new(config: &EngineConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.redirect_limit))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| LoadError::new(LoadErrorKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            max_bytes: config.max_document_bytes,
        })
    }

    pub(crate) async fn fetch(
        &self,
        url: &str,
        cancel: &CancelHandle,
        events: &UnboundedSender<TaskEvent>,
    ) -> Result<Vec<u8>, LoadError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| LoadError::new(LoadErrorKind::InvalidUrl, err.to_string()))?;
        if cancel.is_cancelled() {
            return Err(LoadError::cancelled());
        }

        let started = Instant::now();
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::new(
                LoadErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        // total = 0 when the server did not announce a length; the session
        // treats that as "no usable progress".
        let total = response.content_length().unwrap_or(0);
        if total > self.max_bytes {
            return Err(LoadError::new(
                LoadErrorKind::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: Some(total),
                },
                "response too large",
            ));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(LoadError::cancelled());
            }
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(LoadError::new(
                    LoadErrorKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
            let _ = events.send(TaskEvent::Progress {
                loaded: bytes.len() as u64,
                total,
            });
        }

        log::debug!(
            "fetched {} bytes from {url} in {:?}",
            bytes.len(),
            started.elapsed()
        );
        Ok(bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LoadError {
    if err.is_timeout() {
        return LoadError::new(LoadErrorKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return LoadError::new(
            LoadErrorKind::Network,
            format!("redirect limit exceeded: {err}"),
        );
    }
    LoadError::new(LoadErrorKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::traits::{CancelHandle, EngineConfig, LoadErrorKind, TaskEvent};
    use super::RemoteFetcher;

    fn fetcher_with_max_bytes(max_bytes: u64) -> RemoteFetcher {
        let config = EngineConfig {
            max_document_bytes: max_bytes,
            ..EngineConfig::default()
        };
        RemoteFetcher::new(&config).expect("fetcher should build")
    }

    fn drain_progress(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<TaskEvent>,
    ) -> Vec<(u64, u64)> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let TaskEvent::Progress { loaded, total } = event {
                seen.push((loaded, total));
            }
        }
        seen
    }

    #[tokio::test]
    async fn fetch_streams_body_and_reports_monotonic_progress() {
        let server = MockServer::start().await;
        let body = vec![7u8; 4096];
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let fetcher = fetcher_with_max_bytes(1024 * 1024);
        let (tx, mut rx) = unbounded_channel();
        let cancel = CancelHandle::new();

        let fetched = fetcher
            .fetch(&format!("{}/doc.pdf", server.uri()), &cancel, &tx)
            .await
            .expect("fetch should succeed");
        assert_eq!(fetched, body);

        let progress = drain_progress(&mut rx);
        assert!(!progress.is_empty());
        let mut last = 0;
        for (loaded, total) in &progress {
            assert!(*loaded >= last);
            assert_eq!(*total, body.len() as u64);
            last = *loaded;
        }
        assert_eq!(last, body.len() as u64);
    }

    #[tokio::test]
    async fn fetch_maps_error_status_to_http_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher_with_max_bytes(1024);
        let (tx, _rx) = unbounded_channel();
        let err = fetcher
            .fetch(&format!("{}/missing.pdf", server.uri()), &CancelHandle::new(), &tx)
            .await
            .expect_err("fetch should fail");
        assert_eq!(err.kind, LoadErrorKind::HttpStatus(404));
    }

    #[tokio::test]
    async fn fetch_rejects_bodies_over_the_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let fetcher = fetcher_with_max_bytes(100);
        let (tx, _rx) = unbounded_channel();
        let err = fetcher
            .fetch(&format!("{}/big.pdf", server.uri()), &CancelHandle::new(), &tx)
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err.kind, LoadErrorKind::TooLarge { max_bytes: 100, .. }));
    }

    #[tokio::test]
    async fn fetch_rejects_unparseable_urls() {
        let fetcher = fetcher_with_max_bytes(1024);
        let (tx, _rx) = unbounded_channel();
        let err = fetcher
            .fetch("not a url at all", &CancelHandle::new(), &tx)
            .await
            .expect_err("fetch should fail");
        assert_eq!(err.kind, LoadErrorKind::InvalidUrl);
    }

    #[tokio::test]
    async fn pre_cancelled_fetch_reports_cancellation() {
        let fetcher = fetcher_with_max_bytes(1024);
        let (tx, _rx) = unbounded_channel();
        let cancel = CancelHandle::new();
        cancel.cancel();

        let err = fetcher
            .fetch("http://127.0.0.1:1/never.pdf", &cancel, &tx)
            .await
            .expect_err("fetch should fail");
        assert!(err.is_cancellation());
    }
}
