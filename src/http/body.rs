//! Response bodies returned by successful GET and POST requests

use super::adapter::map_transport_error;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Body of a successful response
///
/// Reading keeps honouring the caller's cancellation token, and read
/// failures are mapped the same way as failures of the request itself.
#[derive(Debug)]
pub struct ResponseBody {
    method: Method,
    url: String,
    response: Response,
    token: CancellationToken,
}

impl ResponseBody {
    pub(crate) fn new(
        method: Method,
        url: impl Into<String>,
        response: Response,
        token: CancellationToken,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            response,
            token,
        }
    }

    /// Status code of the response
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// URL the request was issued to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read the whole body
    pub async fn bytes(self) -> Result<Bytes> {
        self.collect(Response::bytes).await
    }

    /// Read the whole body as text
    pub async fn text(self) -> Result<String> {
        self.collect(Response::text).await
    }

    /// Body as a stream of chunks
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        let Self {
            method,
            url,
            response,
            token,
        } = self;

        let state = ChunkState {
            chunks: Box::pin(response.bytes_stream()),
            method,
            url,
            token,
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }

            let item = tokio::select! {
                biased;
                () = state.token.cancelled() => Some(Err(Error::cancelled(state.url.as_str()))),
                chunk = state.chunks.next() => chunk.map(|chunk| {
                    chunk.map_err(|e| {
                        map_transport_error(&state.method, &state.url, e, &state.token)
                    })
                }),
            };

            let item = item?;
            state.finished = item.is_err();
            Some((item, state))
        })
        .boxed()
    }

    /// Body as an [`AsyncRead`]
    ///
    /// Failures surface as [`std::io::Error`]s wrapping the crate error.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin {
        StreamReader::new(
            self.into_stream()
                .map(|chunk| chunk.map_err(std::io::Error::other)),
        )
    }

    async fn collect<T, F, Fut>(self, read: F) -> Result<T>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let Self {
            method,
            url,
            response,
            token,
        } = self;

        tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::cancelled(url.as_str())),
            result = read(response) => {
                result.map_err(|e| map_transport_error(&method, &url, e, &token))
            }
        }
    }
}

/// Progress of a body stream
struct ChunkState<S> {
    chunks: Pin<Box<S>>,
    method: Method,
    url: String,
    token: CancellationToken,
    finished: bool,
}
