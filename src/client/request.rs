//! Request dispatch and stream processing.
//!
//! The HTTP layer is a boundary: it owns content negotiation and feeds
//! bytes into the reassembly pipeline, and everything past the transport
//! is testable without it. [`process_stream`] drives any chunk stream
//! through assembly, decoding, and callback dispatch; [`SlideruleClient`]
//! wraps it around an actual HTTP response body.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ClientError, DecodeError, SchemaError, StreamError};
use crate::reader::{decode_record, DecodedRecord, StreamAssembler, StreamSummary};
use crate::schema::{DefinitionSource, RecordDef, SchemaCache};

use super::config::ClientConfig;

/// Request header distinguishing streaming from plain requests.
const STREAMING_HEADER: &str = "x-sliderule-streaming";

/// A handler invoked once per decoded record of its subscribed type.
///
/// Dispatch is fire-and-forget: the stream loop does not wait for any
/// asynchronous work a handler kicks off, so handlers that persist records
/// must queue internally if they cannot keep up.
pub type RecordHandler = Box<dyn FnMut(DecodedRecord) + Send>;

/// Per-record-type callback registry.
///
/// Callers subscribe only to the record types they care about; records of
/// other types are counted and dropped without disturbing the stream.
#[derive(Default)]
pub struct Callbacks {
    handlers: HashMap<String, RecordHandler>,
}

impl Callbacks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a record type (builder style).
    pub fn on(
        mut self,
        record_type: impl Into<String>,
        handler: impl FnMut(DecodedRecord) + Send + 'static,
    ) -> Self {
        self.register(record_type, handler);
        self
    }

    /// Subscribe a handler to a record type.
    pub fn register(
        &mut self,
        record_type: impl Into<String>,
        handler: impl FnMut(DecodedRecord) + Send + 'static,
    ) {
        self.handlers.insert(record_type.into(), Box::new(handler));
    }

    /// Whether a handler is registered for the given type.
    pub fn contains(&self, record_type: &str) -> bool {
        self.handlers.contains_key(record_type)
    }

    fn get_mut(&mut self, record_type: &str) -> Option<&mut RecordHandler> {
        self.handlers.get_mut(record_type)
    }
}

/// Drive a chunk stream through reassembly, decoding, and dispatch.
///
/// Consumes chunks until the stream ends, slicing out complete records,
/// resolving their definitions through `cache`, decoding, and handing each
/// record to its registered callback in arrival order. Definitions are
/// fetched at most once per type per process (modulo concurrent races);
/// suspension points are chunk arrival and uncached definition fetches.
///
/// # Errors
/// The first fatal condition aborts the stream: version mismatch, stall,
/// transport failure, unresolvable definition, or record decode failure.
/// Record boundaries carry no resynchronization marker, so no attempt is
/// made to continue past a bad record.
pub async fn process_stream<S, E>(
    mut stream: S,
    cache: &SchemaCache,
    callbacks: &mut Callbacks,
) -> Result<StreamSummary, StreamError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut assembler = StreamAssembler::new();
    let mut summary = StreamSummary::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| StreamError::Transport(e.to_string()))?;
        for wire in assembler.feed(&chunk)? {
            *summary
                .record_counts
                .entry(wire.type_name.clone())
                .or_insert(0) += 1;

            let schemas = cache
                .resolve_closure(&wire.type_name)
                .await
                .map_err(DecodeError::from)?;
            let record = decode_record(&wire.type_name, &schemas, &wire.data, 0, wire.data.len())?;

            match callbacks.get_mut(&wire.type_name) {
                Some(handler) => handler(record),
                None => {
                    summary.unhandled_records += 1;
                    warn!(record_type = %wire.type_name, "no callback registered for record type");
                }
            }
        }
    }

    assembler.finish()?;

    summary.bytes_read = assembler.bytes_read();
    summary.bytes_processed = assembler.bytes_processed();
    summary.num_chunks = assembler.num_chunks();
    summary.empty_chunks = assembler.empty_chunks();

    info!(
        bytes_read = summary.bytes_read,
        bytes_processed = summary.bytes_processed,
        num_chunks = summary.num_chunks,
        empty_chunks = summary.empty_chunks,
        records = summary.total_records(),
        "stream complete"
    );
    Ok(summary)
}

/// Client for the record streaming service.
///
/// Holds one shared HTTP connection pool and one process-wide definition
/// cache; concurrent requests share both. Dropping an in-flight request
/// future aborts the transfer and releases buffered partial-record bytes;
/// cached definitions stay valid for later requests.
pub struct SlideruleClient {
    http: reqwest::Client,
    config: ClientConfig,
    cache: Arc<SchemaCache>,
}

impl SlideruleClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// `ClientError::Transport` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let definitions = HttpDefinitionSource {
            http: http.clone(),
            config: config.clone(),
        };
        let cache = Arc::new(SchemaCache::new(Arc::new(definitions)));

        Ok(Self {
            http,
            config,
            cache,
        })
    }

    /// The shared definition cache (useful for prefetching well-known
    /// record types or reading the hit/miss counters).
    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    fn request(&self, api: &str, parms: Option<&Value>, streaming: bool) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(self.config.url_for(api))
            .header(STREAMING_HEADER, if streaming { "1" } else { "0" });
        if let Some(parms) = parms {
            request = request.json(parms);
        }
        if let Some(jwt) = &self.config.jwt {
            request = request.bearer_auth(jwt);
        }
        request
    }

    /// Issue a plain (non-streaming) API request and parse the JSON reply.
    ///
    /// # Errors
    /// `ClientError::Http` on non-success status;
    /// `ClientError::UnexpectedContentType` if the reply is neither JSON
    /// nor plain text.
    pub async fn source(&self, api: &str, parms: Option<&Value>) -> Result<Value, ClientError> {
        debug!(api, "issuing request");
        let response = check_status(self.request(api, parms, false).send().await?)?;

        match content_type(&response).as_deref() {
            Some("application/json") | Some("text/plain") => Ok(response.json().await?),
            other => Err(ClientError::UnexpectedContentType(
                other.map(str::to_string),
            )),
        }
    }

    /// Issue a streaming API request and process the record stream.
    ///
    /// The response body must be `application/octet-stream`; each decoded
    /// record goes to the callback registered for its type. Resolves to
    /// the stream's aggregate summary once the transport signals end of
    /// stream.
    ///
    /// # Errors
    /// `ClientError::Http` on non-success status;
    /// `ClientError::UnexpectedContentType` for a non-binary reply (a JSON
    /// error body belongs on the non-streaming path);
    /// `ClientError::Stream` for any fatal stream condition.
    pub async fn source_stream(
        &self,
        api: &str,
        parms: Option<&Value>,
        callbacks: &mut Callbacks,
    ) -> Result<StreamSummary, ClientError> {
        debug!(api, "issuing streaming request");
        let response = check_status(self.request(api, parms, true).send().await?)?;

        match content_type(&response).as_deref() {
            Some("application/octet-stream") => {
                let body = Box::pin(response.bytes_stream());
                let summary = process_stream(body, &self.cache, callbacks).await?;
                Ok(summary)
            }
            other => Err(ClientError::UnexpectedContentType(
                other.map(str::to_string),
            )),
        }
    }

    /// Fetch the server's version report.
    pub async fn version(&self) -> Result<Value, ClientError> {
        self.source("version", None).await
    }
}

/// Definition source backed by the service's `definition` API.
struct HttpDefinitionSource {
    http: reqwest::Client,
    config: ClientConfig,
}

#[async_trait]
impl DefinitionSource for HttpDefinitionSource {
    async fn fetch_definition(&self, record_type: &str) -> Result<RecordDef, SchemaError> {
        let unavailable = |reason: String| SchemaError::Unavailable {
            record_type: record_type.to_string(),
            reason,
        };

        let mut request = self
            .http
            .post(self.config.url_for("definition"))
            .header(STREAMING_HEADER, "0")
            .json(&serde_json::json!({ "rectype": record_type }));
        if let Some(jwt) = &self.config.jwt {
            request = request.bearer_auth(jwt);
        }

        let response = request.send().await.map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status().as_u16())));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        RecordDef::from_json(record_type, &value)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Http {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// The media type of a response, lowercased and stripped of parameters.
fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or(value)
                .trim()
                .to_ascii_lowercase()
        })
}
