//! Typed requests and their builders.
//!
//! Every API call is an [`Operation`]: a value type holding the call's own
//! fields, a draft type the builder accumulates into, and the wire body it
//! encodes to. [`RequestBuilder<O>`] carries the options every call shares
//! and exposes extra setters when the operation's draft implements one of the
//! option mixins ([`PathDraft`], [`MutatingDraft`], [`TabletRangeDraft`]).
//!
//! ```
//! use std::time::Duration;
//! use ytrpc_client::request::{RemountTable, TabletRangeOptions};
//! use ytrpc_common::YPath;
//!
//! let request = RemountTable::builder()
//!     .with_path(YPath::new("//home/logs").unwrap())
//!     .with_tablet_range_options(TabletRangeOptions::new(Some(0), Some(3)))
//!     .with_timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.to_builder().build().unwrap(), request);
//! ```

mod lock;
mod merge;
mod options;
mod table;

pub use lock::{LockNode, LockNodeDraft};
pub use merge::{StartMerge, StartMergeDraft};
pub use options::{
    MutatingDraft, MutatingOptions, PathDraft, TabletRangeDraft, TabletRangeOptions,
};
pub use table::{MountTable, MountTableDraft, RemountTable, TableDraft, UnmountTable, UnmountTableDraft};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use uuid::Uuid;
use ytrpc_common::protocol::wire::{RequestHeader, WireMessage, WireRequest, API_SERVICE};
use ytrpc_common::Result;

/// Trace id and sampling decision propagated to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: Uuid,
    pub sampled: bool,
}

/// Options shared by every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    timeout: Option<Duration>,
    request_id: Option<Uuid>,
    user_agent: Option<String>,
    trace: Option<TraceContext>,
    additional_data: Option<Value>,
}

impl RequestOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn trace(&self) -> Option<TraceContext> {
        self.trace
    }

    pub fn additional_data(&self) -> Option<&Value> {
        self.additional_data.as_ref()
    }

    /// Copies the options into a wire header.
    ///
    /// This is the only place shared options are encoded, so every method
    /// carries them identically. A request id is generated when none was set.
    fn write_to(&self, method: &str, header: &mut RequestHeader) {
        header.service = API_SERVICE.to_string();
        header.method = method.to_string();
        header.request_id = Some(self.request_id.unwrap_or_else(Uuid::new_v4));
        header.timeout_ms = self.timeout.map(|t| t.as_millis() as u64);
        header.user_agent = self.user_agent.clone();
        header.trace_id = self.trace.map(|t| t.trace_id);
        header.trace_sampled = self.trace.map(|t| t.sampled).unwrap_or(false);
        header.additional_data = self.additional_data.clone();
    }
}

/// A single API method.
pub trait Operation: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Builder state: the operation's fields, all optional.
    type Draft: Default + Clone + Debug + Send;
    /// Wire body the operation encodes to.
    type Body: Serialize + Default;
    /// Wire body the proxy answers with.
    type Response: DeserializeOwned + Send;

    /// Proxy method name.
    const METHOD: &'static str;

    /// Validates the draft. Fails with `IncompleteRequest` on a missing required field.
    fn from_draft(draft: Self::Draft) -> Result<Self>;

    /// Draft holding every field of `self`.
    fn to_draft(&self) -> Self::Draft;

    /// Fills the operation-specific part of the wire body.
    fn write_body(&self, body: &mut Self::Body) -> Result<()>;
}

/// An immutable, fully validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<O: Operation> {
    options: RequestOptions,
    operation: O,
}

impl<O: Operation> Request<O> {
    pub(crate) fn from_operation(operation: O) -> Self {
        Self {
            options: RequestOptions::default(),
            operation,
        }
    }

    pub fn builder() -> RequestBuilder<O> {
        RequestBuilder::new()
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    pub fn method(&self) -> &'static str {
        O::METHOD
    }

    /// A builder preloaded with every field of this request.
    pub fn to_builder(&self) -> RequestBuilder<O> {
        RequestBuilder {
            options: self.options.clone(),
            draft: self.operation.to_draft(),
        }
    }

    /// Writes the request into a wire message.
    ///
    /// Shared options go to the header, then the operation fills the body.
    /// Encoding errors are returned unchanged.
    pub fn write_to(&self, message: &mut WireRequest<O::Body>) -> Result<()> {
        self.options.write_to(O::METHOD, &mut message.header);
        self.operation.write_body(&mut message.body)
    }

    /// Encodes the request into the message form transports send.
    pub fn encode(&self) -> Result<WireMessage> {
        let mut message = WireRequest::<O::Body>::default();
        self.write_to(&mut message)?;
        Ok(WireMessage {
            header: message.header,
            body: serde_json::to_value(&message.body)?,
        })
    }
}

/// Mutable accumulator for a [`Request`].
///
/// Setters consume and return the builder so calls chain; setting a field
/// twice keeps the last value. `build` borrows, so a partially filled builder
/// can be built, adjusted and built again.
#[derive(Debug, Clone)]
pub struct RequestBuilder<O: Operation> {
    options: RequestOptions,
    draft: O::Draft,
}

impl<O: Operation> Default for RequestBuilder<O> {
    fn default() -> Self {
        Self {
            options: RequestOptions::default(),
            draft: O::Draft::default(),
        }
    }
}

impl<O: Operation> RequestBuilder<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.options.request_id = Some(request_id);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: Uuid, sampled: bool) -> Self {
        self.options.trace = Some(TraceContext { trace_id, sampled });
        self
    }

    pub fn with_additional_data(mut self, data: Value) -> Self {
        self.options.additional_data = Some(data);
        self
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn draft(&self) -> &O::Draft {
        &self.draft
    }

    pub(crate) fn draft_mut(&mut self) -> &mut O::Draft {
        &mut self.draft
    }

    pub fn build(&self) -> Result<Request<O>> {
        Ok(Request {
            options: self.options.clone(),
            operation: O::from_draft(self.draft.clone())?,
        })
    }
}
