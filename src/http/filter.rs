//! Per-request filter contract.
//!
//! The host drives a filter through a fixed sequence of hooks:
//!
//! ```text
//! decode_headers → decode_data* → decode_trailers? → encode_headers
//! ```
//!
//! Every hook receives the stream's [`FilterCallbacks`] so the filter can
//! annotate the request or answer it locally.

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};

/// Result of a headers hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterHeadersStatus {
    /// Hand the headers to the next stage.
    Continue,
    /// Hold the request; the filter owns it from here on.
    StopIteration,
}

/// Result of a body hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDataStatus {
    Continue,
    /// Drop the chunk without buffering it.
    StopIterationNoBuffer,
}

/// Result of a trailers hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTrailersStatus {
    Continue,
    StopIteration,
}

/// Diagnostic flags recorded against a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFlag {
    /// The request was answered locally with a non-2xx health verdict.
    FailedLocalHealthCheck,
}

/// Diagnostic metadata of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    health_check: bool,
    response_flags: Vec<ResponseFlag>,
}

impl StreamInfo {
    pub fn set_health_check(&mut self, health_check: bool) {
        self.health_check = health_check;
    }

    /// True when the request was recognized as a health-check probe.
    pub fn is_health_check(&self) -> bool {
        self.health_check
    }

    pub fn set_response_flag(&mut self, flag: ResponseFlag) {
        if !self.response_flags.contains(&flag) {
            self.response_flags.push(flag);
        }
    }

    pub fn has_response_flag(&self, flag: ResponseFlag) -> bool {
        self.response_flags.contains(&flag)
    }

    pub fn response_flags(&self) -> &[ResponseFlag] {
        &self.response_flags
    }
}

/// A response synthesized by a filter instead of the upstream.
#[derive(Debug, Clone)]
pub struct LocalReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl LocalReply {
    /// An empty-bodied reply.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Host-side services available to a filter while it handles a request.
pub trait FilterCallbacks {
    fn stream_info(&mut self) -> &mut StreamInfo;

    /// Override the tracing sampling decision for this request and its children.
    fn set_sampled(&mut self, sampled: bool);

    /// Answer the request locally. The host runs the encode path over the reply.
    fn send_local_reply(&mut self, reply: LocalReply);
}

/// A filter instance bound to a single request.
pub trait StreamFilter: Send {
    fn decode_headers(
        &mut self,
        request: &Parts,
        end_stream: bool,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterHeadersStatus;

    fn decode_data(
        &mut self,
        data: &[u8],
        end_stream: bool,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterDataStatus;

    fn decode_trailers(
        &mut self,
        trailers: &HeaderMap,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterTrailersStatus;

    /// Inspect and amend the response headers about to be sent.
    fn encode_headers(&mut self, status: StatusCode, headers: &mut HeaderMap) -> FilterHeadersStatus;
}
