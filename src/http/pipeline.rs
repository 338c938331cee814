//! Host-side driver for a single filter over a single request.
//!
//! # Responsibilities
//! - Own the request's diagnostic metadata and sampling decision
//! - Capture a local reply and run the encode path over it
//! - Run the encode path over upstream responses
//!
//! # Design Decisions
//! - At most one local reply per request; later ones are ignored
//! - A local reply is encoded as soon as it is sent, matching how a
//!   response produced mid-decode flows back through the filter

use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};

use crate::http::filter::{
    FilterCallbacks, FilterDataStatus, FilterHeadersStatus, FilterTrailersStatus, LocalReply,
    StreamFilter, StreamInfo,
};

/// Per-request state the host exposes to a filter.
#[derive(Debug, Default)]
pub struct StreamState {
    info: StreamInfo,
    sampled: Option<bool>,
    local_reply: Option<LocalReply>,
}

impl FilterCallbacks for StreamState {
    fn stream_info(&mut self) -> &mut StreamInfo {
        &mut self.info
    }

    fn set_sampled(&mut self, sampled: bool) {
        self.sampled = Some(sampled);
    }

    fn send_local_reply(&mut self, reply: LocalReply) {
        if self.local_reply.is_some() {
            tracing::warn!(status = %reply.status, "Ignoring second local reply for one request");
            return;
        }
        self.local_reply = Some(reply);
    }
}

/// One filter bound to one request.
#[derive(Debug)]
pub struct FilterStream<F> {
    filter: F,
    state: StreamState,
    reply_encoded: bool,
}

impl<F: StreamFilter> FilterStream<F> {
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            state: StreamState::default(),
            reply_encoded: false,
        }
    }

    pub fn decode_headers(&mut self, request: &Parts, end_stream: bool) -> FilterHeadersStatus {
        let status = self.filter.decode_headers(request, end_stream, &mut self.state);
        self.encode_local_reply();
        status
    }

    pub fn decode_data(&mut self, data: &[u8], end_stream: bool) -> FilterDataStatus {
        let status = self.filter.decode_data(data, end_stream, &mut self.state);
        self.encode_local_reply();
        status
    }

    pub fn decode_trailers(&mut self, trailers: &HeaderMap) -> FilterTrailersStatus {
        let status = self.filter.decode_trailers(trailers, &mut self.state);
        self.encode_local_reply();
        status
    }

    /// Run the encode path over an upstream response.
    pub fn encode_headers(&mut self, status: StatusCode, headers: &mut HeaderMap) -> FilterHeadersStatus {
        self.filter.encode_headers(status, headers)
    }

    pub fn local_reply(&self) -> Option<&LocalReply> {
        self.state.local_reply.as_ref()
    }

    pub fn take_local_reply(&mut self) -> Option<LocalReply> {
        self.state.local_reply.take()
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.state.info
    }

    /// Whether tracing should sample this request. Defaults to true.
    pub fn is_sampled(&self) -> bool {
        self.state.sampled.unwrap_or(true)
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    fn encode_local_reply(&mut self) {
        if self.reply_encoded {
            return;
        }
        if let Some(reply) = self.state.local_reply.as_mut() {
            self.filter.encode_headers(reply.status, &mut reply.headers);
            self.reply_encoded = true;
        }
    }
}
