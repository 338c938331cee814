//! Health check middleware for axum.
//!
//! Drives a fresh health check filter per request. Requests the filter
//! holds are answered locally; everything else reaches the inner service
//! and the filter sees the response on the way out.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::{Body, HttpBody};
use axum::extract::State;
use axum::http::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;

use crate::health::{HealthCheckFilter, HealthCheckFilterConfig};
use crate::http::filter::{FilterHeadersStatus, LocalReply, StreamInfo};
use crate::http::pipeline::FilterStream;

/// Filter configuration that can be replaced while serving.
pub type SharedFilterConfig = Arc<ArcSwap<HealthCheckFilterConfig>>;

/// Wrap a filter configuration for sharing with the middleware.
pub fn shared_filter_config(config: HealthCheckFilterConfig) -> SharedFilterConfig {
    Arc::new(ArcSwap::from_pointee(config))
}

/// Middleware function running the health check filter.
pub async fn health_check_middleware(
    State(filters): State<SharedFilterConfig>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = filters.load_full();
    let mut stream = FilterStream::new(config.create_filter());

    let (parts, body) = request.into_parts();
    let end_stream = body.is_end_stream();

    if stream.decode_headers(&parts, end_stream) == FilterHeadersStatus::StopIteration {
        if !end_stream {
            drain_body(&mut stream, body).await;
        }

        if !stream.is_sampled() {
            tracing::trace!(path = %parts.uri.path(), "Probe excluded from trace sampling");
        }

        return match stream.take_local_reply() {
            Some(reply) => local_reply_response(reply, stream.stream_info().clone()),
            // Only reachable when the body failed before it ended. The 400
            // comes from this adapter, not the filter, so it skips the encode
            // path: no cluster header and no cache update.
            None => (StatusCode::BAD_REQUEST, "Incomplete request body").into_response(),
        };
    }

    let mut response = next.run(Request::from_parts(parts, body)).await;
    let status = response.status();
    stream.encode_headers(status, response.headers_mut());
    response.extensions_mut().insert(stream.stream_info().clone());
    response
}

/// Feed the remaining body to the filter without forwarding it.
async fn drain_body(stream: &mut FilterStream<HealthCheckFilter>, mut body: Body) {
    loop {
        match body.frame().await {
            Some(Ok(frame)) => match frame.into_data() {
                Ok(data) => {
                    let end_stream = body.is_end_stream();
                    stream.decode_data(&data, end_stream);
                    if end_stream {
                        return;
                    }
                }
                Err(frame) => {
                    if let Ok(trailers) = frame.into_trailers() {
                        stream.decode_trailers(&trailers);
                        return;
                    }
                }
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed reading health check request body");
                return;
            }
            None => {
                stream.decode_data(&[], true);
                return;
            }
        }
    }
}

fn local_reply_response(reply: LocalReply, info: StreamInfo) -> Response {
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    *response.headers_mut() = reply.headers;
    response.extensions_mut().insert(info);
    response
}
