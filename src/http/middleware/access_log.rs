//! Access log middleware.
//!
//! Wires the request lifecycle to the logger:
//!
//! ```text
//! request start   → RequestContext + counting request body
//! pre-response    → error reply size, or counting response body;
//!                   RequestFault → request-error record
//! response sent   → response record (when the body finishes or is dropped)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::HOST;
use axum::middleware::Next;
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::http::body::CountingBody;
use crate::http::error::{ErrorReply, RequestFault};
use crate::http::request::RequestContext;
use crate::net::ConnectionInfo;
use crate::observability::events::{Event, ResponseSummary};
use crate::observability::Logger;

/// Response extension: this route opted out of access logging.
#[derive(Debug, Clone, Copy)]
pub struct Excluded;

/// Route middleware marking responses as excluded from access logging.
///
/// ```ignore
/// Router::new().route("/health", get(health).layer(middleware::from_fn(exclude_route)))
/// ```
pub async fn exclude_route(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.extensions_mut().insert(Excluded);
    response
}

/// Layer producing [`AccessLog`] services.
#[derive(Debug, Clone)]
pub struct AccessLogLayer {
    logger: Logger,
}

impl AccessLogLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLog {
            inner,
            logger: self.logger.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessLog<S> {
    inner: S,
    logger: Logger,
}

impl<S> Service<Request> for AccessLog<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let context = RequestContext::begin(&request, self.logger.clone());
        let summary = summarize(&request, &context);

        let (mut parts, body) = request.into_parts();
        parts.extensions.insert(context.clone());
        let body = Body::new(CountingBody::new(body, context.counters().request.clone()));

        let future = self.inner.call(Request::from_parts(parts, body));
        Box::pin(async move {
            let response = future.await?;
            Ok(pre_response(response, context, summary))
        })
    }
}

/// Request-side fields of the response record, captured before the request
/// is handed to the router.
fn summarize(request: &Request, context: &RequestContext) -> ResponseSummary {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| request.uri().authority().map(|a| a.to_string()));

    ResponseSummary {
        request_id: context.id().to_string(),
        method: request.method().as_str().to_string(),
        path: request.uri().path().to_string(),
        path_and_query: request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string()),
        host,
        headers: request.headers().clone(),
        connection: request
            .extensions()
            .get::<ConnectInfo<ConnectionInfo>>()
            .map(|ConnectInfo(info)| *info),
        received_at: context.received_at(),
        received: context.received(),
        responded: None,
        status: 0,
        request_size: 0,
        response_size: 0,
        route_excluded: false,
    }
}

fn pre_response(response: Response, context: RequestContext, mut summary: ResponseSummary) -> Response {
    if let Some(fault) = response.extensions().get::<RequestFault>() {
        context.logger().dispatch(Event::RequestError {
            request_id: context.id().to_string(),
            description: fault.description.clone(),
        });
    }

    summary.status = response.status().as_u16();
    summary.route_excluded = response.extensions().get::<Excluded>().is_some();
    let error_reply = response.extensions().get::<ErrorReply>().cloned();

    let (parts, body) = response.into_parts();
    let counters = context.counters().clone();
    let sent = ResponseSent {
        context,
        summary: Some(summary),
    };

    let body = match error_reply {
        Some(ErrorReply(payload)) => {
            counters.response.add(payload.encoded_len());
            Body::new(LoggedBody::new(body, sent))
        }
        None => Body::new(LoggedBody::new(CountingBody::new(body, counters.response), sent)),
    };

    Response::from_parts(parts, body)
}

/// Emits the response record when dropped, reading the counters at that
/// instant.
struct ResponseSent {
    context: RequestContext,
    summary: Option<ResponseSummary>,
}

impl Drop for ResponseSent {
    fn drop(&mut self) {
        if let Some(mut summary) = self.summary.take() {
            let counters = self.context.counters();
            summary.request_size = counters.request.get();
            summary.response_size = counters.response.get();
            self.context.logger().dispatch(Event::Response(Box::new(summary)));
        }
    }
}

pin_project! {
    /// Response body that reports the response once it has been sent.
    struct LoggedBody<B> {
        #[pin]
        inner: B,
        sent: Option<ResponseSent>,
    }
}

impl<B> LoggedBody<B> {
    fn new(inner: B, sent: ResponseSent) -> Self {
        Self {
            inner,
            sent: Some(sent),
        }
    }
}

impl<B: HttpBody> HttpBody for LoggedBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));

        if frame.is_none() {
            if let Some(summary) = this.sent.as_mut().and_then(|sent| sent.summary.as_mut()) {
                summary.responded = Some(Instant::now());
            }
            // dropping the guard emits the record
            this.sent.take();
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
