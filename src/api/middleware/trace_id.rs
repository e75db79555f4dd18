use axum::{extract::Request, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::infrastructure::logging::TraceContext;

/// TraceIdLayer - 요청마다 x-trace-id를 보장하는 Axum Layer
///
/// - x-trace-id 헤더가 있으면 사용, 없으면 새로 생성
/// - 생성한 값은 요청 헤더에 넣어 핸들러가 같은 ID를 사용
/// - 응답 헤더에도 trace_id 추가
#[derive(Clone)]
pub struct TraceIdLayer;

impl<S> Layer<S> for TraceIdLayer {
    type Service = TraceIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceIdService { inner }
    }
}

#[derive(Clone)]
pub struct TraceIdService<S> {
    inner: S,
}

impl<S> Service<Request> for TraceIdService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let trace_id = TraceContext::extract_or_generate(req.headers());
            TraceContext::add_to_headers(req.headers_mut(), &trace_id);

            let mut response = inner.call(req).await?;
            TraceContext::add_to_headers(response.headers_mut(), &trace_id);

            Ok(response)
        })
    }
}
