use axum::http::{HeaderMap, HeaderValue};

pub const TRACE_HEADER: &str = "x-trace-id";

/// 요청 단위 Trace ID 생성 및 전파를 담당
pub struct TraceContext;

impl TraceContext {
    /// 새 Trace ID 생성 (UUID v4)
    pub fn new_trace_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// HTTP 헤더에서 Trace ID 추출 (없거나 비어 있으면 생성)
    pub fn extract_or_generate(headers: &HeaderMap) -> String {
        headers
            .get(TRACE_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= 128)
            .map(|s| s.to_string())
            .unwrap_or_else(Self::new_trace_id)
    }

    /// Trace ID를 HTTP 헤더에 추가
    pub fn add_to_headers(headers: &mut HeaderMap, trace_id: &str) {
        if let Ok(value) = HeaderValue::from_str(trace_id) {
            headers.insert(TRACE_HEADER, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trace_id() {
        let id1 = TraceContext::new_trace_id();
        let id2 = TraceContext::new_trace_id();

        assert_ne!(id1, id2);
        assert!(uuid::Uuid::parse_str(&id1).is_ok());
    }

    #[test]
    fn test_extract_or_generate_with_existing() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACE_HEADER, "demo-trace".parse().unwrap());

        assert_eq!(TraceContext::extract_or_generate(&headers), "demo-trace");
    }

    #[test]
    fn test_blank_header_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACE_HEADER, "   ".parse().unwrap());

        let trace_id = TraceContext::extract_or_generate(&headers);
        assert!(uuid::Uuid::parse_str(&trace_id).is_ok());
    }

    #[test]
    fn test_add_to_headers() {
        let mut headers = HeaderMap::new();
        TraceContext::add_to_headers(&mut headers, "abc");
        assert_eq!(headers.get(TRACE_HEADER).unwrap(), "abc");
    }
}
