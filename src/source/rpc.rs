//! JSON-RPC envelopes spoken by the proxy.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RPC methods used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    /// List every moderation report.
    DescribeReports,
    /// Describe the moderation state of documents.
    Describe,
}

impl RpcMethod {
    /// Method name on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            RpcMethod::DescribeReports => "img_proxy_describe_report",
            RpcMethod::Describe => "img_proxy_describe",
        }
    }
}

/// Request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    pub jsonrpc: &'a str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub fn new(jsonrpc: &'a str, method: RpcMethod, params: Option<P>) -> Self {
        Self {
            jsonrpc,
            method: method.wire_name(),
            params,
        }
    }
}

/// Parameters of [`RpcMethod::Describe`]. `"*"` selects every document.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeParams {
    pub urls: Vec<String>,
}

/// Response envelope. Error responses carry a `code` and no `result`.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<R> {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub result: Option<R>,
}

impl<R> RpcResponse<R> {
    /// The result, or an [`Error::Rpc`] naming the method and status code.
    pub fn into_result(self, method: RpcMethod) -> Result<R> {
        match self.result {
            Some(result) => Ok(result),
            None => Err(Error::Rpc {
                method: method.wire_name().to_string(),
                code: self.code.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }
}

/// Decode a response body for `method`.
pub fn decode_response<R: DeserializeOwned>(method: RpcMethod, body: &str) -> Result<R> {
    let response: RpcResponse<R> = serde_json::from_str(body)?;
    response.into_result(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawReport;

    #[test]
    fn request_without_params_omits_field() {
        let request: RpcRequest<'_, ()> = RpcRequest::new("1.0.0", RpcMethod::DescribeReports, None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"jsonrpc": "1.0.0", "method": "img_proxy_describe_report"})
        );
    }

    #[test]
    fn describe_request_carries_urls() {
        let params = DescribeParams {
            urls: vec!["*".to_string()],
        };
        let request = RpcRequest::new("1.0.0", RpcMethod::Describe, Some(params));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "img_proxy_describe");
        assert_eq!(json["params"]["urls"][0], "*");
    }

    #[test]
    fn decodes_report_listing() {
        let body = r#"{
            "jsonrpc": "1.0.0",
            "code": "Ok",
            "result": [
                {"url": "ipfs://ipfs/Qm1", "categories": ["Violence"], "id": "r1", "updated_at": "2023-01-01"}
            ]
        }"#;
        let reports: Vec<RawReport> = decode_response(RpcMethod::DescribeReports, body).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "r1");
    }

    #[test]
    fn missing_result_is_rpc_error() {
        let body = r#"{"jsonrpc": "1.0.0", "code": "InvalidRpcMethodError"}"#;
        let err = decode_response::<Vec<RawReport>>(RpcMethod::DescribeReports, body).unwrap_err();
        match err {
            Error::Rpc { method, code } => {
                assert_eq!(method, "img_proxy_describe_report");
                assert_eq!(code, "InvalidRpcMethodError");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = decode_response::<Vec<RawReport>>(RpcMethod::Describe, "not json").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
