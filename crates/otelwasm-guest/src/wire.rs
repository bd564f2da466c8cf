//! Wire envelope for the processor export.
//!
//! Payloads are OTLP protobuf messages. The guest answers every processing
//! call with a [`ProcessResponse`] carrying the new batch and, if the call
//! failed, a status code and message.

use prost::Message;

use crate::capability::{ProcessOutput, Status, StatusCode};
use crate::error::GuestError;

#[derive(Clone, PartialEq, Message)]
pub struct ProcessResponse {
    /// Encoded batch of the requested signal.
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    /// `0` when the call succeeded, otherwise a [`StatusCode`].
    #[prost(int32, tag = "2")]
    pub status_code: i32,
    #[prost(string, tag = "3")]
    pub status_message: String,
}

impl ProcessResponse {
    /// Encode a processor's output into a response.
    pub fn from_output<T: Message>(output: &ProcessOutput<T>) -> Self {
        let mut response = Self {
            data: output.data.encode_to_vec(),
            ..Default::default()
        };
        if let Some(status) = &output.status {
            response.set_status(status);
        }
        response
    }

    /// A response with an empty batch and the given status.
    pub fn failed(status: &Status) -> Self {
        let mut response = Self::default();
        response.set_status(status);
        response
    }

    fn set_status(&mut self, status: &Status) {
        self.status_code = status.code as i32;
        self.status_message = status.message.clone();
    }

    /// Rebuild the status. Unknown non-zero codes map to [`StatusCode::Error`].
    pub fn status(&self) -> Option<Status> {
        if self.status_code == 0 {
            return None;
        }
        Some(Status {
            code: StatusCode::from_wire(self.status_code).unwrap_or(StatusCode::Error),
            message: self.status_message.clone(),
        })
    }

    /// Decode the carried batch.
    pub fn decode_data<T: Message + Default>(&self) -> Result<T, GuestError> {
        Ok(T::decode(self.data.as_slice())?)
    }
}

/// Decode an OTLP payload handed over by the host.
pub fn decode_payload<T: Message + Default>(payload: &[u8]) -> Result<T, GuestError> {
    Ok(T::decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::common::v1::InstrumentationScope;
    use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span, TracesData};

    fn one_span() -> TracesData {
        TracesData {
            resource_spans: vec![ResourceSpans {
                scope_spans: vec![ScopeSpans {
                    scope: Some(InstrumentationScope {
                        name: "wire-test".into(),
                        ..Default::default()
                    }),
                    spans: vec![Span {
                        name: "GET /".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_success_response_has_no_status() {
        let response = ProcessResponse::from_output(&ProcessOutput::ok(one_span()));
        assert_eq!(response.status_code, 0);
        assert!(response.status().is_none());
        let decoded: TracesData = response.decode_data().unwrap();
        assert_eq!(decoded, one_span());
    }

    #[test]
    fn test_status_forwarded_verbatim() {
        let output = ProcessOutput::with_status(one_span(), Status::unavailable("downstream busy"));
        let response = ProcessResponse::from_output(&output);
        assert_eq!(response.status_code, StatusCode::Unavailable as i32);

        let bytes = response.encode_to_vec();
        let back = ProcessResponse::decode(bytes.as_slice()).unwrap();
        assert_eq!(back.status(), Some(Status::unavailable("downstream busy")));
        assert!(!back.data.is_empty());
    }

    #[test]
    fn test_failed_response_carries_empty_batch() {
        let response = ProcessResponse::failed(&Status::invalid_data("truncated"));
        assert!(response.data.is_empty());
        let decoded: TracesData = response.decode_data().unwrap();
        assert!(decoded.resource_spans.is_empty());
        assert_eq!(response.status().unwrap().code, StatusCode::InvalidData);
    }

    #[test]
    fn test_unknown_status_code_maps_to_error() {
        let response = ProcessResponse {
            status_code: 99,
            status_message: "?".into(),
            ..Default::default()
        };
        assert_eq!(response.status().unwrap().code, StatusCode::Error);
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        let err = decode_payload::<TracesData>(&[0x0a, 0x10, 0x00]).unwrap_err();
        assert!(matches!(err, GuestError::Decode(_)));
    }
}
