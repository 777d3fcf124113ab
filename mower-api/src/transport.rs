//! Transport trait consumed by the reconciliation engine
//!
//! The engine never talks to the device directly. It issues batched
//! property reads, single property writes, and action calls through this
//! trait and reconciles whatever comes back. Implementations own all
//! connection and session state; from the engine's point of view the
//! transport is a stateless request/response facility.

use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::property::{ActionAddress, PropertyAddress};

/// Devices reject property batches larger than this
pub const MAX_BATCH_SIZE: usize = 15;

/// One entry of a batched property read
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRequest {
    /// Engine-side identifier, echoed back in the result
    pub did: u16,
    pub address: PropertyAddress,
}

/// One entry of a batched property read result
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyResult {
    /// Engine-side identifier from the matching request
    pub did: u16,
    /// Raw value; `None` when the device reported the property unavailable
    pub value: Option<JsonValue>,
    /// Device result code, `0` on success
    pub code: i32,
}

impl PropertyResult {
    pub fn ok(&self) -> bool {
        self.code == 0 && self.value.is_some()
    }
}

/// Result of an action call
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    /// Device result code, `0` on success
    pub code: i32,
    /// Optional output parameters
    pub out: Vec<JsonValue>,
}

impl ActionResult {
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// Request/response facility the engine polls and writes through
///
/// All three calls block until the device answers or the transport gives
/// up. The engine issues them outside of any internal lock and treats a
/// call that never returns as a terminal failure of that cycle.
pub trait Transport: Send + Sync {
    /// Read a batch of properties; the batch is at most [`MAX_BATCH_SIZE`] entries
    fn get_properties(&self, requests: &[PropertyRequest]) -> Result<Vec<PropertyResult>>;

    /// Write a single property value
    fn set_property(&self, address: PropertyAddress, value: JsonValue) -> Result<i32>;

    /// Invoke an action with optional input parameters
    fn action(&self, address: ActionAddress, params: &[JsonValue]) -> Result<ActionResult>;
}

/// Issue an arbitrarily large property read in device-sized chunks
///
/// Results are concatenated in request order. A failing chunk aborts the
/// whole read; partial results from earlier chunks are discarded by the
/// caller along with the error.
pub fn request_in_batches(
    transport: &dyn Transport,
    requests: &[PropertyRequest],
) -> Result<Vec<PropertyResult>> {
    let mut results = Vec::with_capacity(requests.len());
    for chunk in requests.chunks(MAX_BATCH_SIZE) {
        results.extend(transport.get_properties(chunk)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::property::Property;
    use std::sync::Mutex;

    /// Transport that records batch sizes and answers every request with 0
    struct RecordingTransport {
        batches: Mutex<Vec<usize>>,
    }

    impl Transport for RecordingTransport {
        fn get_properties(&self, requests: &[PropertyRequest]) -> Result<Vec<PropertyResult>> {
            self.batches.lock().unwrap().push(requests.len());
            Ok(requests
                .iter()
                .map(|r| PropertyResult {
                    did: r.did,
                    value: Some(serde_json::json!(0)),
                    code: 0,
                })
                .collect())
        }

        fn set_property(&self, _address: PropertyAddress, _value: serde_json::Value) -> Result<i32> {
            Err(ApiError::Unreachable("not under test".into()))
        }

        fn action(&self, _address: ActionAddress, _params: &[serde_json::Value]) -> Result<ActionResult> {
            Err(ApiError::Unreachable("not under test".into()))
        }
    }

    fn requests(n: usize) -> Vec<PropertyRequest> {
        (0..n)
            .map(|i| PropertyRequest {
                did: i as u16,
                address: Property::State.address().unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_small_request_is_a_single_batch() {
        let transport = RecordingTransport { batches: Mutex::new(vec![]) };
        let results = request_in_batches(&transport, &requests(7)).unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(*transport.batches.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_large_request_is_chunked_at_fifteen() {
        let transport = RecordingTransport { batches: Mutex::new(vec![]) };
        let results = request_in_batches(&transport, &requests(38)).unwrap();
        assert_eq!(results.len(), 38);
        assert_eq!(*transport.batches.lock().unwrap(), vec![15, 15, 8]);
    }

    #[test]
    fn test_results_preserve_request_order() {
        let transport = RecordingTransport { batches: Mutex::new(vec![]) };
        let results = request_in_batches(&transport, &requests(20)).unwrap();
        let dids: Vec<u16> = results.iter().map(|r| r.did).collect();
        assert_eq!(dids, (0..20).collect::<Vec<u16>>());
    }
}
