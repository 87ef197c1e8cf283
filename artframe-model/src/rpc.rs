//! Request/response contract between the new-tab page and the background
//! asset pipeline.
//!
//! Messages are JSON objects discriminated by a `type` field, e.g.
//! `{"type": "GET_NEXT_IMAGE"}` or
//! `{"type": "GET_IMAGE_DATA_URL", "imageUrl": "https://..."}`.
//! Every request is answered with an [`RpcResponse`] envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ModelError, Result},
    preferences::{CacheKind, UpdateFrequency},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcRequest {
    GetCurrentImage,
    GetNextImage,
    GetPreviousImage,
    GetImage {
        index: i64,
    },
    GetImageDataUrl {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
    GetCurrentIndex,
    SetCurrentIndex {
        index: i64,
    },
    GetNewTabImage,
    GetUpdateFrequency,
    SetUpdateFrequency {
        frequency: UpdateFrequency,
    },
    ClearCache {
        #[serde(default)]
        cache: CacheKind,
    },
    SyncCatalog,
}

impl RpcRequest {
    /// Wire names of every supported message type.
    pub const KINDS: [&'static str; 12] = [
        "GET_CURRENT_IMAGE",
        "GET_NEXT_IMAGE",
        "GET_PREVIOUS_IMAGE",
        "GET_IMAGE",
        "GET_IMAGE_DATA_URL",
        "GET_CURRENT_INDEX",
        "SET_CURRENT_INDEX",
        "GET_NEW_TAB_IMAGE",
        "GET_UPDATE_FREQUENCY",
        "SET_UPDATE_FREQUENCY",
        "CLEAR_CACHE",
        "SYNC_CATALOG",
    ];

    /// Decode a raw message, telling unknown message types apart from known
    /// types with bad payloads.
    pub fn from_value(value: Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ModelError::MalformedRequest(
                    "missing string field `type`".to_string(),
                )
            })?;

        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(ModelError::UnknownRequest(kind));
        }

        serde_json::from_value(value).map_err(|err| {
            ModelError::MalformedRequest(format!("{kind}: {err}"))
        })
    }

    /// Wire name of this request's type.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcRequest::GetCurrentImage => "GET_CURRENT_IMAGE",
            RpcRequest::GetNextImage => "GET_NEXT_IMAGE",
            RpcRequest::GetPreviousImage => "GET_PREVIOUS_IMAGE",
            RpcRequest::GetImage { .. } => "GET_IMAGE",
            RpcRequest::GetImageDataUrl { .. } => "GET_IMAGE_DATA_URL",
            RpcRequest::GetCurrentIndex => "GET_CURRENT_INDEX",
            RpcRequest::SetCurrentIndex { .. } => "SET_CURRENT_INDEX",
            RpcRequest::GetNewTabImage => "GET_NEW_TAB_IMAGE",
            RpcRequest::GetUpdateFrequency => "GET_UPDATE_FREQUENCY",
            RpcRequest::SetUpdateFrequency { .. } => "SET_UPDATE_FREQUENCY",
            RpcRequest::ClearCache { .. } => "CLEAR_CACHE",
            RpcRequest::SyncCatalog => "SYNC_CATALOG",
        }
    }
}

/// `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn ok<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => {
                Self::failure(format!("failed to encode response: {err}"))
            }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tagged_messages() {
        let req = RpcRequest::from_value(json!({
            "type": "GET_IMAGE_DATA_URL",
            "imageUrl": "https://example.org/a.jpg"
        }))
        .unwrap();
        assert_eq!(
            req,
            RpcRequest::GetImageDataUrl {
                image_url: "https://example.org/a.jpg".into()
            }
        );

        let req =
            RpcRequest::from_value(json!({ "type": "CLEAR_CACHE" })).unwrap();
        assert_eq!(
            req,
            RpcRequest::ClearCache {
                cache: CacheKind::All
            }
        );
    }

    #[test]
    fn unknown_and_malformed_requests_are_distinguished() {
        let err = RpcRequest::from_value(json!({ "type": "PING" }))
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownRequest("PING".into()));
        assert_eq!(err.to_string(), "Unknown request type: PING");

        let err = RpcRequest::from_value(json!({ "type": "SET_CURRENT_INDEX" }))
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedRequest(_)));

        let err = RpcRequest::from_value(json!({ "index": 3 })).unwrap_err();
        assert!(matches!(err, ModelError::MalformedRequest(_)));
    }

    #[test]
    fn kind_round_trips_through_wire_name() {
        let req = RpcRequest::SetUpdateFrequency {
            frequency: UpdateFrequency::EveryHour,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], req.kind());
        assert_eq!(value["frequency"], "every_hour");
    }

    #[test]
    fn envelopes_skip_absent_fields() {
        let ok = serde_json::to_value(RpcResponse::ok(3)).unwrap();
        assert_eq!(ok, json!({ "success": true, "data": 3 }));

        let failed =
            serde_json::to_value(RpcResponse::failure("boom")).unwrap();
        assert_eq!(failed, json!({ "success": false, "error": "boom" }));
    }
}
