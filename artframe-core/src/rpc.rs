//! Message dispatch for the page ⇄ background boundary.

use artframe_model::{RpcRequest, RpcResponse};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::{catalog::SyncOutcome, error::Result, service::AssetService};

/// Handle one raw message. Never fails: decode errors and operation errors
/// both come back as `{success: false, error}`.
pub async fn dispatch(service: &AssetService, message: Value) -> RpcResponse {
    let request = match RpcRequest::from_value(message) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejected message: {}", err);
            return RpcResponse::failure(err.to_string());
        }
    };

    let kind = request.kind();
    debug!("handling {}", kind);
    match handle(service, request).await {
        Ok(data) => RpcResponse::ok(data),
        Err(err) => {
            error!("{} failed: {}", kind, err);
            RpcResponse::failure(err.to_string())
        }
    }
}

async fn handle(service: &AssetService, request: RpcRequest) -> Result<Value> {
    let data = match request {
        RpcRequest::GetCurrentImage => {
            serde_json::to_value(service.current_image().await?)?
        }
        RpcRequest::GetNextImage => {
            serde_json::to_value(service.next_image().await?)?
        }
        RpcRequest::GetPreviousImage => {
            serde_json::to_value(service.previous_image().await?)?
        }
        RpcRequest::GetImage { index } => {
            serde_json::to_value(service.image_at(index).await?)?
        }
        RpcRequest::GetImageDataUrl { image_url } => {
            Value::String(service.image_data_url(&image_url).await?)
        }
        RpcRequest::GetCurrentIndex => json!(service.current_index().await?),
        RpcRequest::SetCurrentIndex { index } => {
            service.set_current_index(index).await?;
            Value::Bool(true)
        }
        RpcRequest::GetNewTabImage => {
            serde_json::to_value(service.new_tab_image().await?)?
        }
        RpcRequest::GetUpdateFrequency => {
            json!(service.update_frequency().await?)
        }
        RpcRequest::SetUpdateFrequency { frequency } => {
            service.set_update_frequency(frequency).await?;
            Value::Bool(true)
        }
        RpcRequest::ClearCache { cache } => {
            service.clear_cache(cache).await?;
            Value::Bool(true)
        }
        RpcRequest::SyncCatalog => {
            let outcome = service.sync().await?;
            json!({
                "refreshed": matches!(outcome, SyncOutcome::Refreshed { .. }),
                "entries": outcome.entries(),
            })
        }
    };
    Ok(data)
}
