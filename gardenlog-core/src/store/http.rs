use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::error::{Operation, StoreError, TransportError};

/// Sends a request, turning network failures and non-2xx statuses into
/// `StoreError::Transport`.
pub(crate) async fn send(
    operation: Operation,
    request: RequestBuilder,
) -> Result<Response, StoreError> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!("{} failed: {}", operation, e);
        StoreError::transport(operation, e)
    })?;

    let status = response.status();
    tracing::debug!("{} -> {}", operation, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("{} returned {}: {}", operation, status, body);
        return Err(StoreError::transport(
            operation,
            TransportError::Status { status, body },
        ));
    }

    Ok(response)
}

/// Reads a JSON body. A body that arrives but does not parse is a decode
/// error, not a transport error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    operation: Operation,
    response: Response,
) -> Result<T, StoreError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| StoreError::transport(operation, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::decode(operation, e))
}
