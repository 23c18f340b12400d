use std::time::Duration;

use log::info;
use snafu::ResultExt;
use subxt::backend::rpc::reconnecting_rpc_client::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use url::Url;

use crate::error::{ChainConnectionSnafu, Error, Result};

/// Create the subxt client
pub(crate) async fn create_subxt_client(rpc_url: &Url) -> Result<OnlineClient<PolkadotConfig>> {
    info!("Connecting to Substrate node at: {}", rpc_url);

    let ws_client = RpcClient::builder()
        .max_request_size(50 * 1024 * 1024)
        .max_response_size(50 * 1024 * 1024)
        .request_timeout(Duration::from_secs(60))
        .connection_timeout(Duration::from_secs(10))
        .build(rpc_url.to_string())
        .await
        .map_err(|e| Error::RpcClient {
            url: rpc_url.to_string(),
            message: e.to_string(),
        })?;

    let client = OnlineClient::<PolkadotConfig>::from_rpc_client(ws_client)
        .await
        .context(ChainConnectionSnafu)?;

    info!("Substrate client connected");
    Ok(client)
}
