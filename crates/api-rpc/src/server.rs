//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server for the dirsync engine.

use crate::handler::RpcHandler;
use crate::types::{
    AddSourceRequest, DeleteSourceRequest, ListSourcesRequest, MaintenanceRequest,
    SetEnabledRequest, StatsRequest, StatusRequest, TriggerRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;

// Note: jsonrpsee doesn't support Unix sockets directly (hyper limitation)
// Using TCP on localhost as secure alternative (no external access)
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9533;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: Only binds to 127.0.0.1 by default (no external access)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method("sync.trigger.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TriggerRequest =
                        params.parse().unwrap_or(TriggerRequest {});
                    handler.trigger(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sync.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatusRequest = params.parse()?;
                    handler.status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("source.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListSourcesRequest =
                        params.parse().unwrap_or(ListSourcesRequest {});
                    handler.list_sources(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("source.add.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AddSourceRequest = params.parse()?;
                    handler.add_source(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("source.set-enabled.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SetEnabledRequest = params.parse()?;
                    handler.set_enabled(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("source.delete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DeleteSourceRequest = params.parse()?;
                    handler.delete_source(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin APIs
        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatsRequest = params.parse().unwrap_or(StatsRequest {});
                    handler.stats(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.maintenance.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MaintenanceRequest =
                        params.parse().unwrap_or(MaintenanceRequest { force_vacuum: false });
                    handler.maintenance(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
