//! A BETDAQ exchange client: a market-data stream (MDS) client over
//! text-frame WebSocket, and an order-stack (OS) client over a binary
//! TCP envelope protocol, run side by side.
//!
//! Each stack owns its wire format, its own reconnect policy, and its
//! own configuration prefix (`BETDAQ_AAPI_*` for MDS, `BETDAQ_GBEI_*`
//! for OS) — see [`md_client`] and [`os_client`].

pub use md_client::{MdsClientHandle, spawn as spawn_mds};
pub use os_client::{OsClientHandle, spawn as spawn_os};

pub use md_client::config::{ConfigError as MdsConfigError, MdsConfig, load_config as load_mds_config};
pub use os_client::config::{ConfigError as OsConfigError, OsConfig, load_config as load_os_config};
pub use os_client::events::CallbackRegistry;

/// Both client halves, started together from environment configuration.
pub struct BetdaqClient {
    pub mds: MdsClientHandle,
    pub os: OsClientHandle,
}

impl BetdaqClient {
    /// Load both `BETDAQ_AAPI_*` and `BETDAQ_GBEI_*` configuration from
    /// the process environment and spawn both session drivers.
    pub fn start() -> Result<Self, StartError> {
        let mds_config = load_mds_config().map_err(StartError::Mds)?;
        let os_config = load_os_config().map_err(StartError::Os)?;
        Ok(Self {
            mds: spawn_mds(mds_config),
            os: spawn_os(os_config, CallbackRegistry::new()),
        })
    }

    /// Signal cooperative shutdown to both session drivers and wait for
    /// each to finish.
    pub async fn shutdown(self) {
        self.mds.shutdown().await;
        if let Err(err) = self.os.shutdown().await {
            tracing::warn!(error = %err, "os client shutdown reported an error");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("mds config: {0}")]
    Mds(MdsConfigError),
    #[error("os config: {0}")]
    Os(OsConfigError),
}
