pub mod clock;
pub mod config;
pub mod gateway;
pub mod horizon;
pub mod rpc;
pub mod store;

pub use clock::RuntimeSleeper;
pub use config::{AdapterConfig, ConfigError, RuntimeProfile, TESTNET_HORIZON_URL};
pub use gateway::{WalletGatewayAdapter, FIXTURE_WALLETS, USER_REJECTED_CODE};
pub use horizon::{HorizonAdapter, HorizonBalance};
pub use rpc::SorobanRpcAdapter;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
pub use store::{FileStore, MemoryStore, SELECTED_WALLET_KEY};
