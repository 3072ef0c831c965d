//! Bridge between the CLI shell and the signing workspace crates.
//! The shell never touches adapters or ports directly.

use std::path::PathBuf;

use tokio::sync::mpsc;

use soroban_signing_adapters::{
    AdapterConfig, FileStore, HorizonAdapter, RuntimeSleeper, SorobanRpcAdapter,
    WalletGatewayAdapter,
};
use soroban_signing_core::{
    format_stroops, BalancePort, ConnectOutcome, PortError, Session, SessionError,
    SubmissionOutcome, SubmitCallbacks, Submitter, WalletIdentity,
};

type AppSession = Session<WalletGatewayAdapter, FileStore>;
type AppSubmitter = Submitter<WalletGatewayAdapter, SorobanRpcAdapter, RuntimeSleeper>;

const DEFAULT_STORE_PATH: &str = ".soroban-signer/session.json";

pub struct SignerBridge {
    session: AppSession,
    submitter: AppSubmitter,
    gateway: WalletGatewayAdapter,
    horizon: HorizonAdapter,
    identity_changes: mpsc::UnboundedReceiver<()>,
}

impl SignerBridge {
    pub fn new(config: &AdapterConfig) -> Result<Self, PortError> {
        let store_path = config
            .session_store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        let gateway = WalletGatewayAdapter::with_config(config);
        let session = Session::new(gateway.clone(), FileStore::new(store_path));

        let callbacks = SubmitCallbacks::new()
            .on_success(|outcome| tracing::info!(hash = ?outcome.hash(), "transaction confirmed"))
            .on_error(|outcome| tracing::warn!(?outcome, "transaction did not confirm"));
        let submitter = Submitter::new(
            gateway.clone(),
            SorobanRpcAdapter::with_config(config)?,
            RuntimeSleeper,
            config.submitter_config(),
        )
        .with_callbacks(callbacks);

        // Listeners are synchronous, so the balance lookup waits for the next sync.
        let (tx, identity_changes) = mpsc::unbounded_channel();
        session.subscribe(move || {
            let _ = tx.send(());
        });

        tracing::info!(gateway = gateway.mode_label(), rpc = %config.rpc_url, "signer bridge ready");
        Ok(Self {
            session,
            submitter,
            gateway,
            horizon: HorizonAdapter::with_config(config)?,
            identity_changes,
        })
    }

    pub fn identity(&self) -> Option<WalletIdentity> {
        self.session.active_identity()
    }

    /// Restores the persisted selection, if any.
    pub async fn restore(&mut self) -> Result<Option<WalletIdentity>, SessionError> {
        let identity = self.session.refresh().await?;
        self.sync_balance().await;
        Ok(identity)
    }

    pub async fn connect(&mut self, wallet: Option<&str>) -> Result<ConnectOutcome, SessionError> {
        if let Some(wallet) = wallet {
            self.gateway.preselect_wallet(wallet)?;
        }
        let outcome = self.session.connect().await?;
        self.sync_balance().await;
        Ok(outcome)
    }

    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        self.session.disconnect()?;
        if let Err(e) = self.gateway.release().await {
            tracing::warn!(error = %e, "signer proxy did not release the wallet");
        }
        self.sync_balance().await;
        Ok(())
    }

    pub async fn submit(&self, envelope: &str) -> SubmissionOutcome {
        let request = self.submitter.request(envelope);
        self.submitter.submit(&self.session, &request).await
    }

    /// Native balance of the active identity. Lookup failures read as unknown.
    pub async fn balance(&self) -> Option<i128> {
        let identity = self.session.active_identity()?;
        match self.horizon.native_balance(&identity.address).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(address = %identity.address, error = %e, "balance lookup failed");
                None
            }
        }
    }

    async fn sync_balance(&mut self) {
        let mut changed = false;
        while self.identity_changes.try_recv().is_ok() {
            changed = true;
        }
        if !changed {
            return;
        }
        match self.balance().await {
            Some(stroops) => tracing::info!(balance = %format_stroops(stroops), "wallet balance"),
            None => tracing::info!("wallet balance unknown"),
        }
    }
}
