pub mod amount;
pub mod domain;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod submitter;

pub use amount::{format_stroops, max_contribution, to_stroops, AmountError, STROOPS_PER_UNIT};
pub use domain::{
    EnvelopeError, FailureReason, LedgerTxStatus, PollState, SendResponse, SendStatus,
    SessionState, SignOptions, SignedEnvelope, SignedTransaction, SubmissionOutcome,
    SubmissionRequest, TransactionLookup, WalletIdentity, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL_MS, RPC_NOT_FOUND_CODE, TESTNET_PASSPHRASE, TESTNET_RPC_URL,
};
pub use ports::{
    ActiveIdentity, BalancePort, LedgerRpcPort, PortError, SessionStorePort, SigningGateway,
    SleepPort, WalletProviderPort,
};
pub use session::{ConnectOutcome, Listener, Session, SessionError, SubscriptionId};
pub use state_machine::{session_transition, SessionAction, StateTransition, TransitionError};
pub use submitter::{
    classify_poll, CancelToken, InFlight, PollVerdict, SubmitCallbacks, Submitter,
    SubmitterConfig,
};
