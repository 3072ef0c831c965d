use soroban_signing_core::{session_transition, SessionAction, SessionState, WalletIdentity};

fn wallet(address: &str) -> WalletIdentity {
    WalletIdentity {
        provider_id: "freighter".to_owned(),
        address: address.to_owned(),
    }
}

#[test]
fn session_happy_path_transitions() {
    let (s1, t1) = session_transition(&SessionState::Disconnected, SessionAction::BeginConnect)
        .expect("disconnected -> connecting");
    assert_eq!(s1, SessionState::Connecting);
    assert_eq!((t1.from, t1.to), ("Disconnected", "Connecting"));

    let (s2, _) = session_transition(&s1, SessionAction::Resolve(wallet("GA1")))
        .expect("connecting -> connected");
    assert_eq!(s2, SessionState::Connected(wallet("GA1")));

    let (s3, t3) =
        session_transition(&s2, SessionAction::Disconnect).expect("connected -> disconnected");
    assert_eq!(s3, SessionState::Disconnected);
    assert_eq!(t3.reason, "Disconnect");
}

#[test]
fn abort_returns_a_fresh_connect_to_disconnected() {
    let (dropped, t) = session_transition(&SessionState::Connecting, SessionAction::Abort)
        .expect("connecting -> disconnected");
    assert_eq!(dropped, SessionState::Disconnected);
    assert_eq!(t.reason, "Abort");
}

#[test]
fn reconnect_never_leaves_connected_for_connecting() {
    let connected = SessionState::Connected(wallet("GA1"));
    let err = session_transition(&connected, SessionAction::BeginConnect)
        .expect_err("connected keeps its identity during selection");
    assert_eq!((err.from, err.action), ("Connected", "BeginConnect"));

    let (switched, _) = session_transition(&connected, SessionAction::Resolve(wallet("GB2")))
        .expect("connected -> connected");
    assert_eq!(switched, SessionState::Connected(wallet("GB2")));
}

#[test]
fn hydration_resolves_straight_from_disconnected() {
    let (state, _) = session_transition(
        &SessionState::Disconnected,
        SessionAction::Resolve(wallet("GA2")),
    )
    .expect("hydrate");
    assert_eq!(state.identity(), Some(&wallet("GA2")));
}

#[test]
fn session_illegal_transitions_are_rejected() {
    let err = session_transition(&SessionState::Connecting, SessionAction::BeginConnect)
        .expect_err("must fail");
    assert!(err.to_string().contains("illegal session transition"));

    let err = session_transition(&SessionState::Connecting, SessionAction::Disconnect)
        .expect_err("must fail");
    assert_eq!(err.action, "Disconnect");

    let err = session_transition(&SessionState::Disconnected, SessionAction::Abort)
        .expect_err("must fail");
    assert_eq!(err.from, "Disconnected");
}
