//! Helpers shared by unit tests.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "FINSIGHT_REQUIRE_SOCKET_TESTS";

/// Starts a wiremock server, or returns `None` when localhost sockets are
/// unavailable. With `FINSIGHT_REQUIRE_SOCKET_TESTS=1` the skip panics.
pub(crate) async fn mock_server() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }

    let required = std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    assert!(
        !required,
        "localhost sockets unavailable and {REQUIRE_SOCKETS_ENV} is set"
    );
    eprintln!("[socket-bound-test] localhost sockets unavailable; skipping");
    None
}
