//! Socket availability guard for wiremock-backed integration tests.
//!
//! Some sandboxes forbid binding localhost. Tests then skip unless
//! `FINSIGHT_REQUIRE_SOCKET_TESTS` is truthy, in which case they fail loudly.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "FINSIGHT_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or `None` when the test should be skipped.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    assert!(
        !sockets_required(),
        "[socket-bound-test] localhost sockets unavailable but {REQUIRE_SOCKETS_ENV} is set"
    );
    eprintln!("[socket-bound-test] localhost sockets unavailable; skipping");
    None
}

/// A localhost URL nothing is listening on.
#[allow(dead_code)]
#[must_use]
pub fn closed_port_url() -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").ok()?;
    let port = listener.local_addr().ok()?.port();
    drop(listener);
    Some(format!("http://127.0.0.1:{port}/filing.pdf"))
}
