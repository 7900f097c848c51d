//! One-Shot OAuth Callback Listener
//!
//! During interactive sign-in the provider redirects the browser to
//! `http://localhost:<port>/oauth_callback` with the authorization code.
//! This module binds an ephemeral localhost port, blocks for exactly one
//! code (or provider error), and shuts down on every exit path: the
//! listener is consumed by [`CallbackServer::wait_for_callback`] and dropped
//! when it returns.

use crate::error::{AuthError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

/// Redirect path registered with the provider
pub const CALLBACK_PATH: &str = "/oauth_callback";

/// Maximum accepted request size; callbacks are a single short GET
const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Parameters delivered by the provider redirect.
#[derive(Debug, Clone)]
pub struct AuthCallback {
    /// The authorization code to exchange for tokens
    pub code: String,
    /// The state parameter echoed back by the provider
    pub state: String,
}

/// Local listener for the OAuth redirect.
pub struct CallbackServer {
    listener: TcpListener,
    port: u16,
}

impl CallbackServer {
    /// Bind an ephemeral port on the loopback interface.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        debug!(port, "Callback listener bound");
        Ok(Self { listener, port })
    }

    /// The port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The redirect URI to register in the authorization request.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.port, CALLBACK_PATH)
    }

    /// Block until one authorization code (or provider error) arrives.
    ///
    /// Requests for other paths (such as favicon probes) are answered and
    /// ignored. Consumes the server so the socket is released on return.
    pub async fn wait_for_callback(self) -> Result<AuthCallback> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "Callback connection accepted");

            match handle_connection(stream).await {
                Ok(Some(callback)) => return Ok(callback),
                Ok(None) => continue,
                Err(AuthError::Io(e)) => {
                    // A broken connection is not a failed authorization
                    warn!(error = %e, "Callback connection error, still waiting");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Serve one connection; `Ok(Some)` when it carried the authorization code.
async fn handle_connection(mut stream: TcpStream) -> Result<Option<AuthCallback>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        if buf.len() >= MAX_REQUEST_BYTES {
            respond(&mut stream, 413, "Request too large").await?;
            return Ok(None);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    if method != "GET" {
        respond(&mut stream, 405, "Method not allowed").await?;
        return Ok(None);
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };

    if path != CALLBACK_PATH {
        respond(&mut stream, 404, "Not found").await?;
        return Ok(None);
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(code) = code {
        respond(&mut stream, 200, "Successfully authorized app.").await?;
        return Ok(Some(AuthCallback {
            code,
            state: state.unwrap_or_default(),
        }));
    }

    if let Some(error) = error {
        respond(&mut stream, 200, &format!("OAuth error: {}", error)).await?;
        return Err(AuthError::AuthorizationFailed(error));
    }

    respond(&mut stream, 200, "Unknown parameters for callback").await?;
    Ok(None)
}

async fn respond(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn send_request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_receives_authorization_code() {
        let server = CallbackServer::bind().await.unwrap();
        let port = server.port();

        let waiter = tokio::spawn(server.wait_for_callback());

        let response = send_request(port, "/oauth_callback?code=abc123&state=xyz").await;
        assert!(response.contains("200"));
        assert!(response.contains("Successfully authorized"));

        let callback = waiter.await.unwrap().unwrap();
        assert_eq!(callback.code, "abc123");
        assert_eq!(callback.state, "xyz");
    }

    #[tokio::test]
    async fn test_provider_error_fails_the_wait() {
        let server = CallbackServer::bind().await.unwrap();
        let port = server.port();

        let waiter = tokio::spawn(server.wait_for_callback());

        let response = send_request(port, "/oauth_callback?error=access_denied").await;
        assert!(response.contains("OAuth error: access_denied"));

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(AuthError::AuthorizationFailed(_))));
    }

    #[tokio::test]
    async fn test_ignores_unrelated_paths() {
        let server = CallbackServer::bind().await.unwrap();
        let port = server.port();

        let waiter = tokio::spawn(server.wait_for_callback());

        let response = send_request(port, "/favicon.ico").await;
        assert!(response.contains("404"));

        // The listener keeps waiting and still accepts the real callback
        let response = send_request(port, "/oauth_callback?code=later&state=s").await;
        assert!(response.contains("200"));

        let callback = waiter.await.unwrap().unwrap();
        assert_eq!(callback.code, "later");
    }

    #[tokio::test]
    async fn test_redirect_uri_shape() {
        let server = CallbackServer::bind().await.unwrap();
        let uri = server.redirect_uri();
        assert!(uri.starts_with("http://localhost:"));
        assert!(uri.ends_with("/oauth_callback"));
    }
}
