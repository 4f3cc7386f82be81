use anyhow::{Context, Result};
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;

pub struct AuthResult {
    pub code: String,
    pub state: String,
}

/// Parses `code` and `state` out of the redirect request line
/// (`GET /login?code=...&state=... HTTP/1.1`).
pub fn parse_redirect(request: &str) -> Result<AuthResult> {
    let query = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|path| path.split_once('?').map(|(_, q)| q))
        .unwrap_or("");

    let params: HashMap<String, String> = query
        .split('&')
        .filter_map(|kv| {
            let (k, v) = kv.split_once('=')?;
            let v = urlencoding::decode(v).ok()?;
            Some((k.to_string(), v.into_owned()))
        })
        .collect();

    if let Some(err) = params.get("error") {
        anyhow::bail!("Spotify denied the authorization: {err}");
    }

    let code = params.get("code").context("No code in redirect")?.clone();
    let state = params.get("state").cloned().unwrap_or_default();
    Ok(AuthResult { code, state })
}

/// Waits for the Spotify redirect on the local listener.
pub async fn wait_for_auth_code(bind_addr: &str) -> Result<AuthResult> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr} for OAuth redirect"))?;

    info!("Waiting for Spotify auth redirect on {bind_addr} ...");

    let (mut stream, _) = listener.accept().await?;
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);
    let parsed = parse_redirect(&request);

    let body = match parsed {
        Ok(_) => CALLBACK_OK_PAGE,
        Err(_) => CALLBACK_FAILED_PAGE,
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    parsed
}

const CALLBACK_OK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body { background: #1f2937; color: #f35a4b; font-family: monospace;
           display: flex; align-items: center; justify-content: center; height: 100vh; margin: 0; }
    .card { text-align: center; border: 1px solid #f35a4b; padding: 40px; border-radius: 12px; }
    p { color: #d1d5db; }
  </style>
</head>
<body>
  <div class="card">
    <h1>melodot</h1>
    <p>Signed in. You can close this tab and return to your terminal.</p>
  </div>
</body>
</html>"#;

const CALLBACK_FAILED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body style="background:#1f2937;color:#d1d5db;font-family:monospace">
  <h1>melodot</h1>
  <p>Sign in did not complete. Check the terminal for details.</p>
</body>
</html>"#;
