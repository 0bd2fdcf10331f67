//! Line-delimited JSON-RPC 2.0 server over stdio.
//!
//! One request per line on stdin, one response per line on stdout.
//! Requests are handled strictly in order. Notifications (no `id`) are
//! executed but never answered. Logging goes to the debug log, never stdout.

pub mod handlers;
pub mod jsonrpc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub use handlers::{DEFAULT_CONTEXT, Handlers};
use jsonrpc::{
    IncomingMessage, encode_response, error_response, invalid_request, parse_error,
    success_response,
};

/// Serve on the process's stdin/stdout until stdin closes.
pub async fn run_stdio(handlers: Handlers) -> std::io::Result<()> {
    log::info!("Starting stacknav server v{}", crate::VERSION);
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(handlers, stdin, stdout).await
}

/// Serve requests read from `reader`, writing responses to `writer`.
pub async fn serve<R, W>(mut handlers: Handlers, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        log::debug!("<- {trimmed}");

        let msg: IncomingMessage = match serde_json::from_str(trimmed) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Parse error: {e}");
                send_response(&mut writer, &parse_error()).await?;
                continue;
            }
        };

        if msg.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            log::warn!("Unexpected jsonrpc version {:?}", msg.jsonrpc);
        }

        let Some(method) = msg.method else {
            match msg.id {
                Some(id) => send_response(&mut writer, &invalid_request(id)).await?,
                None => log::warn!("Ignoring message without method or id"),
            }
            continue;
        };

        let result = handlers.handle(&method, msg.params).await;

        let Some(id) = msg.id else {
            match result {
                Ok(_) => log::debug!("Notification '{method}' handled"),
                Err(e) => log::warn!("Notification '{method}' failed: {}", e.message),
            }
            continue;
        };

        let response = match result {
            Ok(value) => success_response(id, value),
            Err(e) => {
                log::info!("Request '{method}' failed: {}", e.message);
                error_response(id, e)
            }
        };
        send_response(&mut writer, &response).await?;
    }

    log::info!("stdin closed, exiting");
    Ok(())
}

async fn send_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &jsonrpc::Response,
) -> std::io::Result<()> {
    let Some(json) = encode_response(response) else {
        return Ok(());
    };
    log::debug!("-> {json}");
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
