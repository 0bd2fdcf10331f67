//! Language-server client over a child process's stdio.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};

use crate::error::LspError;
use crate::jsonrpc::{IncomingMessage, Request, Response, read_message, write_message};
use crate::protocol::{SymbolInformation, decode_symbols, initialize_params};

type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// A JSON-RPC client for one language server.
///
/// Requests may be issued concurrently from several tasks; each waits on its
/// own `oneshot` channel keyed by request id.
pub struct LspClient {
    /// Writer half, shared with the reader task so it can answer server requests.
    writer: SharedWriter,
    /// Monotonically increasing request id counter.
    next_id: AtomicU64,
    /// Pending requests awaiting a response, keyed by request id.
    pending: PendingMap,
    /// Set once the reader task has stopped; no response can arrive after that.
    closed: Arc<AtomicBool>,
    /// The server process, held only so it is killed when the client drops.
    _child: Option<Child>,
}

impl LspClient {
    /// Build a client over an arbitrary transport and start the reader task.
    ///
    /// Responses are routed to their pending requests. Requests coming from
    /// the server are answered immediately so the server never blocks on us.
    pub fn from_transport<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: SharedWriter = Arc::new(Mutex::new(Box::new(writer)));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader_pending = Arc::clone(&pending);
        let reader_closed = Arc::clone(&closed);
        let reader_writer = Arc::clone(&writer);
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            loop {
                let body = match read_message(&mut reader).await {
                    Ok(Some(body)) => body,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("LSP: error reading from server: {e}");
                        break;
                    }
                };

                let msg: IncomingMessage = match serde_json::from_str(&body) {
                    Ok(m) => m,
                    Err(e) => {
                        log::error!("LSP: failed to parse message: {e}");
                        continue;
                    }
                };

                if msg.is_response() {
                    let Some(id) = msg.id.as_ref().and_then(Value::as_u64) else {
                        log::error!("LSP: response with non-numeric id: {body}");
                        continue;
                    };
                    let mut map = reader_pending.lock().await;
                    if let Some(tx) = map.remove(&id) {
                        let _ = tx.send(msg.into_response());
                    } else {
                        log::error!("LSP: response for unknown request id {id}");
                    }
                } else if msg.is_server_request() {
                    let response = answer_server_request(&msg);
                    let mut w = reader_writer.lock().await;
                    if let Err(e) = write_message(&mut *w, &response).await {
                        log::error!("LSP: failed to answer server request: {e}");
                        break;
                    }
                } else if let Some(method) = msg.method.as_deref() {
                    log_notification(method, msg.params.as_ref());
                }
            }

            // Mark closed before clearing so a request registered after the
            // clear sees the flag. Dropping the senders wakes every waiter.
            reader_closed.store(true, Ordering::SeqCst);
            reader_pending.lock().await.clear();
            log::info!("LSP: server output closed");
        });

        Self {
            writer,
            next_id: AtomicU64::new(1),
            pending,
            closed,
            _child: None,
        }
    }

    /// Spawn a server from its run command and complete the `initialize`
    /// handshake rooted at `root`.
    pub async fn spawn(
        command: &str,
        env: &HashMap<String, String>,
        root: &Path,
    ) -> Result<Self, LspError> {
        let argv = shell_words::split(command).map_err(|e| LspError::InvalidCommand {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
        let (program, args) = argv.split_first().ok_or_else(|| LspError::InvalidCommand {
            command: command.to_string(),
            reason: "empty command".to_string(),
        })?;

        log::info!("LSP: spawning '{command}' in {}", root.display());
        let mut child = Command::new(program)
            .args(args)
            .envs(env)
            .current_dir(root)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LspError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(LspError::Closed)?;
        let stdout = child.stdout.take().ok_or(LspError::Closed)?;

        if let Some(stderr) = child.stderr.take() {
            let label = program.clone();
            tokio::spawn(async move {
                use tokio::io::AsyncBufReadExt;
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        log::debug!("LSP [{label}] stderr: {trimmed}");
                    }
                }
            });
        }

        let mut client = Self::from_transport(stdout, stdin);
        client._child = Some(child);
        client.initialize(root).await?;
        Ok(client)
    }

    /// Run the `initialize` request followed by the `initialized` notification.
    pub async fn initialize(&self, root: &Path) -> Result<Value, LspError> {
        log::info!("LSP: sending initialize");
        let result = self
            .request("initialize", Some(initialize_params(root)))
            .await?;
        self.notify("initialized", Some(serde_json::json!({})))
            .await?;
        log::info!("LSP: initialize succeeded");
        Ok(result)
    }

    /// Send a request and wait for its result.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, LspError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = Request {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: Some(id),
        };

        let (tx, rx) = oneshot::channel::<Response>();
        // Register before writing so a fast reply cannot race the insert.
        self.pending.lock().await.insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.pending.lock().await.remove(&id);
            return Err(LspError::Closed);
        }

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = write_message(&mut *writer, &req).await {
                self.pending.lock().await.remove(&id);
                return Err(e);
            }
        }

        let response = rx.await.map_err(|_| LspError::Closed)?;
        if let Some(err) = response.error {
            return Err(LspError::Rpc(err));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a notification (no id, no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), LspError> {
        let req = Request {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: None,
        };
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, &req).await
    }

    /// `workspace/symbol` search.
    pub async fn workspace_symbol(&self, query: &str) -> Result<Vec<SymbolInformation>, LspError> {
        let result = self
            .request(
                "workspace/symbol",
                Some(serde_json::json!({ "query": query })),
            )
            .await?;
        Ok(decode_symbols(result))
    }

    /// Whether the server's output has closed; every later request fails.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Default answers for requests a server may send to its client.
fn answer_server_request(msg: &IncomingMessage) -> Response {
    let method = msg.method.as_deref().unwrap_or_default();
    let result = match method {
        // One (null) setting per requested item.
        "workspace/configuration" => {
            let count = msg
                .params
                .as_ref()
                .and_then(|p| p.get("items"))
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Value::Array(vec![Value::Null; count])
        }
        _ => Value::Null,
    };
    log::debug!("LSP: answering server request '{method}'");
    Response {
        jsonrpc: "2.0".to_string(),
        result: Some(result),
        error: None,
        id: msg.id.clone().unwrap_or(Value::Null),
    }
}

fn log_notification(method: &str, params: Option<&Value>) {
    let message = params
        .and_then(|p| p.get("message"))
        .and_then(Value::as_str);
    match (method, message) {
        ("window/logMessage" | "window/showMessage", Some(text)) => {
            log::debug!("LSP: {text}");
        }
        _ => log::trace!("LSP: ignoring notification '{method}'"),
    }
}
