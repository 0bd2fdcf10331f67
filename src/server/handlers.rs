//! Method dispatch for the stdio server.
//!
//! Each editing context (identified by the `context` param) gets its own
//! [`Session`], created on first use and dropped by `close`. All sessions
//! share one resolver and therefore one resolution cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use stacknav_config::{DeobfuscatorConfig, Severity};

use super::jsonrpc::{COMMAND_FAILED, INVALID_PARAMS, METHOD_NOT_FOUND, RpcError};
use crate::context::{BufferContext, NoPrompt, SourceSelector};
use crate::deobfuscate::Deobfuscator;
use crate::error::TraceError;
use crate::resolver::Resolver;
use crate::session::Session;
use crate::sinks::{JumpTarget, PickList, RecordingJumpSink};

pub const DEFAULT_CONTEXT: &str = "default";

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContextParams {
    #[serde(default = "default_context")]
    context: String,
}

#[derive(Debug, Deserialize)]
struct LoadParams {
    #[serde(default = "default_context")]
    context: String,
    /// Selector token: empty for the cursor, one char for a register,
    /// anything longer is trace text.
    #[serde(default)]
    from: Option<String>,
    /// Buffer contents for cursor loads.
    #[serde(default)]
    lines: Vec<String>,
    /// 1-based cursor line in `lines`.
    #[serde(default = "one")]
    cursor_line: usize,
    #[serde(default)]
    registers: HashMap<String, String>,
}

fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct GotoParams {
    #[serde(default = "default_context")]
    context: String,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PickParams {
    #[serde(default = "default_context")]
    context: String,
    /// 0-based position in the last pick list built for this context.
    position: usize,
}

#[derive(Debug, Deserialize)]
struct DeobfuscateParams {
    #[serde(default = "default_context")]
    context: String,
    #[serde(default)]
    mapping: Option<PathBuf>,
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn command_failed(error: TraceError) -> RpcError {
    RpcError::new(COMMAND_FAILED, error.to_string())
}

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

struct ContextState {
    session: Session,
    last_pick_list: Option<PickList>,
}

pub struct Handlers {
    contexts: HashMap<String, ContextState>,
    resolver: Arc<Resolver>,
    deobfuscator: DeobfuscatorConfig,
    severity: Severity,
}

impl Handlers {
    pub fn new(resolver: Arc<Resolver>, deobfuscator: DeobfuscatorConfig, severity: Severity) -> Self {
        Self {
            contexts: HashMap::new(),
            resolver,
            deobfuscator,
            severity,
        }
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// An existing context. Commands other than `load` never create one.
    fn context(&mut self, id: &str) -> Result<&mut ContextState, RpcError> {
        self.contexts
            .get_mut(id)
            .ok_or_else(|| command_failed(TraceError::NoTraceLoaded))
    }

    fn context_or_insert(&mut self, id: &str) -> &mut ContextState {
        if !self.contexts.contains_key(id) {
            log::info!("Creating session for context '{id}'");
        }
        self.contexts
            .entry(id.to_string())
            .or_insert_with(|| ContextState {
                session: Session::new(
                    Arc::clone(&self.resolver),
                    Deobfuscator::new(&self.deobfuscator),
                    self.severity,
                ),
                last_pick_list: None,
            })
    }

    /// Dispatch one request.
    pub async fn handle(&mut self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            "load" => self.load(parse_params(params)?),
            "top" | "bottom" | "up" | "down" => {
                let ContextParams { context } = parse_params(params)?;
                self.navigate(&context, method).await
            }
            "goto" => self.goto(parse_params(params)?).await,
            "quickfix" => {
                let ContextParams { context } = parse_params(params)?;
                let items = self
                    .context(&context)?
                    .session
                    .diagnostics()
                    .await
                    .map_err(command_failed)?;
                Ok(json!({ "items": items }))
            }
            "picklist" => {
                let ContextParams { context } = parse_params(params)?;
                let state = self.context(&context)?;
                let list = state.session.pick_list().await.map_err(command_failed)?;
                state.last_pick_list = Some(list.clone());
                Ok(json!(list))
            }
            "pick" => self.pick(parse_params(params)?),
            "deobfuscate" => self.deobfuscate(parse_params(params)?).await,
            "serialize" => {
                let ContextParams { context } = parse_params(params)?;
                let text = self
                    .context(&context)?
                    .session
                    .serialize()
                    .map_err(command_failed)?;
                Ok(json!({ "text": text }))
            }
            "close" => {
                let ContextParams { context } = parse_params(params)?;
                let closed = self.contexts.remove(&context).is_some();
                log::info!("Closed context '{context}' (existed: {closed})");
                Ok(json!({ "closed": closed }))
            }
            _ => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        }
    }

    fn load(&mut self, params: LoadParams) -> Result<Value, RpcError> {
        let mut ctx = BufferContext::from_lines(params.lines, params.cursor_line);
        for (name, contents) in params.registers {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => ctx = ctx.with_register(c, contents),
                _ => {
                    return Err(RpcError::new(
                        INVALID_PARAMS,
                        format!("Register name must be one character: '{name}'"),
                    ));
                }
            }
        }
        let selector = SourceSelector::parse(params.from.as_deref());
        let state = self.context_or_insert(&params.context);
        state.session.load(&selector, &ctx).map_err(command_failed)?;
        state.last_pick_list = None;
        Ok(state_summary(&state.session))
    }

    async fn navigate(&mut self, context: &str, method: &str) -> Result<Value, RpcError> {
        let session = &mut self.context(context)?.session;
        let mut jump = RecordingJumpSink::default();
        let target = match method {
            "top" => Some(session.goto_top(&mut jump).await),
            "bottom" => Some(session.goto_bottom(&mut jump).await),
            "up" => session.step_up(&mut jump).await.transpose(),
            _ => session.step_down(&mut jump).await.transpose(),
        };
        jump_result(session, target)
    }

    async fn goto(&mut self, params: GotoParams) -> Result<Value, RpcError> {
        let session = &mut self.context(&params.context)?.session;
        let mut jump = RecordingJumpSink::default();
        let target = session.goto_index(params.index, &NoPrompt, &mut jump).await;
        jump_result(session, Some(target))
    }

    fn pick(&mut self, params: PickParams) -> Result<Value, RpcError> {
        let state = self.context(&params.context)?;
        let list = state
            .last_pick_list
            .clone()
            .ok_or_else(|| RpcError::new(COMMAND_FAILED, "no pick list has been built"))?;
        let item = list.items.get(params.position).ok_or_else(|| {
            RpcError::new(
                INVALID_PARAMS,
                format!(
                    "pick position {} out of range (0..{})",
                    params.position,
                    list.items.len()
                ),
            )
        })?;
        let mut jump = RecordingJumpSink::default();
        let target = state.session.pick(&list, item, &mut jump);
        jump_result(&state.session, Some(Ok(target)))
    }

    async fn deobfuscate(&mut self, params: DeobfuscateParams) -> Result<Value, RpcError> {
        let state = self.context(&params.context)?;
        state
            .session
            .deobfuscate(params.mapping.as_deref(), &NoPrompt)
            .await
            .map_err(command_failed)?;
        state.last_pick_list = None;
        Ok(state_summary(&state.session))
    }
}

/// `{count, cursor, frames}` for the loaded trace.
fn state_summary(session: &Session) -> Value {
    let navigator = session.navigator();
    let frames: Vec<String> = navigator
        .sequence()
        .map(|seq| seq.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    json!({
        "count": frames.len(),
        "cursor": navigator.cursor().ok(),
        "frames": frames,
    })
}

/// `{cursor, target}`; `target` is null when a step was already at the boundary.
fn jump_result(
    session: &Session,
    target: Option<Result<JumpTarget, TraceError>>,
) -> Result<Value, RpcError> {
    let target = target.transpose().map_err(command_failed)?;
    Ok(json!({
        "cursor": session.navigator().cursor().ok(),
        "target": target,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handlers() -> Handlers {
        Handlers::new(
            Arc::new(Resolver::new(Vec::new())),
            DeobfuscatorConfig::default(),
            Severity::Error,
        )
    }

    const TRACE: &str = "java.lang.IllegalStateException: boom\n\tat a.B.c(B.java:3)\n\tat a.D.e(D.java:4)\n";

    #[tokio::test]
    async fn test_load_text_and_serialize() {
        let mut h = handlers();
        let loaded = h
            .handle("load", Some(json!({"context": "w1", "from": TRACE})))
            .await
            .unwrap();
        assert_eq!(loaded["count"], 2);
        assert_eq!(loaded["cursor"], 1);
        let text = h
            .handle("serialize", Some(json!({"context": "w1"})))
            .await
            .unwrap();
        assert_eq!(text["text"], "at a.B.c(B.java:3)\nat a.D.e(D.java:4)\n");
    }

    #[tokio::test]
    async fn test_contexts_are_independent() {
        let mut h = handlers();
        h.handle("load", Some(json!({"context": "w1", "from": TRACE})))
            .await
            .unwrap();
        let err = h
            .handle("serialize", Some(json!({"context": "w2"})))
            .await
            .unwrap_err();
        assert_eq!(err.code, COMMAND_FAILED);
        assert_eq!(err.message, "no stack trace loaded");
        assert_eq!(h.context_count(), 1);
        let closed = h.handle("close", Some(json!({"context": "w2"}))).await.unwrap();
        assert_eq!(closed["closed"], false);
        let closed = h.handle("close", Some(json!({"context": "w1"}))).await.unwrap();
        assert_eq!(closed["closed"], true);
        assert_eq!(h.context_count(), 0);
    }

    #[tokio::test]
    async fn test_commands_on_unknown_context_create_nothing() {
        let mut h = handlers();
        for method in ["top", "down", "quickfix", "picklist", "serialize", "deobfuscate"] {
            let err = h
                .handle(method, Some(json!({"context": "ghost", "mapping": "/tmp/m.txt"})))
                .await
                .unwrap_err();
            assert_eq!(err.code, COMMAND_FAILED, "{method}");
            assert_eq!(err.message, "no stack trace loaded", "{method}");
        }
        let err = h
            .handle("goto", Some(json!({"context": "ghost", "index": 1})))
            .await
            .unwrap_err();
        assert_eq!(err.message, "no stack trace loaded");
        assert_eq!(h.context_count(), 0);
    }

    #[tokio::test]
    async fn test_cursor_load_with_lines() {
        let mut h = handlers();
        let lines: Vec<&str> = TRACE.lines().collect();
        let loaded = h
            .handle("load", Some(json!({"lines": lines, "cursor_line": 3})))
            .await
            .unwrap();
        assert_eq!(loaded["cursor"], 2);
    }

    #[tokio::test]
    async fn test_register_load() {
        let mut h = handlers();
        let loaded = h
            .handle("load", Some(json!({"from": "a", "registers": {"a": TRACE}})))
            .await
            .unwrap();
        assert_eq!(loaded["count"], 2);
        let err = h
            .handle("load", Some(json!({"from": "q"})))
            .await
            .unwrap_err();
        assert_eq!(err.message, "register 'q' is empty or unavailable");
    }

    #[tokio::test]
    async fn test_failed_jump_keeps_cursor() {
        let mut h = handlers();
        h.handle("load", Some(json!({"from": TRACE}))).await.unwrap();
        let err = h.handle("top", None).await.unwrap_err();
        assert_eq!(err.code, COMMAND_FAILED);
        assert_eq!(
            err.message,
            "no Java language server is available to resolve classes"
        );
        // The cursor moved to the top before the lookup failed, so the next
        // step up is a no-op.
        let step = h.handle("up", None).await.unwrap();
        assert_eq!(step["cursor"], 2);
        assert!(step["target"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_params() {
        let mut h = handlers();
        let err = h.handle("frobnicate", None).await.unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        let err = h
            .handle("goto", Some(json!({"index": "three"})))
            .await
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        let err = h.handle("pick", Some(json!({}))).await.unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }
}
