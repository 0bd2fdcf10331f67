//! Command session: one navigator per editing context plus the commands a
//! host binds to keys or RPC methods.
//!
//! Each command runs to completion before the next one starts. The only
//! suspension points are provider queries, the deobfuscation filter and
//! interactive prompts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stacknav_config::Severity;

use crate::context::{EditorContext, Prompter, SourceSelector};
use crate::deobfuscate::Deobfuscator;
use crate::error::{Result, TraceError};
use crate::navigator::{Navigator, Step};
use crate::resolver::Resolver;
use crate::sinks::{
    DiagnosticItem, DiagnosticsSink, JumpSink, JumpTarget, PickItem, PickList, distinct_frames,
};
use crate::trace::{Assembly, Frame, TextLines, assemble_around, assemble_text};

pub struct Session {
    navigator: Navigator,
    resolver: Arc<Resolver>,
    deobfuscator: Deobfuscator,
    severity: Severity,
}

impl Session {
    pub fn new(resolver: Arc<Resolver>, deobfuscator: Deobfuscator, severity: Severity) -> Self {
        Self {
            navigator: Navigator::new(),
            resolver,
            deobfuscator,
            severity,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load from the source `selector` names. Returns the frame count.
    ///
    /// On failure the previously loaded trace, if any, is kept.
    pub fn load(&mut self, selector: &SourceSelector, ctx: &dyn EditorContext) -> Result<usize> {
        let assembly = match selector {
            SourceSelector::Cursor => assemble_around(ctx.buffer(), ctx.cursor_line()),
            SourceSelector::Register(name) => {
                let contents = ctx
                    .register(*name)
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(TraceError::UnknownRegister(*name))?;
                assemble_text(&TextLines::new(&contents))
            }
            SourceSelector::Text(text) => assemble_text(&TextLines::new(text)),
        }
        .inspect_err(|e| log::warn!("Loading stack trace from {selector:?} failed: {e}"))?;
        Ok(self.install(assembly))
    }

    pub fn load_text(&mut self, text: &str) -> Result<usize> {
        let assembly = assemble_text(&TextLines::new(text))
            .inspect_err(|e| log::warn!("Loading stack trace from text failed: {e}"))?;
        Ok(self.install(assembly))
    }

    fn install(&mut self, assembly: Assembly) -> usize {
        let len = assembly.frames.len();
        self.navigator
            .load(assembly.frames, assembly.cursor.unwrap_or(1));
        len
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub async fn goto_top(&mut self, jump: &mut dyn JumpSink) -> Result<JumpTarget> {
        self.navigator.goto_top()?;
        self.jump_to_current(jump).await
    }

    pub async fn goto_bottom(&mut self, jump: &mut dyn JumpSink) -> Result<JumpTarget> {
        self.navigator.goto_bottom()?;
        self.jump_to_current(jump).await
    }

    /// One frame toward the outermost call. `None` when already there.
    pub async fn step_up(&mut self, jump: &mut dyn JumpSink) -> Result<Option<JumpTarget>> {
        match self.navigator.step_toward_top()? {
            Step::Moved => self.jump_to_current(jump).await.map(Some),
            Step::AtBoundary => Ok(None),
        }
    }

    /// One frame toward the innermost call. `None` when already there.
    pub async fn step_down(&mut self, jump: &mut dyn JumpSink) -> Result<Option<JumpTarget>> {
        match self.navigator.step_toward_bottom()? {
            Step::Moved => self.jump_to_current(jump).await.map(Some),
            Step::AtBoundary => Ok(None),
        }
    }

    /// Jump to frame `index`, prompting for it when absent.
    pub async fn goto_index(
        &mut self,
        index: Option<usize>,
        prompter: &dyn Prompter,
        jump: &mut dyn JumpSink,
    ) -> Result<JumpTarget> {
        let len = self.navigator.sequence()?.len();
        let index = match index {
            Some(index) => index,
            None => {
                let answer = prompter
                    .input(&format!("Frame index (1-{len})"))
                    .await
                    .ok_or(TraceError::Cancelled)?;
                let answer = answer.trim();
                answer
                    .parse::<usize>()
                    .map_err(|_| TraceError::InvalidIndex(answer.to_string()))?
            }
        };
        self.navigator.goto_index(index)?;
        self.jump_to_current(jump).await
    }

    /// Resolve the frame under the cursor and jump to it. A resolution
    /// failure leaves the cursor where the navigation put it.
    async fn jump_to_current(&self, jump: &mut dyn JumpSink) -> Result<JumpTarget> {
        let frame = self.navigator.current()?.clone();
        let path = self.resolver.resolve(&frame).await.inspect_err(|e| {
            log::warn!("Cannot jump to {frame}: {e}");
        })?;
        jump.go_to(&path, frame.line_number);
        Ok(JumpTarget {
            path,
            line: frame.line_number,
        })
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Resolve every distinct frame in sequence order, dropping frames that
    /// do not resolve. Lookups run one after another so repeated classes
    /// hit the cache.
    async fn resolve_distinct(&self) -> Result<Vec<(usize, Frame, PathBuf)>> {
        let sequence = self.navigator.sequence()?;
        let mut resolved = Vec::new();
        for (index, frame) in distinct_frames(sequence) {
            match self.resolver.resolve(frame).await {
                Ok(path) => resolved.push((index, frame.clone(), path)),
                Err(e) => log::warn!("Omitting frame {index} ({frame}) from export: {e}"),
            }
        }
        if resolved.is_empty() {
            return Err(TraceError::EmptyExport);
        }
        Ok(resolved)
    }

    /// Diagnostics-list entries for every distinct resolvable frame.
    pub async fn diagnostics(&self) -> Result<Vec<DiagnosticItem>> {
        Ok(self
            .resolve_distinct()
            .await?
            .into_iter()
            .map(|(_, frame, path)| DiagnosticItem::new(&frame, path, self.severity))
            .collect())
    }

    /// Publish [`diagnostics`](Self::diagnostics) to `sink`. Returns the
    /// number of entries.
    pub async fn export_diagnostics(&self, sink: &mut dyn DiagnosticsSink) -> Result<usize> {
        let items = self.diagnostics().await?;
        sink.publish(&items);
        Ok(items.len())
    }

    /// Pick-list entries for every distinct resolvable frame.
    pub async fn pick_list(&self) -> Result<PickList> {
        let items = self
            .resolve_distinct()
            .await?
            .into_iter()
            .map(|(index, frame, path)| PickItem::new(index, &frame, path))
            .collect();
        Ok(PickList {
            generation: self.navigator.generation(),
            items,
        })
    }

    /// Jump to `item`. When the list was built from the trace that is still
    /// loaded, the cursor moves to the item's frame.
    pub fn pick(
        &mut self,
        list: &PickList,
        item: &PickItem,
        jump: &mut dyn JumpSink,
    ) -> JumpTarget {
        if list.generation == self.navigator.generation() {
            if let Err(e) = self.navigator.goto_index(item.index) {
                log::error!("Pick list item {} no longer in range: {e}", item.index);
            }
        } else {
            log::debug!("Pick list is stale; cursor not moved");
        }
        jump.go_to(&item.path, item.line);
        JumpTarget::from(item)
    }

    /// Build the pick list, let the user choose, and jump.
    pub async fn pick_interactive(
        &mut self,
        prompter: &dyn Prompter,
        jump: &mut dyn JumpSink,
    ) -> Result<JumpTarget> {
        let list = self.pick_list().await?;
        let choice = prompter
            .select("Stack trace", &list.labels())
            .await
            .ok_or(TraceError::Cancelled)?;
        let item = list
            .items
            .get(choice)
            .ok_or(TraceError::Cancelled)?
            .clone();
        Ok(self.pick(&list, &item, jump))
    }

    /// The loaded trace in canonical form.
    pub fn serialize(&self) -> Result<String> {
        Ok(self.navigator.sequence()?.serialize())
    }

    // -----------------------------------------------------------------------
    // Deobfuscation
    // -----------------------------------------------------------------------

    /// Replace the loaded trace with its deobfuscated form. Prompts for the
    /// mapping file when `mapping` is absent. Returns the new frame count.
    ///
    /// The cursor is kept when the frame count is unchanged and reset to 1
    /// otherwise. On failure the obfuscated trace stays loaded.
    pub async fn deobfuscate(
        &mut self,
        mapping: Option<&Path>,
        prompter: &dyn Prompter,
    ) -> Result<usize> {
        let sequence = self.navigator.sequence()?.clone();
        let cursor = self.navigator.cursor()?;
        let mapping = match mapping {
            Some(path) => path.to_path_buf(),
            None => prompter
                .pick_file("Mapping file")
                .await
                .ok_or(TraceError::Cancelled)?,
        };

        let result = self
            .deobfuscator
            .deobfuscate(&sequence, &mapping)
            .await
            .inspect_err(|e| log::warn!("Deobfuscation with {} failed: {e}", mapping.display()))?;
        let cursor = if result.count_changed { 1 } else { cursor };
        let len = result.frames.len();
        self.navigator.load(result.frames, cursor);
        Ok(len)
    }
}
