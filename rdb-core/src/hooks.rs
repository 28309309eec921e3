//! Caller-owned hooks run around every execution

use std::fmt;
use std::time::Duration;

use tracing::Level;

use crate::builder::Operation;
use crate::{Error, Result};

/// What a hook wants done with the execution it observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    /// Stop with [`Error::UsageState`] carrying the reason
    Abort(String),
}

/// The statement about to run, or that just ran
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub operation: Operation,
    pub table: &'a str,
    pub sql: &'a str,
}

/// What an execution produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionSummary {
    /// Rows returned or affected
    pub row_count: u64,
    /// Ids generated by an insert, in row order
    pub inserted_ids: Vec<u64>,
    pub elapsed: Duration,
}

/// Observer of statement executions
pub trait QueryHook: Send + Sync {
    /// Called once the SQL is materialized, before the driver prepares it
    fn before_execute(&self, ctx: &QueryContext<'_>) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after the driver reported success
    fn after_execute(&self, ctx: &QueryContext<'_>, summary: &ExecutionSummary) -> HookAction {
        let _ = (ctx, summary);
        HookAction::Continue
    }
}

/// An ordered registry of hooks
#[derive(Default)]
pub struct Hooks {
    hooks: Vec<Box<dyn QueryHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn before_execute(&self, ctx: &QueryContext<'_>) -> Result<()> {
        for hook in &self.hooks {
            if let HookAction::Abort(reason) = hook.before_execute(ctx) {
                return Err(aborted(ctx, &reason));
            }
        }
        Ok(())
    }

    pub(crate) fn after_execute(&self, ctx: &QueryContext<'_>, summary: &ExecutionSummary) -> Result<()> {
        for hook in &self.hooks {
            if let HookAction::Abort(reason) = hook.after_execute(ctx, summary) {
                return Err(aborted(ctx, &reason));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.hooks.len()).finish()
    }
}

fn aborted(ctx: &QueryContext<'_>, reason: &str) -> Error {
    Error::usage(format!("{} on {} aborted by hook: {}", ctx.operation, ctx.table, reason))
}

/// Logs every executed statement through `tracing`
#[derive(Debug, Clone)]
pub struct TracingHook {
    pub level: Level,
    /// Longest SQL text logged, in bytes; `None` logs everything
    pub max_sql_length: Option<usize>,
}

impl Default for TracingHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}

macro_rules! event_at {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryHook for TracingHook {
    fn before_execute(&self, ctx: &QueryContext<'_>) -> HookAction {
        let sql = self.truncate(ctx.sql);
        event_at!(
            self.level,
            target: "rdb.sql",
            operation = %ctx.operation,
            table = ctx.table,
            sql = %sql,
            "executing"
        );
        HookAction::Continue
    }

    fn after_execute(&self, ctx: &QueryContext<'_>, summary: &ExecutionSummary) -> HookAction {
        event_at!(
            self.level,
            target: "rdb.sql",
            operation = %ctx.operation,
            table = ctx.table,
            rows = summary.row_count,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "executed"
        );
        HookAction::Continue
    }
}
