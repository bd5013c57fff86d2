//! Command pipeline.
//!
//! A pipeline runs an ordered list of stages over one command. Every stage sees the same
//! [`ReconcileContext`], which borrows the caller's command: stages never receive a copy, so
//! `std::ptr::eq(context.command, &command)` holds for every stage.
//!
//! [`dispatch_document_command`] composes the standard five-stage document pipeline:
//!
//! ```text
//! normalise → apply → reconcile → persist → broadcast
//! ```
//!
//! Only `apply` produces a value; the hook stages observe the command and are no-ops unless a
//! hook is installed.
//!
//! # Example
//!
//! ```rust
//! use kea_core::{DocumentCommand, DocumentCommandHooks, DocumentCommandKind, dispatch_document_command};
//!
//! let command = DocumentCommand::local(DocumentCommandKind::UpdateContent);
//! let mut hooks = DocumentCommandHooks::default();
//! hooks.broadcast = Some(Box::new(|cmd| println!("applied {}", cmd)));
//!
//! let result = dispatch_document_command(&command, || 42, Some(&mut hooks));
//! assert_eq!(result, 42);
//! ```

use crate::command::DocumentCommand;
use std::convert::Infallible;

/// State shared by every stage of one pipeline run.
#[derive(Debug)]
pub struct ReconcileContext<'c, C> {
    /// The command being processed (the caller's value, by reference).
    pub command: &'c C,
}

impl<C> Clone for ReconcileContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ReconcileContext<'_, C> {}

/// A single pipeline stage.
pub type ReconcileStage<'s, 'c, C, E> =
    &'s mut dyn FnMut(&ReconcileContext<'c, C>) -> Result<(), E>;

/// Run `stages` in order over `command`.
///
/// The first stage returning `Err` aborts the run; remaining stages are skipped and the error is
/// returned unchanged.
pub fn run_reconcile_pipeline<'c, C, E>(
    command: &'c C,
    stages: &mut [ReconcileStage<'_, 'c, C, E>],
) -> Result<ReconcileContext<'c, C>, E> {
    let context = ReconcileContext { command };
    for stage in stages.iter_mut() {
        stage(&context)?;
    }
    Ok(context)
}

/// The five stages of [`dispatch_document_command`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Runs before the mutation.
    Normalise,
    /// The mutation itself.
    Apply,
    /// Runs after the mutation.
    Reconcile,
    /// Persistence side effects.
    Persist,
    /// Notification of other consumers.
    Broadcast,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ORDER: [PipelineStage; 5] = [
        PipelineStage::Normalise,
        PipelineStage::Apply,
        PipelineStage::Reconcile,
        PipelineStage::Persist,
        PipelineStage::Broadcast,
    ];

    /// Lowercase stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalise => "normalise",
            Self::Apply => "apply",
            Self::Reconcile => "reconcile",
            Self::Persist => "persist",
            Self::Broadcast => "broadcast",
        }
    }
}

/// Hook callback type.
pub type CommandHook = Box<dyn FnMut(&DocumentCommand) + Send>;

/// Optional observers for the non-apply stages of the document pipeline.
#[derive(Default)]
pub struct DocumentCommandHooks {
    /// Called before `apply`.
    pub normalise: Option<CommandHook>,
    /// Called after `apply`.
    pub reconcile: Option<CommandHook>,
    /// Called after `reconcile`.
    pub persist: Option<CommandHook>,
    /// Called last.
    pub broadcast: Option<CommandHook>,
}

impl DocumentCommandHooks {
    /// Returns `true` if no hook is installed.
    pub fn is_empty(&self) -> bool {
        self.normalise.is_none()
            && self.reconcile.is_none()
            && self.persist.is_none()
            && self.broadcast.is_none()
    }
}

impl std::fmt::Debug for DocumentCommandHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCommandHooks")
            .field("normalise", &self.normalise.is_some())
            .field("reconcile", &self.reconcile.is_some())
            .field("persist", &self.persist.is_some())
            .field("broadcast", &self.broadcast.is_some())
            .finish()
    }
}

/// Run `apply` inside the standard document pipeline and return its result unchanged.
///
/// The hook stages before and after `apply` each run as a [`run_reconcile_pipeline`] over the
/// same command.
pub fn dispatch_document_command<T>(
    command: &DocumentCommand,
    apply: impl FnOnce() -> T,
    hooks: Option<&mut DocumentCommandHooks>,
) -> T {
    let (normalise, reconcile, persist, broadcast) = match hooks {
        Some(hooks) => (
            hooks.normalise.as_mut(),
            hooks.reconcile.as_mut(),
            hooks.persist.as_mut(),
            hooks.broadcast.as_mut(),
        ),
        None => (None, None, None, None),
    };

    let mut normalise = hook_stage(PipelineStage::Normalise, normalise);
    run_hook_stages(command, &mut [&mut normalise]);

    trace_stage(PipelineStage::Apply, command);
    let result = apply();

    let mut reconcile = hook_stage(PipelineStage::Reconcile, reconcile);
    let mut persist = hook_stage(PipelineStage::Persist, persist);
    let mut broadcast = hook_stage(PipelineStage::Broadcast, broadcast);
    run_hook_stages(command, &mut [&mut reconcile, &mut persist, &mut broadcast]);

    result
}

fn run_hook_stages<'c>(
    command: &'c DocumentCommand,
    stages: &mut [ReconcileStage<'_, 'c, DocumentCommand, Infallible>],
) {
    match run_reconcile_pipeline(command, stages) {
        Ok(_) => {}
        Err(never) => match never {},
    }
}

fn hook_stage<'h>(
    stage: PipelineStage,
    mut hook: Option<&'h mut CommandHook>,
) -> impl FnMut(&ReconcileContext<'_, DocumentCommand>) -> Result<(), Infallible> + 'h {
    move |ctx: &ReconcileContext<'_, DocumentCommand>| {
        trace_stage(stage, ctx.command);
        if let Some(hook) = hook.as_deref_mut() {
            hook(ctx.command);
        }
        Ok(())
    }
}

fn trace_stage(stage: PipelineStage, command: &DocumentCommand) {
    tracing::trace!(
        stage = stage.as_str(),
        kind = command.kind().as_str(),
        source = command.source().as_str(),
        document = ?command.document_id(),
        path = command.path(),
        "document command stage"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DocumentCommandKind;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_stages_run_in_order_with_same_command() {
        let command = String::from("cmd");
        let seen = std::cell::RefCell::new(Vec::new());

        let mut first = |ctx: &ReconcileContext<'_, String>| -> Result<(), ()> {
            assert!(std::ptr::eq(ctx.command, &command));
            seen.borrow_mut().push(1);
            Ok(())
        };
        let mut second = |ctx: &ReconcileContext<'_, String>| -> Result<(), ()> {
            assert!(std::ptr::eq(ctx.command, &command));
            seen.borrow_mut().push(2);
            Ok(())
        };

        let ctx =
            run_reconcile_pipeline::<_, ()>(&command, &mut [&mut first, &mut second]).unwrap();
        assert!(std::ptr::eq(ctx.command, &command));
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_failing_stage_aborts_remaining() {
        let command = 1u32;
        let ran_last = std::cell::Cell::new(false);

        let mut ok = |_: &ReconcileContext<'_, u32>| -> Result<(), &'static str> { Ok(()) };
        let mut fail = |_: &ReconcileContext<'_, u32>| -> Result<(), &'static str> { Err("boom") };
        let mut last = |_: &ReconcileContext<'_, u32>| -> Result<(), &'static str> {
            ran_last.set(true);
            Ok(())
        };

        let err = run_reconcile_pipeline(&command, &mut [&mut ok, &mut fail, &mut last])
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(!ran_last.get());
    }

    #[test]
    fn test_dispatch_runs_hooks_around_apply() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut hooks = DocumentCommandHooks::default();

        let l = log.clone();
        hooks.normalise = Some(Box::new(move |_| l.lock().unwrap().push("normalise".into())));
        let l = log.clone();
        hooks.reconcile = Some(Box::new(move |_| l.lock().unwrap().push("reconcile".into())));
        let l = log.clone();
        hooks.persist = Some(Box::new(move |_| l.lock().unwrap().push("persist".into())));
        let l = log.clone();
        hooks.broadcast = Some(Box::new(move |_| l.lock().unwrap().push("broadcast".into())));

        let command = DocumentCommand::local(DocumentCommandKind::SaveDocument);
        let apply_log = log.clone();
        let value = dispatch_document_command(
            &command,
            || {
                apply_log.lock().unwrap().push("apply".into());
                "saved"
            },
            Some(&mut hooks),
        );

        assert_eq!(value, "saved");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["normalise", "apply", "reconcile", "persist", "broadcast"]
        );
    }

    #[test]
    fn test_dispatch_without_hooks_returns_apply_result() {
        let command = DocumentCommand::local(DocumentCommandKind::CreateDocument);
        assert_eq!(dispatch_document_command(&command, || 7, None), 7);
        assert!(DocumentCommandHooks::default().is_empty());
    }
}
