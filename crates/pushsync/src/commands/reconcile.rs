//! One-shot reconciliation.

use std::fmt::Write as _;
use std::sync::Arc;

use pushsync_core::{DiagnosticEvent, ReconcileOutcome, RecordingDiagnostics, Subscriber};

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::error::CliError;
use crate::output;
use crate::state::TokenState;

use super::util;

/// Key/value detail view for table output.
pub fn outcome_detail(outcome: &ReconcileOutcome, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Outcome:  {}", output::outcome_label(outcome, color));
    if let Some(topics) = outcome.topics() {
        let _ = writeln!(out, "Topics:   {topics}");
    }
    match outcome {
        ReconcileOutcome::Skipped { reason } => {
            let _ = writeln!(out, "Reason:   {reason}");
        }
        ReconcileOutcome::RegistryFailed {
            action, message, ..
        } => {
            let _ = writeln!(out, "Action:   {action}");
            let _ = writeln!(out, "Error:    {message}");
        }
        _ => {}
    }
    out.trim_end().to_owned()
}

pub async fn handle(args: ReconcileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let subscriber = Subscriber::new(args.user);
    let communities = util::community_ids(args.communities);

    let state_path = util::state_file(&args.source);
    let mut state = match state_path {
        Some(ref path) => TokenState::load(path)?,
        None => TokenState::default(),
    };

    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let mut engine = util::build_engine(&args.source, global)?
        .with_diagnostics(diagnostics.clone())
        .with_retained_token(state.token_for(&subscriber.id));

    let outcome = engine
        .reconcile(&subscriber, &communities, args.enable)
        .await?;

    if let Some(ref path) = state_path {
        state.set_token(&subscriber.id, engine.take_retained_token());
        state.save(path)?;
    }

    if !global.quiet && diagnostics.count(DiagnosticEvent::PushPermissionDenied) > 0 {
        eprintln!("diagnostic: {}", DiagnosticEvent::PushPermissionDenied);
    }

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &outcome,
        |o| outcome_detail(o, color),
        |o| o.label().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
