//! Line-driven reactive session.
//!
//! Each stdin line is a JSON object that updates some of the session
//! inputs. The session reconciles once for the first line and once for
//! every line that changes something, and the outcome is printed before
//! the next line is read. A line that switches the user ends the current
//! session and starts one for the new user, so each user keeps its own
//! retained token. EOF (or Ctrl-C) shuts the session down and persists
//! the retained tokens.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info};

use pushsync_core::{
    ReconcileOutcome, SessionEvent, Subscriber, SyncInputs, SyncSession,
};

use crate::cli::{GlobalOpts, SessionArgs, TokenSourceArgs};
use crate::error::CliError;
use crate::output;
use crate::state::TokenState;

use super::{reconcile, util};

/// One input line. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputLine {
    pub user: Option<String>,
    pub communities: Option<Vec<String>>,
    pub push_enabled: Option<bool>,
}

impl InputLine {
    pub fn parse(raw: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn apply(self, inputs: &mut SyncInputs) {
        if let Some(user) = self.user {
            inputs.subscriber = Subscriber::new(user);
        }
        if let Some(ids) = self.communities {
            inputs.communities = util::community_ids(ids);
        }
        if let Some(enabled) = self.push_enabled {
            inputs.push_enabled = enabled;
        }
    }
}

/// Serializable view of a session event.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EventView<'a> {
    Reconciled(&'a ReconcileOutcome),
    Failed {
        outcome: &'static str,
        message: &'a str,
        transient: bool,
    },
}

impl<'a> From<&'a SessionEvent> for EventView<'a> {
    fn from(event: &'a SessionEvent) -> Self {
        match event {
            SessionEvent::Reconciled(outcome) => Self::Reconciled(outcome),
            SessionEvent::Failed { message, transient } => Self::Failed {
                outcome: "failed",
                message,
                transient: *transient,
            },
        }
    }
}

fn print_event(event: &SessionEvent, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let view = EventView::from(event);
    let out = output::render_single(
        global.output,
        &view,
        |v| match v {
            EventView::Reconciled(outcome) => reconcile::outcome_detail(outcome, color),
            EventView::Failed { message, .. } => format!("Outcome:  failed\nError:    {message}"),
        },
        |v| match v {
            EventView::Reconciled(outcome) => outcome.label().to_owned(),
            EventView::Failed { outcome, .. } => (*outcome).to_owned(),
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> Result<SessionEvent, CliError> {
    rx.recv()
        .await
        .map_err(|e| CliError::Internal(format!("sync session stopped: {e}")))
}

/// Start a session for `inputs.subscriber`, seeded with that subscriber's
/// stored token.
fn start_session(
    source: &TokenSourceArgs,
    global: &GlobalOpts,
    state: &TokenState,
    inputs: SyncInputs,
) -> Result<(SyncSession, broadcast::Receiver<SessionEvent>), CliError> {
    let engine = util::build_engine(source, global)?
        .with_retained_token(state.token_for(&inputs.subscriber.id));
    Ok(SyncSession::start(engine, inputs))
}

/// Shut a session down and record the token it retained for its subscriber.
async fn finish_session(session: SyncSession, state: &mut TokenState) -> Result<(), CliError> {
    let subscriber = session.current().subscriber;
    let token = session.shutdown().await?;
    state.set_token(&subscriber.id, token);
    Ok(())
}

enum Step {
    Event(SessionEvent),
    Line(Option<String>),
    Interrupted,
}

pub async fn handle(args: SessionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut initial = SyncInputs {
        subscriber: Subscriber::new(args.user),
        ..SyncInputs::default()
    };

    // The first non-blank line completes the initial inputs.
    loop {
        let Some(line) = lines.next_line().await? else {
            debug!("no input; nothing to reconcile");
            return Ok(());
        };
        if !line.trim().is_empty() {
            InputLine::parse(&line)?.apply(&mut initial);
            break;
        }
    }

    let state_path = util::state_file(&args.source);
    let mut state = match state_path {
        Some(ref path) => TokenState::load(path)?,
        None => TokenState::default(),
    };

    let (mut session, mut rx) = start_session(&args.source, global, &state, initial)?;
    // Input is read only once the outcome of the previous pass is printed.
    let mut awaiting = true;

    loop {
        let step = tokio::select! {
            event = next_event(&mut rx), if awaiting => Step::Event(event?),
            line = lines.next_line(), if !awaiting => Step::Line(line?),
            _ = tokio::signal::ctrl_c() => Step::Interrupted,
        };

        match step {
            Step::Event(event) => {
                print_event(&event, global)?;
                awaiting = false;
            }
            Step::Line(None) => break,
            Step::Line(Some(line)) if line.trim().is_empty() => {}
            Step::Line(Some(line)) => {
                let mut next = session.current();
                InputLine::parse(&line)?.apply(&mut next);
                if next.subscriber.id != session.current().subscriber.id {
                    info!(subscriber = %next.subscriber.id, "subscriber changed; restarting session");
                    finish_session(session, &mut state).await?;
                    (session, rx) = start_session(&args.source, global, &state, next)?;
                    awaiting = true;
                } else if session.update(next) {
                    awaiting = true;
                } else {
                    debug!("inputs unchanged; no pass");
                }
            }
            Step::Interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    finish_session(session, &mut state).await?;
    if let Some(ref path) = state_path {
        state.save(path)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pushsync_core::CommunityId;

    use super::*;

    #[test]
    fn absent_fields_keep_current_values() {
        let mut inputs = SyncInputs {
            subscriber: Subscriber::new("u1"),
            communities: vec![CommunityId::from("a")],
            push_enabled: true,
        };
        InputLine::parse(r#"{"push_enabled": false}"#)
            .unwrap()
            .apply(&mut inputs);
        assert_eq!(inputs.subscriber, Subscriber::new("u1"));
        assert_eq!(inputs.communities, vec![CommunityId::from("a")]);
        assert!(!inputs.push_enabled);
    }

    #[test]
    fn full_line_replaces_everything() {
        let mut inputs = SyncInputs::default();
        InputLine::parse(r#"{"user": "u2", "communities": ["x", "y"], "push_enabled": true}"#)
            .unwrap()
            .apply(&mut inputs);
        assert_eq!(inputs.subscriber, Subscriber::new("u2"));
        assert_eq!(inputs.communities.len(), 2);
        assert!(inputs.push_enabled);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            InputLine::parse(r#"{"enabled": true}"#),
            Err(CliError::Json(_))
        ));
    }

    #[test]
    fn failed_event_renders_as_object() {
        let event = SessionEvent::Failed {
            message: "token service down".into(),
            transient: true,
        };
        let json = serde_json::to_value(EventView::from(&event)).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["transient"], true);
    }
}
