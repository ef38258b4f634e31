use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eyre::{eyre, WrapErr};
use jiff::Timestamp;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use screener_engine::catalog::Catalog;
use screener_engine::error::SessionError;
use screener_engine::report::OutcomeReport;
use screener_engine::session::{SessionEvent, StepController};
use screener_engine::settings::EngineSettings;
use screener_engine::store::{MemorySessionStore, SessionStore};
use screener_instruments::config::Questionnaire;

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    about = "Validate questionnaire versions and replay screening sessions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a questionnaire definition and report every configuration defect
    Check {
        /// Path to a questionnaire definition (JSON)
        path: PathBuf,
    },
    /// Print the built-in screening questionnaire definition as JSON
    ExportDefault,
    /// Replay a scripted session and print the analytics-safe outcome
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Event script: a JSON array of session events, or an object with
    /// `started_at` and `events` for recorded sessions
    #[arg(long)]
    events: PathBuf,
    /// Stable questionnaire definition; the built-in one when omitted
    #[arg(long)]
    questionnaire: Option<PathBuf>,
    /// Candidate questionnaire version being rolled out
    #[arg(long)]
    candidate: Option<PathBuf>,
    /// Fixed session id, for reproducible rollout selection
    #[arg(long)]
    session_id: Option<Uuid>,
}

pub fn run(cli: Cli) -> eyre::Result<()> {
    match cli.command {
        Command::Check { path } => {
            let questionnaire = load_questionnaire(&path)?;
            println!(
                "{} v{}: {} steps, {} rules, {} instruments",
                questionnaire.id(),
                questionnaire.version(),
                questionnaire.total_steps(),
                questionnaire.rules().len(),
                questionnaire.instruments().len(),
            );
            Ok(())
        }
        Command::ExportDefault => {
            let definition = screener_instruments::default_definition();
            println!("{}", serde_json::to_string_pretty(&definition)?);
            Ok(())
        }
        Command::Run(args) => run_session(args),
    }
}

/// A scripted session. Recorded scripts carry their own start time so that
/// submit timestamps in the script yield a meaningful duration.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventScript {
    Recorded {
        started_at: Timestamp,
        events: Vec<SessionEvent>,
    },
    Events(Vec<SessionEvent>),
}

impl EventScript {
    /// Start time and events. Bare event lists start at `now` and have
    /// their submit events stamped at `now` too.
    fn into_parts(self, now: Timestamp) -> (Timestamp, Vec<SessionEvent>) {
        match self {
            Self::Recorded { started_at, events } => (started_at, events),
            Self::Events(events) => {
                let events = events
                    .into_iter()
                    .map(|event| match event {
                        SessionEvent::Submit { .. } => SessionEvent::Submit { at: now },
                        other => other,
                    })
                    .collect();
                (now, events)
            }
        }
    }
}

fn load_questionnaire(path: &Path) -> eyre::Result<Questionnaire> {
    let json = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading questionnaire {}", path.display()))?;
    Questionnaire::from_json(&json).wrap_err_with(|| format!("loading {}", path.display()))
}

fn run_session(args: RunArgs) -> eyre::Result<()> {
    let settings = EngineSettings::from_env()?;

    let stable = match &args.questionnaire {
        Some(path) => load_questionnaire(path)?,
        None => screener_instruments::default_screening()?,
    };
    let mut catalog = Catalog::new(stable);
    if let Some(path) = &args.candidate {
        catalog = catalog.with_candidate(load_questionnaire(path)?)?;
    }

    let script: EventScript = serde_json::from_str(
        &fs::read_to_string(&args.events)
            .wrap_err_with(|| format!("reading events {}", args.events.display()))?,
    )
    .wrap_err_with(|| format!("parsing events {}", args.events.display()))?;
    let (started_at, events) = script.into_parts(Timestamp::now());

    let session_id = args.session_id.unwrap_or_else(Uuid::new_v4);
    let questionnaire = catalog.select(session_id, &settings);
    let controller = StepController::new(questionnaire);
    let mut store = MemorySessionStore::new();
    store.save(&controller.start(session_id, started_at))?;

    for event in events {
        // Each event is its own request: restore, apply, persist.
        let state = store
            .load(session_id)?
            .ok_or_else(|| eyre!("session {session_id} vanished from the store"))?;
        let event_name = event.name();

        match controller.apply(&state, event) {
            Ok(transition) => {
                if let Some(result) = transition.result {
                    let report =
                        OutcomeReport::build(&transition.state, &result, &settings.analytics_salt);
                    store.remove(session_id)?;
                    info!(risk_band = %report.risk_band, "session complete");
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    return Ok(());
                }
                if transition.state.is_terminal() {
                    store.remove(session_id)?;
                    info!("session abandoned");
                    return Ok(());
                }
                store.save(&transition.state)?;
            }
            Err(
                error @ (SessionError::AdvanceBlocked { .. }
                | SessionError::SubmissionBlocked { .. }
                | SessionError::NotOnFinalStep { .. }
                | SessionError::NotPermitted { .. }),
            ) => {
                warn!(event = event_name, %error, "event rejected");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Err(eyre!("event script ended before the session was submitted or abandoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: &str) -> Timestamp {
        timestamp.parse().unwrap()
    }

    #[test]
    fn recorded_scripts_keep_their_own_clock() {
        let script: EventScript =
            serde_json::from_str(include_str!("../../../demos/safety_branch_session.json")).unwrap();
        let (started_at, events) = script.into_parts(at("2040-06-01T00:00:00Z"));

        assert_eq!(started_at, at("2029-12-31T23:52:30Z"));
        let Some(SessionEvent::Submit { at: submitted }) = events.last() else {
            panic!("demo script should end with a submit");
        };
        assert_eq!(submitted.duration_since(started_at).as_secs(), 450);
    }

    #[test]
    fn bare_event_lists_are_stamped_at_replay_time() {
        let script: EventScript = serde_json::from_str(
            r#"[{"type": "abandon"}, {"type": "submit", "at": "2030-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let now = at("2026-10-19T09:00:00Z");
        let (started_at, events) = script.into_parts(now);

        assert_eq!(started_at, now);
        assert_eq!(events, vec![SessionEvent::Abandon, SessionEvent::Submit { at: now }]);
    }
}
