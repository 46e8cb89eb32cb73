//! Replay a landmark recording through the rep counter.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use repsense_common::clock::{FrameBudget, SessionClock};
use repsense_common::config::AppConfig;
use repsense_common::error::{read_to_string, RepsenseError};
use repsense_exercise_model::landmark::parse_frames;
use repsense_processing_core::{
    ExerciseProcessor, ProcessorEvent, ProcessorOptions, SessionSummary,
};

/// JSON line for a frame that was skipped.
#[derive(Serialize)]
struct SkippedFrame {
    t: u64,
    skipped: String,
}

/// JSON summary line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport<'a> {
    started_at: &'a str,
    wall_secs: f64,
    summary: &'a SessionSummary,
    frames_skipped: u64,
    frames_over_budget: u64,
    worst_frame_us: u128,
}

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    exercise: String,
    json: bool,
    body_weight: Option<f64>,
    vars: Vec<String>,
) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;
    let definition = super::lookup(&catalog, &exercise)?;
    let extra = super::parse_vars(&vars)?;

    let content = read_to_string(&path)?;
    let frames = parse_frames(&content).map_err(|e| {
        RepsenseError::processing(format!("bad frame in {}: {e}", path.display()))
    })?;

    let mut processor = ExerciseProcessor::new(definition, ProcessorOptions::from(&config.session))
        .map_err(|e| RepsenseError::session(format!("cannot start '{exercise}': {e}")))?;
    let clock = SessionClock::start();
    let mut budget = FrameBudget::new(Duration::from_millis(config.session.frame_budget_ms));
    let mut skipped = 0u64;

    if !json {
        println!(
            "Replaying {} frame(s) from {} as '{}'",
            frames.len(),
            path.display(),
            exercise
        );
    }

    for frame in &frames {
        let (result, over_budget) = budget.measure(|| processor.process_frame(frame));
        if over_budget {
            tracing::warn!(t = frame.timestamp_ns, "Frame exceeded processing budget");
        }

        match result {
            Ok(outcome) if json => println!("{}", serde_json::to_string(&outcome)?),
            Ok(outcome) => {
                for event in &outcome.events {
                    match event {
                        ProcessorEvent::RepCompleted { total } => {
                            println!("[{:>8.3}s] Rep {total}", frame.timestamp_secs());
                        }
                        ProcessorEvent::StateChanged { from, to } => {
                            println!("[{:>8.3}s] {from} -> {to}", frame.timestamp_secs());
                        }
                        ProcessorEvent::PostureFeedback { .. } => {}
                    }
                }
            }
            Err(e) => {
                skipped += 1;
                if json {
                    let line = SkippedFrame {
                        t: frame.timestamp_ns,
                        skipped: e.to_string(),
                    };
                    println!("{}", serde_json::to_string(&line)?);
                }
            }
        }
    }

    let weight = body_weight.unwrap_or(config.session.body_weight_grams);
    let summary = processor.session_summary(weight, &extra);

    if json {
        let report = ReplayReport {
            started_at: clock.epoch_wall(),
            wall_secs: clock.elapsed_secs(),
            summary: &summary,
            frames_skipped: skipped,
            frames_over_budget: budget.over_budget(),
            worst_frame_us: budget.worst().as_micros(),
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!();
    println!("Session: {} ({})", summary.exercise_name, summary.exercise_id);
    println!("  Reps: {}", summary.total_count);
    println!("  Duration: {:.1}s", summary.elapsed_secs);
    println!(
        "  Frames: {} processed, {} skipped",
        summary.frames_processed, skipped
    );
    match &summary.calorie_error {
        None => println!(
            "  Calories: {:.2} {}",
            summary.calories_kcal, summary.calorie_unit
        ),
        Some(err) => println!("  Calories: unavailable ({err})"),
    }
    if let Some(messages) = processor.state().last_messages.first() {
        println!("  Last feedback: {messages}");
    }
    println!(
        "  Timing: {} frame(s) in {:.3}s, mean {:?}, worst {:?}, {} over {:?}",
        budget.frames(),
        clock.elapsed_secs(),
        budget.mean(),
        budget.worst(),
        budget.over_budget(),
        budget.budget()
    );

    Ok(())
}
