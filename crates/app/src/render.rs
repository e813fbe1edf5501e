use std::fmt::{self, Write as _};
use std::io::{self, Write as _};

use exam_core::model::{EndReason, PerformanceBand, SessionReport, format_secs};
use services::{Phase, ResultsSink, SessionSnapshot};
use tokio::sync::watch;

/// Turns successive snapshots into terminal frames.
///
/// A full frame is printed when anything besides the countdown changes;
/// countdown-only changes print a short timer line on each whole minute and
/// during the last ten seconds.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<SessionSnapshot>,
}

impl Renderer {
    pub fn render(&mut self, snapshot: &SessionSnapshot) -> Option<String> {
        let frame = match &self.last {
            Some(last) if last == snapshot => None,
            Some(last) if only_clock_moved(last, snapshot) => timer_line(snapshot),
            _ => full_frame(snapshot),
        };
        self.last = Some(snapshot.clone());
        frame
    }
}

/// Print a frame for every published snapshot until the runtime stops.
pub async fn follow(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut renderer = Renderer::default();
    loop {
        let frame = renderer.render(&snapshots.borrow_and_update());
        if let Some(frame) = frame {
            print!("{frame}");
            let _ = io::stdout().flush();
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

fn only_clock_moved(last: &SessionSnapshot, next: &SessionSnapshot) -> bool {
    last.generation == next.generation
        && last.phase == next.phase
        && last.questions == next.questions
        && last.unanswered == next.unanswered
        && last.remaining_secs != next.remaining_secs
}

fn timer_line(snapshot: &SessionSnapshot) -> Option<String> {
    let secs = snapshot.remaining_secs?;
    (secs % 60 == 0 || secs <= 10).then(|| format!("  time left {}\n", format_secs(secs)))
}

fn full_frame(snapshot: &SessionSnapshot) -> Option<String> {
    if snapshot.phase == Phase::Idle {
        return None;
    }
    let mut out = String::new();
    write_frame(&mut out, snapshot).ok()?;
    Some(out)
}

fn write_frame(out: &mut String, s: &SessionSnapshot) -> fmt::Result {
    let category = s.category.as_ref().map_or("", |c| c.as_str());

    match s.phase {
        Phase::Idle => Ok(()),
        Phase::Loading => writeln!(out, "Loading {category}..."),
        Phase::Failed => {
            writeln!(
                out,
                "Could not load {category}: {}",
                s.error.as_deref().unwrap_or("unknown error")
            )?;
            writeln!(out, "Type `retry` to try again.")
        }
        Phase::InProgress => {
            writeln!(out)?;
            write_header(out, s, category)?;
            for (index, question) in s.questions.iter().enumerate() {
                writeln!(out, "{}. {}", index + 1, question.prompt)?;
                if !question.answerable {
                    writeln!(out, "     (no options available)")?;
                }
                for (offset, choice) in question.choices.iter().enumerate() {
                    let marker = if question.chosen.as_deref() == Some(choice.as_str()) {
                        '*'
                    } else {
                        ' '
                    };
                    writeln!(out, "   {marker} {}) {choice}", letter(offset))?;
                }
            }
            writeln!(out, "Answer with `<n> <letter>`, type `submit` when done.")
        }
        Phase::AwaitingConfirmation => {
            let unanswered = s.unanswered.unwrap_or_default();
            writeln!(
                out,
                "{unanswered} question(s) unanswered. Submit anyway? (yes/no)"
            )
        }
        Phase::Ended => {
            if let Some(report) = &s.report {
                for (index, review) in report.reviews.iter().enumerate() {
                    let mark = if review.is_correct { "ok " } else { "   " };
                    writeln!(
                        out,
                        "{mark}{}. {}  you: {}  correct: {}",
                        index + 1,
                        review.prompt,
                        review.chosen.as_deref().unwrap_or("-"),
                        review.correct
                    )?;
                }
            }
            writeln!(out, "Type `restart` to try again or `quit` to leave.")
        }
    }
}

fn write_header(out: &mut String, s: &SessionSnapshot, category: &str) -> fmt::Result {
    let time = s.remaining_label().unwrap_or_default();
    match s.progress {
        Some(p) => writeln!(
            out,
            "[{category}]  time left {time}  answered {}/{} ({}%)",
            p.answered, p.total, p.percentage
        ),
        None => writeln!(out, "[{category}]  time left {time}"),
    }
}

fn letter(offset: usize) -> char {
    u8::try_from(offset)
        .ok()
        .and_then(|o| b'a'.checked_add(o))
        .map_or('?', char::from)
}

/// Prints the outcome when a session ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalResults;

impl ResultsSink for TerminalResults {
    fn deliver(&self, report: &SessionReport) {
        print!("{}", results_summary(report));
    }
}

pub fn results_summary(report: &SessionReport) -> String {
    let outcome = report.outcome;
    let how = match report.reason {
        EndReason::Completed => "submitted",
        EndReason::Confirmed => "submitted with unanswered questions",
        EndReason::TimedOut => "time is up",
    };
    let message = match outcome.band() {
        PerformanceBand::Excellent if outcome.percentage == 100 => "Perfect! A true champion.",
        PerformanceBand::Excellent if outcome.percentage >= 80 => "Excellent, great performance!",
        PerformanceBand::Excellent => "Good job, keep going, you can do even better!",
        PerformanceBand::Average => "Good effort, keep practicing.",
        PerformanceBand::NeedsWork => "Keep studying and try again.",
    };
    format!(
        "\nExam over ({how}).\nScore: {}/{} ({}%)\n{message}\n",
        outcome.score, outcome.total, outcome.percentage
    )
}
