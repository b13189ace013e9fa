//! Completion collector: forwards finished tasks to the listener.
//!
//! The collector owns the receiving end of the completion channel. Workers
//! (and the producer, for caller-run tasks) send [`Completion::Finished`] as
//! each task ends, so the collector sees results in completion order.
//!
//! A run ends on one of two signals:
//!
//! - [`Completion::End`], sent by the producer after the pool has been joined.
//!   Every result was sent before it, so nothing is lost.
//! - cancellation of the run token. Results already buffered in the channel
//!   are still forwarded, then the collector stops.
//!
//! Either way `after_run` is posted exactly once, after every forwarded result.

use std::sync::Arc;

use crossbeam_channel::{select, Receiver};
use tracing::debug;

use crate::data::stats::TaskOutcome;

use super::cancel::CancellationToken;
use super::delivery::Delivery;
use super::listener::{RunOutcome, StatisticsListener};

/// Message on the completion channel.
#[derive(Debug)]
pub enum Completion {
    /// A task finished, successfully or not
    Finished(TaskOutcome),
    /// No more tasks will finish in this run
    End,
}

/// Consumer side of a run.
pub struct Collector {
    completions: Receiver<Completion>,
    token: CancellationToken,
    delivery: Arc<dyn Delivery>,
    listener: Option<Arc<dyn StatisticsListener>>,
    forwarded: u64,
}

impl Collector {
    pub fn new(
        completions: Receiver<Completion>,
        token: CancellationToken,
        delivery: Arc<dyn Delivery>,
        listener: Option<Arc<dyn StatisticsListener>>,
    ) -> Self {
        Self {
            completions,
            token,
            delivery,
            listener,
            forwarded: 0,
        }
    }

    /// Drain completions until the end of the run, then post `after_run`.
    pub fn run(mut self) -> RunOutcome {
        let completions = self.completions.clone();
        let cancelled = self.token.signal().clone();

        let outcome = loop {
            select! {
                recv(completions) -> msg => match msg {
                    Ok(Completion::Finished(outcome)) => self.forward(outcome),
                    Ok(Completion::End) => break RunOutcome::Completed,
                    // Every sender is gone without an end marker
                    Err(_) => break self.outcome_without_marker(),
                },
                recv(cancelled) -> _ => break self.drain(),
            }
        };

        debug!(forwarded = self.forwarded, ?outcome, "collector finished");
        self.notify_after_run(outcome);
        outcome
    }

    /// Forward what is already buffered after a cancellation.
    fn drain(&mut self) -> RunOutcome {
        while let Ok(msg) = self.completions.try_recv() {
            match msg {
                Completion::Finished(outcome) => self.forward(outcome),
                // The run had already finished when the cancellation arrived
                Completion::End => return RunOutcome::Completed,
            }
        }
        RunOutcome::Cancelled
    }

    fn outcome_without_marker(&self) -> RunOutcome {
        if self.token.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        }
    }

    fn forward(&mut self, outcome: TaskOutcome) {
        self.forwarded += 1;
        let Some(listener) = &self.listener else {
            return;
        };
        let listener = Arc::clone(listener);

        match outcome {
            Ok(result) => self.delivery.post(Box::new(move || listener.on_result(result))),
            Err(failure) => self
                .delivery
                .post(Box::new(move || listener.on_failure(failure))),
        }
    }

    fn notify_after_run(&self, outcome: RunOutcome) {
        if let Some(listener) = &self.listener {
            let listener = Arc::clone(listener);
            self.delivery
                .post(Box::new(move || listener.after_run(outcome)));
        }
    }
}
