//! Run telemetry over a broadcast channel.
//!
//! The driver and scheduler report what they are doing as `ProgressEvent`s.
//! Subscribers (the CLI progress bar, tests) read them from a
//! `tokio::sync::broadcast` channel; with nobody subscribed they are dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Identifier, LedgerStatus, RunSummary};

/// One numbered event of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Position of the event within the run, starting at 1.
    pub seq: u64,
    pub event: ProgressEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The run began; `total` identifiers will be processed.
    RunStarted {
        start: Identifier,
        end: Identifier,
        total: u32,
    },
    /// A search for one identifier began.
    SearchStarted {
        identifier: Identifier,
        expected: NaiveDate,
        lower_bound: NaiveDate,
    },
    /// Periodic counter during a long search.
    ProbeMilestone {
        identifier: Identifier,
        probes: u64,
        last_date: NaiveDate,
    },
    /// A document was located but could not be downloaded.
    FetchFailed {
        identifier: Identifier,
        url: String,
        error: String,
    },
    /// An identifier reached its terminal status.
    IdentifierDone {
        identifier: Identifier,
        status: LedgerStatus,
        date: Option<NaiveDate>,
        url: Option<String>,
        probes: u64,
    },
    /// The run finished and the ledger was written.
    RunComplete { summary: RunSummary },
}

pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Channel with room for 256 unread events per subscriber.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Number and send `event` when a sender is attached. Send errors mean no
/// subscriber and are ignored.
pub fn emit(tx: &Option<ProgressSender>, seq: &mut u64, event: ProgressEventKind) {
    let Some(sender) = tx else {
        return;
    };
    *seq += 1;
    let _ = sender.send(ProgressEvent { seq: *seq, event });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_identifier_done_json_shape() {
        let ev = ProgressEvent {
            seq: 7,
            event: ProgressEventKind::IdentifierDone {
                identifier: 205,
                status: LedgerStatus::Downloaded,
                date: Some(day(2017, 3, 22)),
                url: Some("https://files.example.org/atas/COPOM205-not2017-03-22-205.pdf".into()),
                probes: 16,
            },
        };
        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(value["seq"], 7);
        assert_eq!(value["event"]["type"], "IdentifierDone");
        assert_eq!(value["event"]["status"], "downloaded");
        assert_eq!(value["event"]["date"], "2017-03-22");

        let back: ProgressEvent = serde_json::from_value(value).unwrap();
        assert!(matches!(
            back.event,
            ProgressEventKind::IdentifierDone { identifier: 205, probes: 16, .. }
        ));
    }

    #[test]
    fn test_dropped_subscriber_does_not_stop_numbering() {
        let (tx, rx) = channel();
        drop(rx);
        let mut seq = 0;
        emit(
            &Some(tx),
            &mut seq,
            ProgressEventKind::FetchFailed {
                identifier: 210,
                url: "https://files.example.org/atas/x.pdf".into(),
                error: "HTTP status 503".into(),
            },
        );
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_detached_driver_emits_nothing() {
        let mut seq = 0;
        emit(
            &None,
            &mut seq,
            ProgressEventKind::RunStarted {
                start: 200,
                end: 210,
                total: 11,
            },
        );
        assert_eq!(seq, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let (tx, mut rx) = channel();
        let tx = Some(tx);
        let mut seq = 0;
        for n in 1..=3 {
            emit(
                &tx,
                &mut seq,
                ProgressEventKind::ProbeMilestone {
                    identifier: n,
                    probes: 50,
                    last_date: day(2020, 1, 1),
                },
            );
        }
        for expected in 1..=3 {
            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.seq, expected);
        }
    }
}
