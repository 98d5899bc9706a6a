//! Bounded day-offset search for a single identifier.
//!
//! Offsets around the expected date are tried in priority order:
//!
//! 1. `0`
//! 2. `+1, -1, +2, -2, …, +W, -W` (the nearby window)
//! 3. `W+1, W+1+step, …` up to the far lookahead `F`, forward only
//!
//! Dates not strictly after the lower bound are skipped. For each remaining
//! date every candidate filename is probed in order; the first hit wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::candidate::NamingScheme;
use crate::probe::Prober;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::types::{ConfigError, Identifier, Resolution};

/// Window constants of the offset search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPlan {
    /// Days either side of the expected date searched symmetrically.
    pub nearby_window_days: u32,
    /// Last forward offset of the sparse sweep.
    pub far_lookahead_days: u32,
    /// Stride of the sparse forward sweep.
    pub far_step_days: u32,
    /// Emit a progress milestone every this many probes (0 disables).
    pub progress_every: u64,
}

impl Default for SearchPlan {
    fn default() -> Self {
        Self {
            nearby_window_days: 30,
            far_lookahead_days: 120,
            far_step_days: 2,
            progress_every: 50,
        }
    }
}

impl SearchPlan {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.far_step_days == 0 {
            return Err(ConfigError::InvalidPlan(
                "far_step_days must be at least 1".to_string(),
            ));
        }
        if self.far_lookahead_days < self.nearby_window_days {
            return Err(ConfigError::InvalidPlan(format!(
                "far_lookahead_days ({}) is inside the nearby window ({})",
                self.far_lookahead_days, self.nearby_window_days
            )));
        }
        Ok(())
    }

    /// Day offsets in priority order. Finite and free of duplicates.
    pub fn offsets(&self) -> impl Iterator<Item = i64> {
        let window = i64::from(self.nearby_window_days);
        let far = i64::from(self.far_lookahead_days);
        let step = self.far_step_days.max(1) as usize;

        std::iter::once(0)
            .chain((1..=window).flat_map(|k| [k, -k]))
            .chain((window + 1..=far).step_by(step))
    }

    /// Number of offsets `offsets()` yields.
    pub fn offset_count(&self) -> usize {
        self.offsets().count()
    }
}

/// `date + days`, or `None` past the calendar range.
pub(crate) fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(chrono::Duration::days(days))
}

/// Resolves one identifier to a `Resolution`.
pub struct SearchScheduler<'a> {
    naming: &'a NamingScheme,
    plan: &'a SearchPlan,
    base_url: &'a Url,
    prober: &'a dyn Prober,
}

impl<'a> SearchScheduler<'a> {
    pub fn new(
        naming: &'a NamingScheme,
        plan: &'a SearchPlan,
        base_url: &'a Url,
        prober: &'a dyn Prober,
    ) -> Self {
        Self {
            naming,
            plan,
            base_url,
            prober,
        }
    }

    /// `(filename, url)` pairs for `(n, d)` in probe order.
    pub fn candidate_urls(&self, n: Identifier, d: NaiveDate) -> Vec<(String, String)> {
        candidate_urls(self.naming, self.base_url, n, d)
    }

    /// Search the offset space around `expected` for identifier `n`.
    ///
    /// Candidate dates must be strictly after `last_date`. Each
    /// (date, candidate) pair is probed at most once.
    pub async fn search(
        &self,
        n: Identifier,
        expected: NaiveDate,
        last_date: NaiveDate,
        progress: &Option<ProgressSender>,
        seq: &mut u64,
    ) -> Resolution {
        let mut probes = 0u64;

        for offset in self.plan.offsets() {
            let Some(date) = shift(expected, offset) else {
                continue;
            };
            if date <= last_date {
                continue;
            }

            for (filename, url) in self.candidate_urls(n, date) {
                probes += 1;
                let hit = self.prober.probe(&url).await;

                if self.plan.progress_every > 0 && probes % self.plan.progress_every == 0 {
                    tracing::info!(
                        identifier = n,
                        probes,
                        last_date = %date,
                        "search still running"
                    );
                    progress::emit(
                        progress,
                        seq,
                        ProgressEventKind::ProbeMilestone {
                            identifier: n,
                            probes,
                            last_date: date,
                        },
                    );
                }

                if hit {
                    tracing::debug!(identifier = n, %date, %url, probes, "candidate found");
                    return Resolution::Found {
                        date,
                        url,
                        filename,
                        probes,
                    };
                }
            }
        }

        tracing::debug!(identifier = n, probes, "offset space exhausted");
        Resolution::NotFound { probes }
    }
}

/// Joins each candidate filename for `(n, d)` onto `base`.
pub fn candidate_urls(
    naming: &NamingScheme,
    base: &Url,
    n: Identifier,
    d: NaiveDate,
) -> Vec<(String, String)> {
    naming
        .candidates(n, d)
        .into_iter()
        .map(|filename| {
            let url = base
                .join(&filename)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{base}{filename}"));
            (filename, url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Records every probed URL; answers true for URLs in `hits`.
    struct ScriptedProber {
        hits: Vec<String>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedProber {
        fn new(hits: Vec<String>) -> Self {
            Self {
                hits,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, url: &str) -> bool {
            self.seen.lock().unwrap().push(url.to_string());
            self.hits.iter().any(|h| h == url)
        }
    }

    fn base() -> Url {
        Url::parse("https://files.example.org/atas/").unwrap()
    }

    #[test]
    fn test_offsets_order_small_plan() {
        let plan = SearchPlan {
            nearby_window_days: 2,
            far_lookahead_days: 8,
            far_step_days: 2,
            progress_every: 0,
        };
        let offsets: Vec<i64> = plan.offsets().collect();
        assert_eq!(offsets, vec![0, 1, -1, 2, -2, 3, 5, 7]);
    }

    #[test]
    fn test_offsets_default_plan_bounded() {
        let plan = SearchPlan::default();
        let offsets: Vec<i64> = plan.offsets().collect();
        // 0, ±1..±30, then 31, 33, …, 119
        assert_eq!(offsets.len(), 1 + 60 + 45);
        assert_eq!(*offsets.last().unwrap(), 119);
        assert!(offsets.iter().all(|o| *o >= -30 && *o <= 120));
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), offsets.len());
    }

    #[test]
    fn test_plan_validation() {
        assert!(SearchPlan::default().validate().is_ok());
        let zero_step = SearchPlan {
            far_step_days: 0,
            ..SearchPlan::default()
        };
        assert!(zero_step.validate().is_err());
        let inverted = SearchPlan {
            nearby_window_days: 40,
            far_lookahead_days: 10,
            ..SearchPlan::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[tokio::test]
    async fn test_found_dashed_uppercase_after_two_days() {
        let naming = NamingScheme::default();
        let plan = SearchPlan::default();
        let base = base();
        let target = format!("{base}COPOM205-not2017-03-22-205.pdf");
        let prober = ScriptedProber::new(vec![target.clone()]);
        let scheduler = SearchScheduler::new(&naming, &plan, &base, &prober);

        let res = scheduler
            .search(205, date(2017, 3, 20), date(2017, 3, 1), &None, &mut 0)
            .await;

        assert_eq!(
            res,
            Resolution::Found {
                date: date(2017, 3, 22),
                url: target.clone(),
                filename: "COPOM205-not2017-03-22-205.pdf".to_string(),
                probes: 16,
            }
        );

        // Dates probed: 20, 21, 19, then 22; nothing later.
        let seen = prober.seen();
        assert_eq!(seen.len(), 16);
        assert_eq!(seen.last().unwrap(), &target);
        let probed_days = ["20", "21", "19", "22"];
        for url in &seen {
            assert!(
                probed_days
                    .iter()
                    .any(|d| url.contains(&format!("201703{d}")) || url.contains(&format!("2017-03-{d}"))),
                "unexpected probe {url}"
            );
        }
    }

    #[tokio::test]
    async fn test_priority_order_wins_over_later_hit() {
        let naming = NamingScheme::default();
        let plan = SearchPlan::default();
        let base = base();
        let earlier = format!("{base}Copom205-not20170321205.pdf");
        let later = format!("{base}COPOM205-not2017-03-22-205.pdf");
        let prober = ScriptedProber::new(vec![later, earlier.clone()]);
        let scheduler = SearchScheduler::new(&naming, &plan, &base, &prober);

        let res = scheduler
            .search(205, date(2017, 3, 20), date(2017, 3, 1), &None, &mut 0)
            .await;

        match res {
            Resolution::Found { date: d, url, .. } => {
                assert_eq!(d, date(2017, 3, 21));
                assert_eq!(url, earlier);
            }
            other => panic!("expected Found, got {other:?}"),
        }
        // offset 0 (4 candidates) then first candidate of offset +1
        assert_eq!(prober.seen().len(), 5);
    }

    #[tokio::test]
    async fn test_lower_bound_skips_dates() {
        let naming = NamingScheme::default();
        let plan = SearchPlan::default();
        let base = base();
        // A hit at or before the lower bound must never be probed.
        let stale = format!("{base}Copom205-not20170319205.pdf");
        let prober = ScriptedProber::new(vec![stale]);
        let scheduler = SearchScheduler::new(&naming, &plan, &base, &prober);

        let res = scheduler
            .search(205, date(2017, 3, 20), date(2017, 3, 19), &None, &mut 0)
            .await;

        assert!(!res.is_found());
        assert!(!prober.seen().iter().any(|u| u.contains("20170319")));
    }

    #[tokio::test]
    async fn test_exhausted_probes_full_space_once() {
        let naming = NamingScheme::default();
        let plan = SearchPlan::default();
        let base = base();
        let prober = ScriptedProber::new(Vec::new());
        let scheduler = SearchScheduler::new(&naming, &plan, &base, &prober);

        // Lower bound well before the window: every offset is eligible.
        let res = scheduler
            .search(230, date(2020, 6, 1), date(2019, 1, 1), &None, &mut 0)
            .await;

        let expected = (plan.offset_count() * 4) as u64;
        assert_eq!(res, Resolution::NotFound { probes: expected });

        let seen = prober.seen();
        assert_eq!(seen.len() as u64, expected);
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seen.len());
    }

    #[tokio::test]
    async fn test_milestones_emitted() {
        let naming = NamingScheme::default();
        let plan = SearchPlan {
            nearby_window_days: 2,
            far_lookahead_days: 2,
            far_step_days: 1,
            progress_every: 8,
        };
        let base = base();
        let prober = ScriptedProber::new(Vec::new());
        let scheduler = SearchScheduler::new(&naming, &plan, &base, &prober);
        let (tx, mut rx) = progress::channel();

        let mut seq = 0;
        let res = scheduler
            .search(1, date(2021, 5, 10), date(2021, 1, 1), &Some(tx), &mut seq)
            .await;

        // 5 offsets × 4 candidates = 20 probes → milestones at 8 and 16.
        assert_eq!(res.probes(), 20);
        let mut milestones = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let ProgressEventKind::ProbeMilestone { probes, .. } = ev.event {
                milestones.push(probes);
            }
        }
        assert_eq!(milestones, vec![8, 16]);
    }

    #[test]
    fn test_candidate_urls_join_base() {
        let naming = NamingScheme::default();
        let urls = candidate_urls(&naming, &base(), 200, date(2016, 7, 20));
        assert_eq!(urls.len(), 4);
        assert_eq!(
            urls[0].1,
            "https://files.example.org/atas/Copom200-not20160720200.pdf"
        );
    }
}
