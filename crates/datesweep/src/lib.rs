//! datesweep: discovery engine for sequentially numbered documents whose
//! dates and exact remote filenames are not published.
//!
//! For each identifier the engine guesses a date from the previous one,
//! probes candidate filenames around it, downloads the first match and
//! records the outcome in a ledger.

pub mod candidate;
pub mod config;
pub mod driver;
pub mod fetch;
pub mod http_client;
pub mod ledger;
pub mod local;
pub mod probe;
pub mod progress;
pub mod search;
pub mod types;

pub use candidate::NamingScheme;
pub use config::{Pacing, RunBounds, Seed, SweepConfig};
pub use driver::{RunReport, SequenceDriver};
pub use fetch::{FetchOutcome, Fetcher, HttpFetcher};
pub use http_client::{HttpClient, HttpSettings};
pub use ledger::{Ledger, LedgerRecord};
pub use local::list_local_resources;
pub use probe::{HttpProber, Prober};
pub use search::{candidate_urls, SearchPlan, SearchScheduler};
pub use types::*;
