//! `datesweep candidates`: show the URLs that would be probed for one date.

use anyhow::Result;
use chrono::NaiveDate;
use datesweep::{candidate_urls, Identifier, SweepConfig};

use crate::output::{print_json, OutputMode};

pub fn run(config: &SweepConfig, n: Identifier, date: NaiveDate, mode: OutputMode) -> Result<()> {
    config.naming.validate()?;
    let base = config.parsed_base_url()?;
    let urls = candidate_urls(&config.naming, &base, n, date);

    if mode.is_json() {
        let items: Vec<_> = urls
            .iter()
            .map(|(filename, url)| serde_json::json!({ "filename": filename, "url": url }))
            .collect();
        return print_json(&items);
    }
    for (_, url) in &urls {
        println!("{url}");
    }
    Ok(())
}
