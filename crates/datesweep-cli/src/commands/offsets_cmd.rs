//! `datesweep offsets`: print the day offsets in probe order.

use anyhow::Result;
use datesweep::SweepConfig;

use crate::output::{print_json, OutputMode};

pub fn run(config: &SweepConfig, mode: OutputMode) -> Result<()> {
    config.search.validate()?;
    let offsets: Vec<i64> = config.search.offsets().collect();

    if mode.is_json() {
        return print_json(&serde_json::json!({
            "count": offsets.len(),
            "offsets": offsets,
        }));
    }
    if !mode.is_quiet() {
        println!(
            "{} offsets (window ±{}, lookahead {} step {})",
            offsets.len(),
            config.search.nearby_window_days,
            config.search.far_lookahead_days,
            config.search.far_step_days
        );
    }
    let line: Vec<String> = offsets.iter().map(|o| format!("{o:+}")).collect();
    println!("{}", line.join(" "));
    Ok(())
}
