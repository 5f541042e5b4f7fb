//! Daily trigger for unattended curation.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};

use crate::curation::{CurationOutcome, Curator};

/// Wall-clock time of day at which curation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// The first trigger strictly after `now`.
    ///
    /// Days on which the trigger time does not exist locally (a DST gap) are
    /// skipped.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut date = now.date_naive();

        loop {
            if let Some(candidate) = tz.from_local_datetime(&date.and_time(self.time())).earliest() {
                if candidate > *now {
                    return candidate;
                }
            }
            match date.checked_add_days(Days::new(1)) {
                Some(next) => date = next,
                None => return now.clone(),
            }
        }
    }
}

/// Run curation every day at `schedule` until interrupted.
///
/// With `run_now`, one run happens immediately at startup as well.
pub async fn run_daily(curator: Curator, schedule: DailySchedule, run_now: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Scheduler started, curation runs daily at {:02}:{:02}",
        schedule.hour,
        schedule.minute
    );

    if run_now {
        log_outcome(&curator.run_daily_curation().await);
    }

    loop {
        let now = Local::now();
        let next = schedule.next_run_after(&now);
        let wait = (next.clone() - now).to_std().unwrap_or_default();
        tracing::info!("Next curation at {}", next.format("%Y-%m-%d %H:%M %Z"));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                log_outcome(&curator.run_daily_curation().await);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Scheduler stopped");
                return Ok(());
            }
        }
    }
}

fn log_outcome(outcome: &CurationOutcome) {
    match outcome {
        CurationOutcome::Completed(report) => {
            for article in &report.articles {
                tracing::info!("Curated: {}", article.title);
            }
        }
        CurationOutcome::Failed(failure) => {
            tracing::warn!("Scheduled curation failed at {}: {}", failure.stage, failure.error);
        }
    }
}
