//! Daily report push to subscribed chats

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;

use crate::bot::{BotContext, Outbox, deliver_all};
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};

/// Result of one push round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Next instant strictly after `now` at which the local clock in `tz` reads
/// `time`.
///
/// On DST-ambiguous days the earlier instant is used; when `time` falls in a
/// DST gap the run happens one hour later in local terms.
pub fn next_run_after(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    loop {
        if let Some(at) = local_instant(date, time, tz)
            && at > now
        {
            return at;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => return now,
        };
    }
}

fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
}

/// Sends the daily report to every subscriber
pub struct DailyPush {
    ctx: Arc<BotContext>,
    outbox: Arc<dyn Outbox>,
    logger: StructuredLogger,
}

impl DailyPush {
    pub fn new(ctx: Arc<BotContext>, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            ctx,
            outbox,
            logger: get_logger("scheduler"),
        }
    }

    async fn push_to(&self, chat_id: i64, date: NaiveDate) -> Result<()> {
        let actions = self.ctx.report_messages(chat_id, date, false).await?;
        deliver_all(self.outbox.as_ref(), actions).await
    }

    /// Push the report for `date` to every subscriber, one at a time.
    ///
    /// A failure for one chat is logged and counted; the remaining chats
    /// are still served.
    pub async fn push(&self, date: NaiveDate) -> PushOutcome {
        let subscribers = self.ctx.settings.subscribers();
        self.logger.info(&format!(
            "Starting daily push for {} to {} subscribers",
            date,
            subscribers.len()
        ));

        let mut outcome = PushOutcome::default();
        for chat_id in subscribers {
            match self.push_to(chat_id, date).await {
                Ok(()) => {
                    outcome.sent += 1;
                    self.logger
                        .for_chat(chat_id)
                        .debug(&format!("Daily report for {} sent", date));
                }
                Err(e) => {
                    outcome.failed += 1;
                    self.logger
                        .for_chat(chat_id)
                        .error(&format!("Daily report for {} failed: {}", date, e));
                }
            }
        }

        self.logger.info(&format!(
            "Daily push for {} done: {} sent, {} failed",
            date, outcome.sent, outcome.failed
        ));
        outcome
    }

    /// Run the push every day at `time` in `tz` until `shutdown` flips to true
    pub async fn run(self, time: NaiveTime, tz: Tz, mut shutdown: watch::Receiver<bool>) {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, time, tz);
            let wait = (next - now).to_std().unwrap_or_default();
            self.logger
                .info(&format!("Next daily push at {}", next.with_timezone(&tz)));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let date = next.with_timezone(&tz).date_naive();
                    self.push(date).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.logger.info("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn later_today() {
        // 06:00 Madrid (winter, UTC+1)
        let next = next_run_after(utc("2022-01-03T05:00:00Z"), eight(), chrono_tz::Europe::Madrid);
        assert_eq!(next, utc("2022-01-03T07:00:00Z"));
    }

    #[test]
    fn tomorrow_when_passed() {
        let next = next_run_after(utc("2022-01-03T07:00:00Z"), eight(), chrono_tz::Europe::Madrid);
        assert_eq!(next, utc("2022-01-04T07:00:00Z"));
    }

    #[test]
    fn summer_offset() {
        let next = next_run_after(utc("2022-07-01T00:00:00Z"), eight(), chrono_tz::Europe::Madrid);
        assert_eq!(next, utc("2022-07-01T06:00:00Z"));
    }

    #[test]
    fn dst_gap_moves_one_hour_later() {
        // 2022-03-27 02:00 does not exist in Madrid
        let two = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let next = next_run_after(utc("2022-03-26T23:30:00Z"), two, chrono_tz::Europe::Madrid);
        assert_eq!(next, utc("2022-03-27T01:00:00Z"));
    }
}
