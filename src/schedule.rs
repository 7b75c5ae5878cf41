//! Recurring pass triggers
//!
//! Schedule mode runs the same pass as one-shot mode, repeatedly. The next
//! fire time is computed only after the previous pass has returned, so two
//! passes never overlap on the same offset file.
//!
//! # Trigger Formats
//! - Cron, 5 fields: `*/5 * * * *` (seconds default to 0)
//! - Cron, 6 or 7 fields: `0 */5 * * * *`
//! - Cron descriptors: `@hourly`, `@daily`, `@weekly`, `@monthly`, `@yearly`
//! - Fixed interval: `@every 30s`, `@every 5m`, `@every 1h`

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use crate::config::parse_duration;

/// When to run the next pass.
#[derive(Debug, Clone)]
pub enum Trigger {
    Cron(Box<Schedule>),
    Every(Duration),
}

impl FromStr for Trigger {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(interval) = s.strip_prefix("@every") {
            let every = parse_duration(interval)
                .with_context(|| format!("Invalid interval in schedule '{s}'"))?;
            if every.is_zero() {
                anyhow::bail!("Schedule interval must be greater than zero");
            }
            return Ok(Trigger::Every(every));
        }

        let expr = if !s.starts_with('@') && s.split_whitespace().count() == 5 {
            format!("0 {s}")
        } else {
            s.to_string()
        };

        let schedule =
            Schedule::from_str(&expr).map_err(|e| anyhow!("Invalid cron schedule '{s}': {e}"))?;
        Ok(Trigger::Cron(Box::new(schedule)))
    }
}

impl Trigger {
    /// Next fire time strictly after `now`, or `None` when the schedule has
    /// no upcoming times.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Cron(schedule) => schedule.after(&now).next(),
            Trigger::Every(every) => chrono::Duration::from_std(*every)
                .ok()
                .and_then(|every| now.checked_add_signed(every)),
        }
    }

    /// How long to wait from now until the next pass.
    pub fn delay_from_now(&self) -> Option<Duration> {
        match self {
            Trigger::Every(every) => Some(*every),
            Trigger::Cron(_) => {
                let now = Utc::now();
                let next = self.next_after(now)?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

/// Run `pass` on every tick of `trigger` until `shutdown` resolves.
///
/// Shutdown is only observed between passes; a pass that has started always
/// runs to completion. Returns the number of passes run.
pub async fn run_scheduled<F, Fut, S>(trigger: &Trigger, shutdown: S, mut pass: F) -> u64
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut passes = 0;

    loop {
        let Some(delay) = trigger.delay_from_now() else {
            tracing::warn!("Schedule has no upcoming run times, stopping");
            break;
        };
        tracing::debug!("Next pass in {:?}", delay);

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping schedule after {passes} passes");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        pass().await;
        passes += 1;
    }

    passes
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::cell::Cell;

    #[test]
    fn test_parse_every() {
        match "@every 5m".parse::<Trigger>().unwrap() {
            Trigger::Every(d) => assert_eq!(d, Duration::from_secs(300)),
            other => panic!("unexpected trigger: {other:?}"),
        }
        assert!("@every 0s".parse::<Trigger>().is_err());
        assert!("@every soon".parse::<Trigger>().is_err());
    }

    #[test]
    fn test_parse_five_field_cron() {
        let trigger: Trigger = "*/15 * * * *".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 30).unwrap();

        let next = trigger.next_after(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_six_field_cron() {
        let trigger: Trigger = "30 * * * * *".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 31).unwrap();

        let next = trigger.next_after(now).unwrap();
        assert_eq!(next.second(), 30);
        assert_eq!(next.minute(), 8);
    }

    #[test]
    fn test_parse_descriptor() {
        let trigger: Trigger = "@hourly".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 31).unwrap();

        assert_eq!(
            trigger.next_after(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid_cron() {
        assert!("every now and then".parse::<Trigger>().is_err());
        assert!("* * *".parse::<Trigger>().is_err());
    }

    #[test]
    fn test_every_next_after() {
        let trigger = Trigger::Every(Duration::from_secs(90));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            trigger.next_after(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_scheduled_until_shutdown() {
        let trigger = Trigger::Every(Duration::from_secs(60));
        let count = Cell::new(0);

        let passes = run_scheduled(
            &trigger,
            tokio::time::sleep(Duration::from_secs(150)),
            || {
                count.set(count.get() + 1);
                async {}
            },
        )
        .await;

        assert_eq!(passes, 2);
        assert_eq!(count.get(), 2);
    }

    /// A slow pass delays the next tick instead of overlapping with it.
    #[tokio::test(start_paused = true)]
    async fn test_run_scheduled_never_overlaps() {
        let trigger = Trigger::Every(Duration::from_secs(10));
        let running_flag = Cell::new(false);
        let overlapped = Cell::new(false);
        let running = &running_flag;

        let passes = run_scheduled(
            &trigger,
            tokio::time::sleep(Duration::from_secs(95)),
            || {
                if running.get() {
                    overlapped.set(true);
                }
                running.set(true);
                async move {
                    tokio::time::sleep(Duration::from_secs(20)).await;
                    running.set(false);
                }
            },
        )
        .await;

        assert!(!overlapped.get());
        // Ticks start at 10, 40, 70; each pass takes 20s
        assert_eq!(passes, 3);
    }
}
