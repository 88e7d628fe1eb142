//! Off-peak schedule labels such as `HC (0H50-6H50;14H50-16H50)`

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static SCHEDULE_TYPE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^([A-Z]+)").ok());
static TIME_RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(\d+)H(\d+)-(\d+)H(\d+)").ok());

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One range, in minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffPeakRange {
    pub start_minutes: u32,
    pub end_minutes: u32,
}

impl OffPeakRange {
    /// Ranges ending before they start run past midnight
    pub fn duration_minutes(&self) -> u32 {
        if self.end_minutes >= self.start_minutes {
            self.end_minutes - self.start_minutes
        } else {
            MINUTES_PER_DAY - self.start_minutes + self.end_minutes
        }
    }

    /// Both ends inclusive
    pub fn contains(&self, minute_of_day: u32) -> bool {
        if self.end_minutes <= self.start_minutes {
            minute_of_day >= self.start_minutes || minute_of_day <= self.end_minutes
        } else {
            (self.start_minutes..=self.end_minutes).contains(&minute_of_day)
        }
    }

    pub fn start_label(&self) -> String {
        clock(self.start_minutes)
    }

    pub fn end_label(&self) -> String {
        clock(self.end_minutes)
    }
}

fn clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OffPeakSchedule {
    /// Leading label prefix, e.g. `HC`
    pub kind: Option<String>,
    pub ranges: Vec<OffPeakRange>,
}

impl OffPeakSchedule {
    /// Unparseable parts are skipped; an empty label gives an empty schedule
    pub fn parse(label: &str) -> Self {
        let kind = SCHEDULE_TYPE
            .as_ref()
            .and_then(|re| re.captures(label))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let ranges = TIME_RANGE
            .as_ref()
            .map(|re| {
                re.captures_iter(label)
                    .filter_map(|c| {
                        let part = |i: usize| c.get(i)?.as_str().parse::<u32>().ok();
                        let minutes = |h: usize, m: usize| {
                            part(h)?.checked_mul(60)?.checked_add(part(m)?)
                        };
                        Some(OffPeakRange {
                            start_minutes: minutes(1, 2)?,
                            end_minutes: minutes(3, 4)?,
                        })
                    })
                    .filter(|r| r.start_minutes <= MINUTES_PER_DAY && r.end_minutes <= MINUTES_PER_DAY)
                    .collect()
            })
            .unwrap_or_default();

        Self { kind, ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn total_minutes(&self) -> u32 {
        self.ranges.iter().map(OffPeakRange::duration_minutes).sum()
    }

    /// Total hours rounded to two decimals
    pub fn total_hours(&self) -> f64 {
        (self.total_minutes() as f64 / 60.0 * 100.0).round() / 100.0
    }

    /// Whether a local wall-clock time is off-peak
    pub fn is_off_peak(&self, time: NaiveTime) -> bool {
        let minute = time.hour() * 60 + time.minute();
        self.ranges.iter().any(|r| r.contains(minute))
    }
}
