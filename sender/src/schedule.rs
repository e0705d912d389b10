use chrono::{Duration, NaiveDateTime};

use crate::errors::{Error, Result};

/// Finite sequence of evenly spaced instants between `start` and `end`,
/// both bounds inclusive. A schedule whose start lies after its end is
/// valid and yields nothing.
#[derive(Debug, Clone)]
pub struct Schedule {
    start: NaiveDateTime,
    end: NaiveDateTime,
    interval: Duration,
}

impl Schedule {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            return Err(Error::Config(
                "Interval must be at least 1 minute".to_string(),
            ));
        }
        Ok(Self {
            start,
            end,
            interval: Duration::minutes(i64::from(interval_minutes)),
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Number of instants the iterator will yield.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        let span = (self.end - self.start).num_seconds();
        (span / self.interval.num_seconds()) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh iterator over the instants; may be called any number of times.
    pub fn iter(&self) -> Instants {
        Instants {
            next: self.start,
            end: self.end,
            interval: self.interval,
        }
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = NaiveDateTime;
    type IntoIter = Instants;

    fn into_iter(self) -> Instants {
        self.iter()
    }
}

/// Lazy iterator produced by [`Schedule::iter`].
#[derive(Debug)]
pub struct Instants {
    next: NaiveDateTime,
    end: NaiveDateTime,
    interval: Duration,
}

impl Iterator for Instants {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        if self.next > self.end {
            return None;
        }
        let current = self.next;
        self.next = current + self.interval;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.end {
            0
        } else {
            ((self.end - self.next).num_seconds() / self.interval.num_seconds()) as usize + 1
        };
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_three_element_schedule() {
        let schedule = Schedule::new(instant(0, 0), instant(0, 4), 2).unwrap();

        let instants: Vec<_> = schedule.iter().collect();
        assert_eq!(instants, vec![instant(0, 0), instant(0, 2), instant(0, 4)]);
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn test_first_element_is_start() {
        let schedule = Schedule::new(instant(9, 30), instant(17, 0), 15).unwrap();
        assert_eq!(schedule.iter().next(), Some(instant(9, 30)));
    }

    #[test]
    fn test_consecutive_spacing() {
        let schedule = Schedule::new(instant(0, 0), instant(6, 0), 7).unwrap();
        let instants: Vec<_> = schedule.iter().collect();

        for pair in instants.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_minutes(), 7);
        }
    }

    #[test]
    fn test_nothing_beyond_end() {
        // End does not land on a step; the last instant stops short of it.
        let schedule = Schedule::new(instant(0, 0), instant(0, 5), 2).unwrap();
        let instants: Vec<_> = schedule.iter().collect();

        assert_eq!(instants.last(), Some(&instant(0, 4)));
        assert!(instants.iter().all(|t| *t <= instant(0, 5)));
        assert_eq!(schedule.len(), instants.len());
    }

    #[test]
    fn test_length_formula() {
        // floor((end - start) / interval) + 1
        let schedule = Schedule::new(instant(0, 0), instant(23, 59), 2).unwrap();
        assert_eq!(schedule.len(), 23 * 30 + 29 + 1);
        assert_eq!(schedule.len(), schedule.iter().count());
    }

    #[test]
    fn test_single_element_when_start_equals_end() {
        let schedule = Schedule::new(instant(12, 0), instant(12, 0), 2).unwrap();
        let instants: Vec<_> = schedule.iter().collect();
        assert_eq!(instants, vec![instant(12, 0)]);
    }

    #[test]
    fn test_empty_when_start_after_end() {
        let schedule = Schedule::new(instant(1, 0), instant(0, 0), 2).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.iter().count(), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Schedule::new(instant(0, 0), instant(1, 0), 0).is_err());
    }

    #[test]
    fn test_iterator_is_restartable() {
        let schedule = Schedule::new(instant(0, 0), instant(0, 10), 5).unwrap();
        let first: Vec<_> = schedule.iter().collect();
        let second: Vec<_> = schedule.iter().collect();
        assert_eq!(first, second);
    }
}
