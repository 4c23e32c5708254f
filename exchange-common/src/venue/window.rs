//! Time-range pagination for history endpoints.
//!
//! Several Binance history endpoints reject a `startTime`/`endTime` pair that
//! spans more than 90 days. [`TimeRange::split`] cuts a long range into
//! contiguous sub-ranges no longer than a maximum span, and
//! [`fetch_windowed`] issues one request per sub-range, in order, one at a
//! time.
//!
//! Ranges are inclusive on both ends and unit-agnostic; the Binance client
//! uses milliseconds.

use std::future::Future;

use tracing::debug;

use crate::venue::error::{VenueError, VenueResult};

/// Most sub-ranges a single split may produce.
pub const MAX_WINDOWS: u64 = 1_000_000;

/// Inclusive `[start, end]` interval of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: i64, end: i64) -> VenueResult<Self> {
        if start > end {
            return Err(VenueError::InvalidRequest(format!(
                "time range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First timestamp covered.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last timestamp covered.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Distance from start to end.
    pub fn span(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    /// Returns true if `ts` falls inside the range.
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Split into the fewest sub-ranges whose span is at most `max_span`.
    ///
    /// A range whose span is already within `max_span` comes back whole.
    /// Otherwise sub-ranges start at `start`, `start + max_span`, ... and the
    /// last one is clipped to `end`.
    pub fn split(&self, max_span: i64) -> VenueResult<Vec<TimeRange>> {
        if max_span <= 0 {
            return Err(VenueError::InvalidRequest(format!(
                "maximum window span must be positive, got {}",
                max_span
            )));
        }

        let max_span_units = max_span.unsigned_abs();
        if self.span() <= max_span_units {
            return Ok(vec![*self]);
        }

        let count = self.span() / max_span_units + 1;
        if count > MAX_WINDOWS {
            return Err(VenueError::InvalidRequest(format!(
                "time range {}..={} needs {} windows of {}, limit is {}",
                self.start, self.end, count, max_span, MAX_WINDOWS
            )));
        }

        let mut windows = Vec::with_capacity(count as usize);
        let mut cursor = self.start;
        loop {
            let window_end = cursor.saturating_add(max_span - 1).min(self.end);
            windows.push(TimeRange {
                start: cursor,
                end: window_end,
            });
            if window_end == self.end {
                break;
            }
            cursor = window_end + 1;
        }

        Ok(windows)
    }
}

/// Fetch every sub-range of `range` in order and concatenate the results.
///
/// Sub-requests run strictly one after another. The first error aborts the
/// whole fetch and the records gathered so far are dropped. No
/// de-duplication happens here.
pub async fn fetch_windowed<T, F, Fut>(
    range: TimeRange,
    max_span: i64,
    mut fetch: F,
) -> VenueResult<Vec<T>>
where
    F: FnMut(TimeRange) -> Fut,
    Fut: Future<Output = VenueResult<Vec<T>>>,
{
    let windows = range.split(max_span)?;
    let total = windows.len();
    let mut records = Vec::new();

    for (idx, window) in windows.into_iter().enumerate() {
        debug!(
            window = idx + 1,
            total,
            start = window.start,
            end = window.end,
            "fetching window"
        );
        let mut batch = fetch(window).await?;
        records.append(&mut batch);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;
    const NINETY_DAYS_MS: i64 = 90 * DAY_MS;

    #[test]
    fn test_reversed_range_is_rejected() {
        assert!(matches!(
            TimeRange::new(10, 9),
            Err(VenueError::InvalidRequest(_))
        ));
        assert!(TimeRange::new(10, 10).is_ok());
    }

    #[test]
    fn test_short_range_is_single_window() {
        let range = TimeRange::new(0, NINETY_DAYS_MS).unwrap();
        assert_eq!(range.split(NINETY_DAYS_MS).unwrap(), vec![range]);
    }

    #[test]
    fn test_ninety_days_plus_one_second() {
        let start = 1_500_001_200_000;
        let end = start + NINETY_DAYS_MS + 1_000;
        let windows = TimeRange::new(start, end)
            .unwrap()
            .split(NINETY_DAYS_MS)
            .unwrap();

        assert_eq!(
            windows,
            vec![
                TimeRange::new(start, start + NINETY_DAYS_MS - 1).unwrap(),
                TimeRange::new(start + NINETY_DAYS_MS, end).unwrap(),
            ]
        );
    }

    #[test]
    fn test_final_window_is_clipped() {
        let windows = TimeRange::new(0, 25).unwrap().split(10).unwrap();
        let bounds: Vec<(i64, i64)> = windows.iter().map(|w| (w.start(), w.end())).collect();
        assert_eq!(bounds, vec![(0, 9), (10, 19), (20, 25)]);
    }

    #[test]
    fn test_zero_span_is_rejected() {
        let range = TimeRange::new(0, 10).unwrap();
        assert!(range.split(0).is_err());
    }

    #[test]
    fn test_range_ending_at_max_terminates() {
        let range = TimeRange::new(i64::MAX - 25, i64::MAX).unwrap();
        let windows = range.split(10).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows.last().unwrap().end(), i64::MAX);
    }

    #[test]
    fn test_full_i64_range_does_not_overflow() {
        let range = TimeRange::new(i64::MIN, i64::MAX).unwrap();
        assert_eq!(range.span(), u64::MAX);
        assert_eq!(range.split(i64::MAX).unwrap().len(), 3);
        assert!(matches!(
            range.split(1000),
            Err(VenueError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_window_limit() {
        let range = TimeRange::new(0, MAX_WINDOWS as i64 * 10 - 1).unwrap();
        assert_eq!(range.split(10).unwrap().len() as u64, MAX_WINDOWS);

        let range = TimeRange::new(0, MAX_WINDOWS as i64 * 10).unwrap();
        assert!(range.split(10).is_err());
    }

    #[tokio::test]
    async fn test_fetch_windowed_concatenates_in_order() {
        let range = TimeRange::new(0, 25).unwrap();
        let records = fetch_windowed(range, 10, |w| async move { Ok(vec![w.start(), w.end()]) })
            .await
            .unwrap();
        assert_eq!(records, vec![0, 9, 10, 19, 20, 25]);
    }

    #[tokio::test]
    async fn test_fetch_windowed_aborts_on_first_error() {
        let range = TimeRange::new(0, 49).unwrap();
        let mut calls = Vec::new();

        let result: VenueResult<Vec<i64>> = fetch_windowed(range, 10, |w| {
            calls.push(w.start());
            async move {
                if w.start() == 20 {
                    Err(VenueError::remote("capital/deposit/hisrec", 500, "boom"))
                } else {
                    Ok(vec![w.start()])
                }
            }
        })
        .await;

        assert!(matches!(result, Err(VenueError::Remote { status: 500, .. })));
        assert_eq!(calls, vec![0, 10, 20]);
    }
}
