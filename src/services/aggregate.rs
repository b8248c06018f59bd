use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::checkin::Mood;

/// Projection of a check-in used by every aggregate. Fetched ordered by
/// date ascending so "first encountered" tie-breaks are deterministic.
#[derive(Debug, Clone, FromRow)]
pub struct CheckinRow {
    pub date: NaiveDate,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub tags: Vec<String>,
}

/// Projection of a journal entry for the stats rollup.
#[derive(Debug, Clone, FromRow)]
pub struct JournalRow {
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RangeSummary {
    pub average_focus: i32,
    pub average_mood: f64,
    pub entry_count: usize,
    pub common_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub mood: Mood,
    pub focus_percent: i32,
}

#[derive(Debug, Serialize)]
pub struct WeeklySummary {
    pub days: Vec<DaySummary>,
    pub average_focus: i32,
    pub most_common_mood: Mood,
}

/// Weekly summary failure conditions; the handler maps these onto the
/// NotFound / DataQuality error kinds.
#[derive(Debug, PartialEq, Eq)]
pub enum WeeklySummaryError {
    /// No day in the trailing window has any data.
    Empty,
    /// A day is present but missing its mood or focus value.
    MissingFields,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub average_focus: i32,
    pub mood_distribution: BTreeMap<String, i64>,
    pub focus_trend: Vec<WeekFocus>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WeekFocus {
    pub week: String,
    pub average_focus: i32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct WeekOverview {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub average_focus: f64,
    pub common_tags: Vec<String>,
    pub entry_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JournalStats {
    pub total_entries: usize,
    pub average_focus: f64,
    pub most_common_moods: Vec<Mood>,
    pub most_used_tags: Vec<String>,
}

/// Stored tags may arrive as real lists or as comma-joined strings inside a
/// single element. Splits on commas, trims, and drops empties, so
/// `["work, focus ,  "]` normalizes to `["work", "focus"]`.
pub fn normalize_tags<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .flat_map(|t| t.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Frequency count preserving first-seen insertion order; ranking then uses
/// a stable sort so ties stay in that order.
fn count_first_seen<I>(items: I) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: Vec<(String, i64)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(k, _)| *k == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

fn rank_desc(mut counts: Vec<(String, i64)>) -> Vec<(String, i64)> {
    counts.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
    counts
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean_i32(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

/// Aggregates a date range of check-ins: mean focus (rounded int), ordinal
/// mean mood (one decimal), row count, and the top-3 tags. An empty range
/// yields the all-zero summary rather than an error.
pub fn analyze_range(rows: &[CheckinRow]) -> RangeSummary {
    if rows.is_empty() {
        return RangeSummary {
            average_focus: 0,
            average_mood: 0.0,
            entry_count: 0,
            common_tags: vec![],
        };
    }

    let focus: Vec<i32> = rows.iter().filter_map(|r| r.focus_percent).collect();
    let moods: Vec<i32> = rows.iter().filter_map(|r| r.mood.map(Mood::score)).collect();

    let all_tags = rows
        .iter()
        .flat_map(|r| normalize_tags(r.tags.iter().map(String::as_str)));
    let common_tags = rank_desc(count_first_seen(all_tags))
        .into_iter()
        .take(3)
        .map(|(tag, _)| tag)
        .collect();

    RangeSummary {
        average_focus: mean_i32(&focus).map(|m| m.round() as i32).unwrap_or(0),
        average_mood: mean_i32(&moods).map(round1).unwrap_or(0.0),
        entry_count: rows.len(),
        common_tags,
    }
}

/// Rolls the trailing week up into per-day entries plus whole-window
/// averages. Rows must be ascending by date. Days with multiple rows are
/// tolerated (folded by mean focus and modal mood) even though the store's
/// uniqueness constraint normally makes them singletons.
pub fn weekly_summary(rows: &[CheckinRow]) -> Result<WeeklySummary, WeeklySummaryError> {
    if rows.is_empty() {
        return Err(WeeklySummaryError::Empty);
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<&CheckinRow>> = BTreeMap::new();
    for row in rows {
        by_day.entry(row.date).or_default().push(row);
    }

    let mut days = Vec::with_capacity(by_day.len());
    for (date, group) in &by_day {
        let focus: Vec<i32> = group.iter().filter_map(|r| r.focus_percent).collect();
        let moods = group.iter().filter_map(|r| r.mood.map(|m| m.as_str().to_string()));
        let modal = rank_desc(count_first_seen(moods)).into_iter().next();

        // Partial weeks with gaps are fine; a present day missing either
        // field is a data-quality failure.
        let (Some(focus_mean), Some((mood_name, _))) = (mean_i32(&focus), modal) else {
            return Err(WeeklySummaryError::MissingFields);
        };
        days.push(DaySummary {
            date: *date,
            mood: mood_from_name(&mood_name),
            focus_percent: focus_mean.round() as i32,
        });
    }

    let day_focus: Vec<i32> = days.iter().map(|d| d.focus_percent).collect();
    let mood_names = days.iter().map(|d| d.mood.as_str().to_string());
    let (most_common, _) = rank_desc(count_first_seen(mood_names))
        .into_iter()
        .next()
        .ok_or(WeeklySummaryError::Empty)?;

    Ok(WeeklySummary {
        average_focus: mean_i32(&day_focus).map(|m| m.round() as i32).unwrap_or(0),
        most_common_mood: mood_from_name(&most_common),
        days,
    })
}

fn mood_from_name(name: &str) -> Mood {
    match name {
        "bad" => Mood::Bad,
        "okay" => Mood::Okay,
        "good" => Mood::Good,
        _ => Mood::Great,
    }
}

/// Month-to-date rollup: overall mean focus, a histogram of mood values,
/// and a focus trend bucketed by ISO week (weeks without any focus value
/// are skipped).
pub fn monthly_summary(rows: &[CheckinRow]) -> MonthlySummary {
    let focus: Vec<i32> = rows.iter().filter_map(|r| r.focus_percent).collect();

    let mut mood_distribution: BTreeMap<String, i64> = BTreeMap::new();
    for mood in rows.iter().filter_map(|r| r.mood) {
        *mood_distribution.entry(mood.as_str().to_string()).or_insert(0) += 1;
    }

    // Bucket by the Monday of each ISO week so the trend stays chronological.
    let mut weeks: BTreeMap<NaiveDate, Vec<i32>> = BTreeMap::new();
    for row in rows {
        let monday = row.date - Duration::days(row.date.weekday().num_days_from_monday() as i64);
        let bucket = weeks.entry(monday).or_default();
        if let Some(f) = row.focus_percent {
            bucket.push(f);
        }
    }
    let focus_trend = weeks
        .into_iter()
        .filter_map(|(monday, focus)| {
            let iso = monday.iso_week();
            mean_i32(&focus).map(|m| WeekFocus {
                week: format!("{}-W{:02}", iso.year(), iso.week()),
                average_focus: m.round() as i32,
            })
        })
        .collect();

    MonthlySummary {
        average_focus: mean_i32(&focus).map(|m| m.round() as i32).unwrap_or(0),
        mood_distribution,
        focus_trend,
    }
}

/// Ranks already-normalized tags by frequency descending, ties in
/// first-seen order.
pub fn rank_tag_counts<I>(tags: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = String>,
{
    rank_desc(count_first_seen(tags))
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect()
}

/// Every tag the user has ever used, ranked by frequency descending. No
/// top-N cap; ties keep first-seen order.
pub fn tag_summary(rows: &[CheckinRow]) -> Vec<TagCount> {
    let all_tags = rows
        .iter()
        .flat_map(|r| normalize_tags(r.tags.iter().map(String::as_str)));
    rank_tag_counts(all_tags)
}

/// Journal-side weekly overview: mean focus to two decimals, entry count,
/// and the top-5 lowercased tags. Returns None for an empty week.
pub fn weekly_overview(
    rows: &[CheckinRow],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<WeekOverview> {
    if rows.is_empty() {
        return None;
    }

    let focus: Vec<i32> = rows.iter().filter_map(|r| r.focus_percent).collect();
    let all_tags = rows.iter().flat_map(|r| {
        normalize_tags(r.tags.iter().map(String::as_str))
            .into_iter()
            .map(|t| t.to_lowercase())
    });
    let common_tags = rank_desc(count_first_seen(all_tags))
        .into_iter()
        .take(5)
        .map(|(tag, _)| tag)
        .collect();

    Some(WeekOverview {
        start_date,
        end_date,
        average_focus: mean_i32(&focus).map(round2).unwrap_or(0.0),
        common_tags,
        entry_count: rows.len(),
    })
}

/// Journal stats rollup: entry count, mean focus to two decimals, top-3
/// moods and top-3 lowercased tags.
pub fn journal_stats(rows: &[JournalRow]) -> JournalStats {
    let focus: Vec<i32> = rows.iter().filter_map(|r| r.focus_percent).collect();

    let mood_names = rows
        .iter()
        .filter_map(|r| r.mood.map(|m| m.as_str().to_string()));
    let most_common_moods = rank_desc(count_first_seen(mood_names))
        .into_iter()
        .take(3)
        .map(|(name, _)| mood_from_name(&name))
        .collect();

    let all_tags = rows.iter().flat_map(|r| {
        normalize_tags(r.tags.iter().map(String::as_str))
            .into_iter()
            .map(|t| t.to_lowercase())
    });
    let most_used_tags = rank_desc(count_first_seen(all_tags))
        .into_iter()
        .take(3)
        .map(|(tag, _)| tag)
        .collect();

    JournalStats {
        total_entries: rows.len(),
        average_focus: mean_i32(&focus).map(round2).unwrap_or(0.0),
        most_common_moods,
        most_used_tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(date: &str, mood: Option<Mood>, focus: Option<i32>, tags: &[&str]) -> CheckinRow {
        CheckinRow {
            date: d(date),
            mood,
            focus_percent: focus,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn empty_range_yields_zeros_not_error() {
        let summary = analyze_range(&[]);
        assert_eq!(
            summary,
            RangeSummary {
                average_focus: 0,
                average_mood: 0.0,
                entry_count: 0,
                common_tags: vec![],
            }
        );
    }

    #[test]
    fn range_averages_and_modal_mood() {
        let rows = [
            row("2025-05-01", Some(Mood::Good), Some(80), &["work"]),
            row("2025-05-02", Some(Mood::Good), Some(90), &["work", "focus"]),
            row("2025-05-03", Some(Mood::Great), Some(100), &["rest"]),
        ];
        let summary = analyze_range(&rows);
        assert_eq!(summary.average_focus, 90);
        assert_eq!(summary.average_mood, 3.3); // (3+3+4)/3 rounded to 1dp
        assert_eq!(summary.entry_count, 3);
        assert_eq!(summary.common_tags[0], "work");

        let weekly = weekly_summary(&rows).unwrap();
        assert_eq!(weekly.average_focus, 90);
        assert_eq!(weekly.most_common_mood, Mood::Good);
        assert_eq!(weekly.days.len(), 3);
    }

    #[test]
    fn comma_joined_tags_normalize_like_lists() {
        assert_eq!(normalize_tags(["work, focus ,  "]), vec!["work", "focus"]);
        assert_eq!(normalize_tags(["work", "focus"]), vec!["work", "focus"]);
    }

    #[test]
    fn tag_ties_keep_first_seen_order() {
        let rows = [
            row("2025-05-01", None, Some(50), &["beta", "alpha"]),
            row("2025-05-02", None, Some(50), &["alpha", "beta", "gamma"]),
        ];
        let ranked = tag_summary(&rows);
        assert_eq!(
            ranked,
            vec![
                TagCount { tag: "beta".into(), count: 2 },
                TagCount { tag: "alpha".into(), count: 2 },
                TagCount { tag: "gamma".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn weekly_summary_empty_window() {
        assert!(matches!(weekly_summary(&[]), Err(WeeklySummaryError::Empty)));
    }

    #[test]
    fn weekly_summary_rejects_partial_days() {
        let rows = [
            row("2025-05-01", Some(Mood::Good), Some(80), &[]),
            row("2025-05-02", None, Some(90), &[]),
        ];
        assert!(matches!(
            weekly_summary(&rows),
            Err(WeeklySummaryError::MissingFields)
        ));

        let rows = [row("2025-05-01", Some(Mood::Good), None, &[])];
        assert!(matches!(
            weekly_summary(&rows),
            Err(WeeklySummaryError::MissingFields)
        ));
    }

    #[test]
    fn monthly_summary_buckets_by_iso_week() {
        let rows = [
            // 2025-06-02 is a Monday
            row("2025-06-02", Some(Mood::Good), Some(60), &[]),
            row("2025-06-03", Some(Mood::Bad), Some(80), &[]),
            row("2025-06-09", Some(Mood::Good), Some(100), &[]),
            // a row with no focus contributes to mood counts only
            row("2025-06-10", Some(Mood::Okay), None, &[]),
        ];
        let summary = monthly_summary(&rows);
        assert_eq!(summary.average_focus, 80);
        assert_eq!(summary.mood_distribution.get("good"), Some(&2));
        assert_eq!(summary.mood_distribution.get("bad"), Some(&1));
        assert_eq!(
            summary.focus_trend,
            vec![
                WeekFocus { week: "2025-W23".into(), average_focus: 70 },
                WeekFocus { week: "2025-W24".into(), average_focus: 100 },
            ]
        );
    }

    #[test]
    fn monthly_summary_skips_focusless_weeks() {
        let rows = [
            row("2025-06-02", Some(Mood::Good), None, &[]),
            row("2025-06-09", Some(Mood::Good), Some(90), &[]),
        ];
        let summary = monthly_summary(&rows);
        assert_eq!(summary.focus_trend.len(), 1);
        assert_eq!(summary.focus_trend[0].week, "2025-W24");
    }

    #[test]
    fn weekly_overview_lowercases_and_caps_tags() {
        let rows = [
            row("2025-05-01", None, Some(70), &["Work", "deep, Work"]),
            row("2025-05-02", None, Some(75), &["work"]),
        ];
        let overview = weekly_overview(&rows, d("2025-04-26"), d("2025-05-02")).unwrap();
        assert_eq!(overview.average_focus, 72.5);
        assert_eq!(overview.entry_count, 2);
        assert_eq!(overview.common_tags, vec!["work", "deep"]);
        assert!(weekly_overview(&[], d("2025-04-26"), d("2025-05-02")).is_none());
    }

    #[test]
    fn journal_stats_rollup() {
        let rows = [
            JournalRow { mood: Some(Mood::Good), focus_percent: Some(70), tags: vec!["A".into()] },
            JournalRow { mood: Some(Mood::Good), focus_percent: Some(75), tags: vec!["a".into(), "b".into()] },
            JournalRow { mood: Some(Mood::Bad), focus_percent: None, tags: vec![] },
        ];
        let stats = journal_stats(&rows);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.average_focus, 72.5);
        assert_eq!(stats.most_common_moods, vec![Mood::Good, Mood::Bad]);
        assert_eq!(stats.most_used_tags, vec!["a", "b"]);
    }

    #[test]
    fn journal_stats_empty_journal_is_zeros() {
        let stats = journal_stats(&[]);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.average_focus, 0.0);
        assert!(stats.most_common_moods.is_empty());
        assert!(stats.most_used_tags.is_empty());
    }
}
