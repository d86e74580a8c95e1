use serde::Serialize;

/// Fixed histogram bands for overall student percentages, in chart order.
/// Half-open on the left edges: [0,35), [35,50), [50,75), [75,100].
pub const BAND_LABELS: [&str; 4] = ["0-35%", "35-50%", "50-75%", "75-100%"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Classifies each defined percentage into exactly one band. Records without
/// a percentage are left out of every bucket (they are partitioned away, not
/// counted as zero).
pub fn bucket_percentages<I>(percentages: I) -> Vec<AnalyticsBucket>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut counts = [0usize; 4];
    for value in percentages.into_iter().flatten() {
        let idx = if value < 35.0 {
            0
        } else if value < 50.0 {
            1
        } else if value < 75.0 {
            2
        } else {
            3
        };
        counts[idx] += 1;
    }

    BAND_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| AnalyticsBucket { label, count })
        .collect()
}

/// Y-axis gridline values for the bucket chart, largest first.
///
/// Empty data still renders sensible gridlines via the fixed fallback. For
/// non-empty data the step is ceil(max/4) floored at 1; if four steps do not
/// reach the true maximum, the maximum itself is prepended so every bar fits
/// under the axis.
pub fn y_axis_ticks(buckets: &[AnalyticsBucket]) -> Vec<usize> {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    if max == 0 {
        return vec![4, 3, 2, 1, 0];
    }

    let step = std::cmp::max(1, max.div_ceil(4));
    let mut ticks: Vec<usize> = Vec::with_capacity(6);
    let mut value = step * 4;
    loop {
        ticks.push(value);
        if value < step {
            break;
        }
        value -= step;
    }
    if ticks[0] < max {
        ticks.insert(0, max);
    }

    let mut seen = Vec::with_capacity(ticks.len());
    for tick in ticks {
        if !seen.contains(&tick) {
            seen.push(tick);
        }
    }
    seen
}

/// Relative bar sizes for the compact overview widget: each count scaled to
/// the largest bucket (floored at 1 so an all-zero chart stays flat, not
/// divided by zero), rounded to whole percent.
pub fn relative_slice_percents(buckets: &[AnalyticsBucket]) -> Vec<u32> {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    buckets
        .iter()
        .map(|b| ((b.count as f64 / max as f64) * 100.0).round() as u32)
        .collect()
}
