//! Working-set retention.
//!
//! When the working set exceeds its capacity the oldest records are evicted.
//! Age is the response date; records without a date count as oldest, and
//! among equal dates a record later in the sequence counts as newer. The
//! survivors keep their original relative order.

use nps_core::SurveyRecord;

/// Retention cap for the working set.
pub const DEFAULT_CAPACITY: usize = 500;

/// Caps `records` to `capacity`, returning the number evicted.
pub fn enforce_capacity(records: &mut Vec<SurveyRecord>, capacity: usize) -> usize {
    let excess = records.len().saturating_sub(capacity);
    if excess == 0 {
        return 0;
    }

    // Rank oldest first; ties broken by position so later entries survive.
    let mut ranked: Vec<usize> = (0..records.len()).collect();
    ranked.sort_by_key(|&i| (records[i].resolved_date(), i));

    let mut evict = vec![false; records.len()];
    for &i in &ranked[..excess] {
        evict[i] = true;
    }

    let mut idx = 0;
    records.retain(|_| {
        let keep = !evict[idx];
        idx += 1;
        keep
    });

    excess
}
