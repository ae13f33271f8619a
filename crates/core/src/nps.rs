//! Net Promoter Score computation.

use serde::{Deserialize, Serialize};

use crate::record::{NpsCategory, SurveyRecord};

/// NPS summary over a set of responses.
///
/// `total` counts only responses with a parseable score, so
/// `promoters + passives + detractors == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpsSummary {
    pub score: i32,
    pub total: usize,
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub average_score: f64,
    pub promoter_percent: u32,
    pub passive_percent: u32,
    pub detractor_percent: u32,
}

/// Incremental tally used by every grouped computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpsTally {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub score_sum: u64,
}

impl NpsTally {
    /// Counts one record. Records without a parseable score are ignored.
    pub fn add(&mut self, record: &SurveyRecord) {
        if let Some(score) = record.resolved_score() {
            self.add_score(score);
        }
    }

    pub fn add_score(&mut self, score: u8) {
        match NpsCategory::from_score(score) {
            NpsCategory::Promoter => self.promoters += 1,
            NpsCategory::Passive => self.passives += 1,
            NpsCategory::Detractor => self.detractors += 1,
        }
        self.score_sum += u64::from(score);
    }

    pub fn total(&self) -> usize {
        self.promoters + self.passives + self.detractors
    }

    pub fn score(&self) -> i32 {
        nps_score(self.promoters, self.detractors, self.total())
    }

    pub fn summary(&self) -> NpsSummary {
        let total = self.total();
        let average_score = if total == 0 {
            0.0
        } else {
            round1(self.score_sum as f64 / total as f64)
        };

        NpsSummary {
            score: self.score(),
            total,
            promoters: self.promoters,
            passives: self.passives,
            detractors: self.detractors,
            average_score,
            promoter_percent: percent(self.promoters, total),
            passive_percent: percent(self.passives, total),
            detractor_percent: percent(self.detractors, total),
        }
    }
}

impl<'a> FromIterator<&'a SurveyRecord> for NpsTally {
    fn from_iter<I: IntoIterator<Item = &'a SurveyRecord>>(iter: I) -> Self {
        let mut tally = NpsTally::default();
        for record in iter {
            tally.add(record);
        }
        tally
    }
}

/// Computes the NPS summary for a record subset.
pub fn compute_nps(records: &[SurveyRecord]) -> NpsSummary {
    records.iter().collect::<NpsTally>().summary()
}

/// `round((promoters - detractors) / total * 100)`, or 0 when `total` is 0.
///
/// Halves round towards positive infinity, so -12.5 becomes -12.
pub fn nps_score(promoters: usize, detractors: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let numerator = 100 * (promoters as i64 - detractors as i64);
    let total = total as i64;
    (2 * numerator + total).div_euclid(2 * total) as i32
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * part + total) / (2 * total)) as u32
}

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
