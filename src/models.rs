/// Derived statistics for a list of exams. Recomputed on every change and
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsReport {
    /// LM-32 weighted average, with 6 credits of the lowest grade discounted.
    pub weighted_average_discounted: f64,
    pub weighted_average_standard: f64,
    pub arithmetic_average: f64,
    /// Base score out of 110 derived from the discounted average.
    pub graduation_base: f64,
    /// Credits of every exam, recognitions included.
    pub total_credits: u32,
    pub graded_count: usize,
    pub honors_count: usize,
    pub honors_bonus: f64,
    /// Graduation base plus the honors bonus.
    pub initial_base: f64,
    pub honors_eligible: bool,
    pub distinction_eligible: bool,
}

/// Extra points granted on top of the thesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtraBonuses {
    /// At least 15 credits or the thesis abroad.
    pub erasmus: bool,
    /// Graduating within the extraordinary session of the second year.
    pub in_course: bool,
}

impl ExtraBonuses {
    pub fn points(&self) -> f64 {
        let mut points = 0.0;
        if self.erasmus {
            points += 1.0;
        }
        if self.in_course {
            points += 2.0;
        }
        points
    }
}

#[derive(Debug, Clone)]
pub struct GradeSummary {
    pub grade: u32,
    pub count: usize,
    pub credits: u32,
    pub honors: usize,
}
