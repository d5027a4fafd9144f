use tracing::debug;

use crate::exam::{parse_number, ExamRecord, MAX_GRADE};
use crate::models::{ExtraBonuses, StatsReport};

/// Credits of the lowest grade left out of the LM-32 average.
pub const DISCOUNT_CREDITS: u32 = 6;
pub const HONORS_POINTS: f64 = 0.5;
pub const MAX_HONORS_BONUS: f64 = 3.0;
pub const HONORS_THRESHOLD: f64 = 102.0;
pub const DISTINCTION_THRESHOLD: f64 = 108.0;
pub const FULL_MARKS: u32 = 110;
pub const DEGREE_CREDITS: u32 = 120;

const SIMULATED_EXAM_NAME: &str = "Simulated exam";

pub fn compute_stats(records: &[ExamRecord]) -> StatsReport {
    let gradable: Vec<(u32, &ExamRecord)> = records
        .iter()
        .filter_map(|record| record.grade().map(|grade| (grade, record)))
        .collect();
    let discounted = lowest_grade_index(&gradable);

    let mut weighted_standard = 0u64;
    let mut credits_standard = 0u64;
    let mut weighted_discounted = 0u64;
    let mut credits_discounted = 0u64;
    let mut grade_sum = 0u64;
    let mut honors_count = 0usize;

    for (index, (grade, record)) in gradable.iter().enumerate() {
        let grade = u64::from(*grade);
        let credits = u64::from(record.credits());

        weighted_standard += grade * credits;
        credits_standard += credits;

        let effective = if discounted == Some(index) {
            credits.saturating_sub(u64::from(DISCOUNT_CREDITS))
        } else {
            credits
        };
        weighted_discounted += grade * effective;
        credits_discounted += effective;

        grade_sum += grade;
        if record.with_honors() {
            honors_count += 1;
        }
    }

    let total_credits = records.iter().map(ExamRecord::credits).sum();

    let weighted_average_discounted = ratio(weighted_discounted, credits_discounted);
    let graduation_base = weighted_average_discounted * 11.0 / 3.0;
    let honors_bonus = honors_bonus(honors_count);
    let initial_base = graduation_base + honors_bonus;

    StatsReport {
        weighted_average_discounted,
        weighted_average_standard: ratio(weighted_standard, credits_standard),
        arithmetic_average: ratio(grade_sum, gradable.len() as u64),
        graduation_base,
        total_credits,
        graded_count: gradable.len(),
        honors_count,
        honors_bonus,
        initial_base,
        honors_eligible: honors_eligible(initial_base),
        distinction_eligible: distinction_eligible(initial_base),
    }
}

/// The graded exam whose credits get discounted: the lowest grade, and among
/// equal lowest grades the one with more credits. The earliest wins a full tie.
pub fn discount_candidate(records: &[ExamRecord]) -> Option<&ExamRecord> {
    let gradable: Vec<(u32, &ExamRecord)> = records
        .iter()
        .filter_map(|record| record.grade().map(|grade| (grade, record)))
        .collect();
    lowest_grade_index(&gradable).map(|index| gradable[index].1)
}

fn lowest_grade_index(gradable: &[(u32, &ExamRecord)]) -> Option<usize> {
    let mut lowest: Option<(usize, u32, u32)> = None;

    for (index, (grade, record)) in gradable.iter().enumerate() {
        let replace = match lowest {
            None => true,
            Some((_, lowest_grade, lowest_credits)) => {
                *grade < lowest_grade
                    || (*grade == lowest_grade && record.credits() > lowest_credits)
            }
        };
        if replace {
            lowest = Some((index, *grade, record.credits()));
        }
    }

    if let Some((index, grade, credits)) = lowest {
        debug!(index, grade, credits, "selected discount candidate");
    }
    lowest.map(|(index, _, _)| index)
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn honors_bonus(honors_count: usize) -> f64 {
    (honors_count as f64 * HONORS_POINTS).min(MAX_HONORS_BONUS)
}

pub fn honors_eligible(initial_base: f64) -> bool {
    initial_base >= HONORS_THRESHOLD
}

pub fn distinction_eligible(initial_base: f64) -> bool {
    initial_base >= DISTINCTION_THRESHOLD
}

/// Final graduation score, rounded half away from zero.
///
/// `thesis_points` is expected in `0.0..=11.0` in steps of 0.5; callers
/// validate it.
pub fn compute_final_score(
    report: &StatsReport,
    thesis_points: f64,
    bonuses: ExtraBonuses,
) -> u32 {
    let total = report.initial_base + thesis_points + bonuses.points();
    total.round().max(0.0) as u32
}

/// Whether the commission may award honors ("con lode") on top of full marks.
pub fn laude_awardable(report: &StatsReport, final_score: u32) -> bool {
    final_score >= FULL_MARKS && report.honors_eligible
}

/// Share of the degree's credits already covered, capped at 1.
pub fn degree_progress(report: &StatsReport) -> f64 {
    (f64::from(report.total_credits) / f64::from(DEGREE_CREDITS)).min(1.0)
}

/// Stats as they would be after passing one more exam.
///
/// Returns `None` when either hypothetical value is missing or is not a valid
/// grade/credit count, which is not the same as a report over zero exams.
/// Honors are only counted when the grade is 30.
pub fn compute_simulated_stats(
    records: &[ExamRecord],
    grade: Option<&str>,
    credits: Option<&str>,
    with_honors: bool,
) -> Option<StatsReport> {
    let grade = parse_number("grade", grade?).ok()?;
    let credits = parse_number("credits", credits?).ok()?;
    let with_honors = with_honors && grade == MAX_GRADE;

    let simulated = match ExamRecord::graded(SIMULATED_EXAM_NAME, grade, credits, with_honors) {
        Ok(record) => record,
        Err(err) => {
            debug!(%err, "hypothetical exam rejected");
            return None;
        }
    };

    let mut extended = records.to_vec();
    extended.push(simulated);
    Some(compute_stats(&extended))
}
