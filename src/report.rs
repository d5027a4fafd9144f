use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::exam::ExamRecord;
use crate::models::{ExtraBonuses, GradeSummary};
use crate::stats;

/// Graded exams grouped by grade, highest first.
pub fn summarize_by_grade(exams: &[ExamRecord]) -> Vec<GradeSummary> {
    let mut map: BTreeMap<u32, GradeSummary> = BTreeMap::new();

    for exam in exams {
        let Some(grade) = exam.grade() else {
            continue;
        };
        let entry = map.entry(grade).or_insert(GradeSummary {
            grade,
            count: 0,
            credits: 0,
            honors: 0,
        });
        entry.count += 1;
        entry.credits += exam.credits();
        if exam.with_honors() {
            entry.honors += 1;
        }
    }

    map.into_values().rev().collect()
}

pub fn build_report(
    generated_on: NaiveDate,
    exams: &[ExamRecord],
    thesis_points: f64,
    bonuses: ExtraBonuses,
) -> String {
    let report = stats::compute_stats(exams);
    let final_score = stats::compute_final_score(&report, thesis_points, bonuses);
    let discounted = stats::discount_candidate(exams).map(ExamRecord::id);
    let summaries = summarize_by_grade(exams);

    let mut output = String::new();

    let _ = writeln!(output, "# Graduation Score Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} exams ({} of {} credits)",
        generated_on,
        exams.len(),
        report.total_credits,
        stats::DEGREE_CREDITS
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Averages");
    let _ = writeln!(
        output,
        "- Weighted average (LM-32): {:.2}",
        report.weighted_average_discounted
    );
    let _ = writeln!(
        output,
        "- Weighted average (standard): {:.2}",
        report.weighted_average_standard
    );
    let _ = writeln!(output, "- Arithmetic average: {:.2}", report.arithmetic_average);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Graduation Score");
    let _ = writeln!(output, "- Graduation base: {:.2}", report.graduation_base);
    let _ = writeln!(
        output,
        "- Honors bonus: {:.1} ({} honors)",
        report.honors_bonus, report.honors_count
    );
    let _ = writeln!(output, "- Initial base: {:.2}", report.initial_base);
    let _ = writeln!(output, "- Thesis points: {:.1}", thesis_points);
    let _ = writeln!(output, "- Extra points: {:.0}", bonuses.points());
    let _ = writeln!(
        output,
        "- Projected score: {}/{}{}",
        final_score,
        stats::FULL_MARKS,
        if stats::laude_awardable(&report, final_score) {
            " cum laude"
        } else {
            ""
        }
    );
    let _ = writeln!(
        output,
        "- Honors eligible: {}",
        if report.honors_eligible { "yes" } else { "no" }
    );
    let _ = writeln!(
        output,
        "- Distinction eligible: {}",
        if report.distinction_eligible { "yes" } else { "no" }
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No graded exams recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} exams, {} credits{}",
                summary.grade,
                summary.count,
                summary.credits,
                if summary.honors > 0 {
                    format!(", {} with honors", summary.honors)
                } else {
                    String::new()
                }
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Exams");

    if exams.is_empty() {
        let _ = writeln!(output, "No exams recorded.");
    } else {
        for exam in exams {
            let _ = writeln!(
                output,
                "- [{}] {} ({} credits){}",
                exam.badge(),
                exam.name(),
                exam.credits(),
                if exam.is_recognition() {
                    " recognized"
                } else if discounted == Some(exam.id()) {
                    " discounted"
                } else {
                    ""
                }
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_exams() -> Vec<ExamRecord> {
        vec![
            ExamRecord::graded("Analisi Matematica", 24, 9, false).unwrap(),
            ExamRecord::graded("Reti di Calcolatori", 30, 9, true).unwrap(),
            ExamRecord::graded("Fisica", 21, 6, false).unwrap(),
            ExamRecord::graded("Basi di Dati", 30, 6, false).unwrap(),
            ExamRecord::recognition("Inglese B2", 3).unwrap(),
        ]
    }

    #[test]
    fn grades_group_highest_first() {
        let summaries = summarize_by_grade(&sample_exams());
        let grades: Vec<u32> = summaries.iter().map(|s| s.grade).collect();
        assert_eq!(grades, vec![30, 24, 21]);
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].credits, 15);
        assert_eq!(summaries[0].honors, 1);
    }

    #[test]
    fn report_marks_discount_and_recognition() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(date, &sample_exams(), 4.0, ExtraBonuses::default());

        assert!(report.contains("Generated on 2026-02-02 for 5 exams (33 of 120 credits)"));
        assert!(report.contains("- [21] Fisica (6 credits) discounted"));
        assert!(report.contains("- [C] Inglese B2 (3 credits) recognized"));
        assert!(report.contains("- [30L] Reti di Calcolatori (9 credits)\n"));
        assert!(report.contains("- 30: 2 exams, 15 credits, 1 with honors"));
    }

    #[test]
    fn empty_report_is_well_formed() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(date, &[], 0.0, ExtraBonuses::default());
        assert!(report.contains("No graded exams recorded."));
        assert!(report.contains("No exams recorded."));
        assert!(report.contains("- Projected score: 0/110\n"));
    }
}
