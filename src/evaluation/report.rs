//! Human readable evaluation report.

use std::fmt::Write;

use super::domain::{EvaluationOutcome, EvaluationResult, Summary, WORST_CASES};

/// Render the full report for one evaluation run.
pub fn render_report(result: &EvaluationResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &EvaluationResult) -> std::fmt::Result {
    let total = result.outcomes.len() + result.skipped.len();

    writeln!(out, "Reimbursement System Evaluation")?;
    writeln!(out, "===============================")?;
    writeln!(out)?;
    writeln!(out, "Running evaluation against {total} test cases...")?;
    writeln!(out)?;

    match &result.outcome {
        EvaluationOutcome::NoSuccessfulRuns => {
            writeln!(out, "No successful test cases!")?;
            writeln!(out)?;
            writeln!(out, "Every case either:")?;
            writeln!(out, "  - failed input validation")?;
            writeln!(out, "  - could not be predicted")?;
            writeln!(out)?;
        }
        EvaluationOutcome::Completed(summary) => write_summary(out, result, summary)?,
    }

    if !result.skipped.is_empty() {
        writeln!(out, "Skipped cases ({}):", result.skipped.len())?;
        for skipped in &result.skipped {
            writeln!(out, "  Case {}: {}", skipped.index, skipped.reason)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Next steps:")?;
    writeln!(out, "  1. Fix any errors shown above")?;
    writeln!(out, "  2. Check that the model and its feature profile belong together")?;
    writeln!(out, "  3. Analyze the patterns in the high-error cases")?;
    writeln!(out, "  4. Test edge cases around trip length and receipt amounts")?;
    Ok(())
}

fn write_summary(out: &mut String, result: &EvaluationResult, s: &Summary) -> std::fmt::Result {
    writeln!(out, "Evaluation Complete!")?;
    writeln!(out)?;
    writeln!(out, "Results Summary:")?;
    writeln!(out, "  Total test cases: {}", s.total_cases)?;
    writeln!(out, "  Successful runs: {}", s.successful_runs)?;
    writeln!(
        out,
        "  Exact matches (±$0.01): {} ({:.1}%)",
        s.exact_matches,
        s.exact_pct()
    )?;
    writeln!(
        out,
        "  Close matches (±$1.00): {} ({:.1}%)",
        s.close_matches,
        s.close_pct()
    )?;
    writeln!(out, "  Average error: ${:.2}", s.avg_error)?;
    writeln!(out, "  Maximum error: ${:.2} (case {})", s.max_error, s.max_error_case)?;
    writeln!(out)?;
    writeln!(out, "Score: {:.2} (lower is better)", s.score)?;
    writeln!(out)?;
    writeln!(out, "{}", s.band().message())?;
    writeln!(out)?;

    if s.exact_matches < s.total_cases {
        writeln!(out, "Tips for improvement:")?;
        writeln!(out, "  Check these high-error cases:")?;
        for case in result.worst_cases(WORST_CASES) {
            writeln!(
                out,
                "    Case {}: {} days, {} miles, ${} receipts",
                case.index,
                case.record.trip_duration_days(),
                case.record.miles_traveled(),
                case.record.total_receipts_amount()
            )?;
            writeln!(
                out,
                "      Expected: ${:.2}, Got: ${:.2}, Error: ${:.2}",
                case.expected, case.predicted, case.error
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
