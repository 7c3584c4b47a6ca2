//! Human-readable text report.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::RunReport;
use crate::calculator::MaxPainResult;

const RULE_WIDTH: usize = 60;
const MAX_PAIN_MARKER: &str = " <- MAX PAIN";

/// Render `report`, printing timestamps in `timezone`.
pub fn render(report: &RunReport, timezone: Tz) -> String {
    let mut out = String::new();
    let generated = report.generated_at.with_timezone(&timezone);

    push_line(&mut out, format!("MAX PAIN REPORT - {}", report.ticker));
    push_line(&mut out, format!("Generated: {}", generated.format("%Y-%m-%d %H:%M:%S %Z")));
    push_line(&mut out, format!("Current Price: ${:.2}", report.current_price));
    push_line(&mut out, "=".repeat(RULE_WIDTH));

    for result in &report.results {
        out.push('\n');
        render_expiration(&mut out, result);
    }
    out
}

fn render_expiration(out: &mut String, r: &MaxPainResult) {
    let sign = if r.distance_percent.is_sign_negative() { "" } else { "+" };
    let ratio = r
        .put_call_ratio
        .map_or_else(|| "N/A".to_owned(), |ratio| format!("{ratio:.3}"));

    push_line(out, format!("EXPIRATION: {} ({} days)", r.expiration, r.days_to_expiration));
    push_line(out, format!("Max Pain Price: ${:.2}", r.max_pain_strike));
    push_line(
        out,
        format!(
            "Distance from Current: ${:.2} ({sign}{:.2}%)",
            r.distance.abs(),
            r.distance_percent
        ),
    );
    push_line(out, format!("Put/Call Ratio: {ratio}"));
    push_line(out, format!("Total Put OI: {}", group_thousands(u128::from(r.total_put_oi))));
    push_line(out, format!("Total Call OI: {}", group_thousands(u128::from(r.total_call_oi))));
    push_line(out, format!("Contracts Analyzed: {}", r.contracts_analyzed));
    push_line(out, "");
    push_line(out, "Nearby Strike Analysis:");

    for row in &r.nearby_strikes {
        let marker = if row.is_max_pain { MAX_PAIN_MARKER } else { "" };
        push_line(
            out,
            format!("  ${:.2}: Pain Value = ${}{marker}", row.strike, whole_dollars(row.pain)),
        );
    }
}

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

fn whole_dollars(value: Decimal) -> String {
    value
        .round()
        .to_u128()
        .map_or_else(|| value.round().to_string(), group_thousands)
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
