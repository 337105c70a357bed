use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::enrich::EnrichedRow;
use crate::utils::time::format_clock;

pub const HEADER: [&str; 11] = [
    "date",
    "employeeName",
    "employeeId",
    "branch",
    "branchCode",
    "shift",
    "checkIn",
    "checkOut",
    "lateMinutes",
    "status",
    "note",
];

fn record(row: &EnrichedRow) -> [String; 11] {
    let day = &row.day;
    [
        day.date.format("%Y-%m-%d").to_string(),
        day.employee_name.clone(),
        day.emp_no.clone(),
        day.branch_name.clone(),
        day.branch_code.clone(),
        row.shift_label().unwrap_or_default().to_string(),
        day.check_in.map(format_clock).unwrap_or_default(),
        day.check_out.map(format_clock).unwrap_or_default(),
        day.check_in
            .and(day.late_minutes)
            .map(|m| m.to_string())
            .unwrap_or_default(),
        row.resolved_status.to_string(),
        day.note.clone().unwrap_or_default(),
    ]
}

/// Renders rows as CSV with a header line. Fields with a comma, quote or
/// line break are quoted; records end with `\n`.
pub fn to_csv(rows: &[EnrichedRow]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(record(row))?;
    }

    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
