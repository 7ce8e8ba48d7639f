//! Interface status parser.
//!
//! Turns `show interface status` output into [`PortRecord`]s. Only the port
//! name is extracted; column layout differs across device families, so the
//! classifier works on the raw line.

use snoop_common::{SnoopError, SnoopResult};

use crate::types::PortRecord;

/// Lines of table header and separator preceding the port rows.
pub const STATUS_HEADER_LINES: usize = 2;

/// Parses interface status text into port records, in input order.
///
/// The first two lines are discarded. Lines without tokens are skipped.
///
/// # Errors
///
/// `SnoopError::MalformedInput` if fewer than two lines are present.
pub fn parse_status(raw: &str) -> SnoopResult<Vec<PortRecord>> {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < STATUS_HEADER_LINES {
        return Err(SnoopError::malformed_input(lines.len()));
    }

    Ok(lines[STATUS_HEADER_LINES..]
        .iter()
        .filter_map(|line| {
            let name = line.split_whitespace().next()?;
            Some(PortRecord {
                name: name.to_string(),
                raw_line: (*line).to_string(),
            })
        })
        .collect())
}
