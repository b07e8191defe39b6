//! Lost-message detection
//!
//! The tracker reports transmission faults with a line such as
//! `MSG 8123456 ERROR MESSAGES LOST 2`. The count tells how many trailing
//! trial messages never made it into the log.

use crate::format::FormatDescription;
use crate::locator::locate;
use crate::types::{MalformedReason, NumericToken, Trial};

/// Number of messages reported lost for `trial`, or `None` if no error line exists
pub fn detect_lost_messages(
    trial: &Trial<'_>,
    format: &FormatDescription,
) -> Result<Option<usize>, MalformedReason> {
    let Some(index) = locate(trial, &format.error_marker) else {
        return Ok(None);
    };

    let token = trial.lines[index]
        .token(format.lost_count_position)
        .ok_or(MalformedReason::MissingNumber {
            kind: NumericToken::LostCount,
            line: index,
        })?;

    let count = token
        .parse::<usize>()
        .map_err(|_| MalformedReason::InvalidNumber {
            kind: NumericToken::LostCount,
            line: index,
            token: token.to_string(),
        })?;

    log::debug!(
        "Trial {} reports {} lost message(s) on line {}",
        trial.ordinal,
        count,
        index
    );
    Ok(Some(count))
}
