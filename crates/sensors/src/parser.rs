//! Wire-format parsing for sensor lines.
//!
//! The device sends newline-delimited ASCII of the form
//! `timestamp,v1,v2,...,vN` where `N` is the channel count fixed at pipeline
//! construction.

use emg_types::{ParseError, Sample};

/// Decodes one line of text into a sample.
///
/// Returns `Ok(None)` for a blank line (the device idles between bursts;
/// this is not an error). Any other token count than `channel_count + 1`
/// fails with [`ParseError::ArityMismatch`]; a non-numeric token fails with
/// [`ParseError::NotANumber`]. The acquisition task logs a failure, drops
/// the line, and keeps going.
pub fn parse_line(line: &str, channel_count: usize) -> Result<Option<Sample>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let expected = channel_count + 1;
    let tokens: Vec<&str> = line.split(',').collect();
    if tokens.len() != expected {
        return Err(ParseError::ArityMismatch {
            line: line.to_string(),
            expected,
            actual: tokens.len(),
        });
    }

    let mut values = Vec::with_capacity(expected);
    for token in &tokens {
        let value: f64 = token.trim().parse().map_err(|_| ParseError::NotANumber {
            line: line.to_string(),
            token: token.to_string(),
        })?;
        values.push(value);
    }

    let timestamp = values[0];
    let channels = values.split_off(1);
    Ok(Some(Sample::new(timestamp, channels)))
}
