//! SubRip (.srt) subtitle reader.

use strata_schema::Value;

/// One parsed cue; times in milliseconds.
#[derive(Debug, Clone, PartialEq)]
struct Cue {
    start_ms: u64,
    end_ms: u64,
    text: String,
}

/// Read an SRT file into `{subtitle_count, duration_seconds, first_line}`.
///
/// Duration is the whole seconds between the first cue's start and the last
/// cue's end. Blocks without a valid timing line are ignored. Content that
/// is not UTF-8 yields `{"error": "Invalid SRT"}`.
pub fn read_subtitle(content: &[u8]) -> Value {
    let text = match std::str::from_utf8(content) {
        Ok(text) => text.trim_start_matches('\u{feff}'),
        Err(_) => return Value::map([("error", Value::from("Invalid SRT"))]),
    };

    let cues = parse_cues(text);

    let duration_seconds = match (cues.first(), cues.last()) {
        (Some(first), Some(last)) => (last.end_ms.saturating_sub(first.start_ms) / 1000) as i64,
        _ => 0,
    };
    let first_line = cues.first().map(|cue| cue.text.clone());

    Value::map([
        ("subtitle_count", Value::Integer(cues.len() as i64)),
        ("duration_seconds", Value::Integer(duration_seconds)),
        ("first_line", Value::from(first_line)),
    ])
}

fn parse_cues(text: &str) -> Vec<Cue> {
    let normalized = text.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().map(str::trim_end).filter(|l| !l.is_empty());

        let Some(first) = lines.next() else {
            continue;
        };
        // The numeric index line is optional in the wild.
        let timing = if first.contains("-->") {
            Some(first)
        } else {
            lines.next()
        };
        let Some((start_ms, end_ms)) = timing.and_then(parse_timing) else {
            continue;
        };

        let text = lines.collect::<Vec<_>>().join("\n");
        cues.push(Cue {
            start_ms,
            end_ms,
            text,
        });
    }

    cues
}

/// Parse `00:00:01,000 --> 00:00:04,500` (extra cue settings allowed).
fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too).
fn parse_timestamp(ts: &str) -> Option<u64> {
    let (hms, millis) = ts.split_once([',', '.']).unwrap_or((ts, "0"));
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let millis: u64 = millis.trim().parse().ok()?;

    // A time past u64 milliseconds invalidates the block.
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}
