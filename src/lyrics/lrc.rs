use regex::Regex;
use std::sync::LazyLock;

use super::LyricLine;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,3}):(\d{2})(?:[.:](\d{1,3}))?\]").expect("timestamp pattern must compile")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("tag pattern must compile"));

const METADATA_PREFIXES: &[&str] = &["ar:", "ti:", "al:", "by:", "au:", "length:", "offset:", "re:", "ve:"];

/// Parses LRC text into lines sorted by time.
///
/// Lines without a timestamp tag are dropped, as are lines whose text is
/// empty or looks like a header (`ar:`, `ti:`, ...). A line carrying
/// several timestamps yields one entry per timestamp.
pub fn parse_lrc(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw in content.lines() {
        let times: Vec<f64> = TIMESTAMP
            .captures_iter(raw)
            .filter_map(|c| {
                let minutes: f64 = c.get(1)?.as_str().parse().ok()?;
                let seconds: f64 = c.get(2)?.as_str().parse().ok()?;
                let fraction = c.get(3).map(|m| fraction_seconds(m.as_str())).unwrap_or(0.0);
                Some(minutes * 60.0 + seconds + fraction)
            })
            .collect();

        if times.is_empty() {
            continue;
        }

        let text = ANY_TAG.replace_all(raw, "").trim().to_string();
        if text.is_empty() || is_metadata(&text) {
            continue;
        }

        for time in times {
            lines.push(LyricLine {
                time,
                text: text.clone(),
            });
        }
    }

    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// "5" -> 0.5s, "05" -> 0.05s, "050" -> 0.05s
fn fraction_seconds(digits: &str) -> f64 {
    let value: f64 = digits.parse().unwrap_or(0.0);
    match digits.len() {
        1 => value / 10.0,
        2 => value / 100.0,
        _ => value / 1000.0,
    }
}

fn is_metadata(text: &str) -> bool {
    let lower = text.to_lowercase();
    METADATA_PREFIXES.iter().any(|p| lower.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let lrc = "[ar:Ed Sheeran]\n[ti:Shape of You]\n[00:09.50]The club isn't the best place\n[00:12.123]To find a lover\nuntagged line\n[00:15.00]\n";
        let lines = parse_lrc(lrc);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].time, 9.5);
        assert_eq!(lines[0].text, "The club isn't the best place");
        assert!((lines[1].time - 12.123).abs() < 1e-9);
    }

    #[test]
    fn test_parse_drops_metadata_text() {
        let lrc = "[00:00.00] ti: Song\n[00:01.00]by: someone\n[00:02.00]Real line";
        let lines = parse_lrc(lrc);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Real line");
    }

    #[test]
    fn test_parse_repeated_timestamps() {
        let lrc = "[01:00.00][00:30.00]Chorus\n[00:45.00]Verse";
        let lines = parse_lrc(lrc);
        let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![30.0, 45.0, 60.0]);
        assert_eq!(lines[0].text, "Chorus");
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_lrc("").is_empty());
        assert!(parse_lrc("just text\nmore text").is_empty());
    }
}
