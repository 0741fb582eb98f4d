//! Pure string transforms applied to titles and artists before they are
//! shown, searched, or sent to a lyrics service.

use regex::Regex;
use std::sync::LazyLock;

static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"[「」]",
        r"【.*?】",
        r"(?i)\(Official.*?\)",
        r"(?i)\[Official.*?\]",
        r"(?i)\(Music Video\)",
        r"(?i)\(Lyric Video\)",
        r"(?i)\[MV\]",
        r"(?i)\(MV\)",
        r"(?i)Official Video",
        r"(?i)Official Audio",
        r"(?i)\(Audio\)",
        r"(?i)\[Audio\]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("noise pattern must compile"))
    .collect()
});

static FEATURING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ft|feat)\.").expect("featuring pattern must compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

static EDGE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\-/]+|[\s\-/]+$").expect("separator pattern must compile")
});

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("video url pattern must compile")
});

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern must compile"));

pub const VIDEO_ID_LEN: usize = 11;

/// Strips upload noise ("Official Video", bracketed tags, ...) and
/// normalizes "ft."/"feat." to "feat.".
pub fn clean_metadata(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut out = input.to_string();
    for pattern in NOISE_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out = FEATURING.replace_all(&out, "feat.").into_owned();
    WHITESPACE.replace_all(&out, " ").trim().to_string()
}

/// Removes every case-insensitive occurrence of `artist` from `title`,
/// then trims dangling separators.
pub fn strip_artist(title: &str, artist: &str) -> String {
    if artist.is_empty() || !title.to_lowercase().contains(&artist.to_lowercase()) {
        return title.to_string();
    }

    let pattern = match Regex::new(&format!("(?i){}", regex::escape(artist))) {
        Ok(p) => p,
        Err(_) => return title.to_string(),
    };
    let removed = pattern.replace_all(title, "");
    EDGE_SEPARATORS.replace_all(&removed, "").trim().to_string()
}

/// Drops an "Artist - " / "Artist-" prefix or " - Artist" suffix that
/// search results often carry in the title.
pub fn strip_artist_affixes(title: &str, artist: &str) -> String {
    if artist.is_empty() {
        return title.to_string();
    }

    let mut out = title;
    if let Some(rest) = strip_prefix_ci(out, &format!("{} - ", artist)) {
        out = rest.trim();
    } else if let Some(rest) = strip_prefix_ci(out, &format!("{}-", artist)) {
        out = rest.trim();
    }
    if let Some(rest) = strip_suffix_ci(out, &format!(" - {}", artist)) {
        out = rest.trim();
    }
    out.to_string()
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if s.len() < n || !s.is_char_boundary(n) {
        return None;
    }
    (s[..n].to_lowercase() == prefix.to_lowercase()).then(|| &s[n..])
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let n = suffix.len();
    if s.len() < n || !s.is_char_boundary(s.len() - n) {
        return None;
    }
    let split = s.len() - n;
    (s[split..].to_lowercase() == suffix.to_lowercase()).then(|| &s[..split])
}

/// Pulls the 11-character id out of a watch, short, embed or share URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    VIDEO_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_video_id(s: &str) -> bool {
    BARE_VIDEO_ID.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_metadata_strips_noise() {
        assert_eq!(
            clean_metadata("Blinding Lights (Official Video)"),
            "Blinding Lights"
        );
        assert_eq!(clean_metadata("「夜に駆ける」【MV】 YOASOBI"), "夜に駆ける YOASOBI");
        assert_eq!(clean_metadata("Song [Official Audio] [MV]"), "Song");
        assert_eq!(clean_metadata("Song   (Lyric Video)  "), "Song");
        assert_eq!(clean_metadata(""), "");
    }

    #[test]
    fn test_clean_metadata_normalizes_featuring() {
        assert_eq!(clean_metadata("Stay ft. Justin"), "Stay feat. Justin");
        assert_eq!(clean_metadata("Stay FEAT. Justin"), "Stay feat. Justin");
        assert_eq!(clean_metadata("Taylor Swift."), "Taylor Swift.");
    }

    #[test]
    fn test_strip_artist() {
        assert_eq!(strip_artist("Ed Sheeran - Shape of You", "Ed Sheeran"), "Shape of You");
        assert_eq!(strip_artist("Shape of You / ed sheeran", "Ed Sheeran"), "Shape of You");
        assert_eq!(strip_artist("Shape of You", "Ed Sheeran"), "Shape of You");
    }

    #[test]
    fn test_strip_artist_affixes() {
        assert_eq!(strip_artist_affixes("Dua Lipa - Levitating", "Dua Lipa"), "Levitating");
        assert_eq!(strip_artist_affixes("dua lipa-Levitating", "Dua Lipa"), "Levitating");
        assert_eq!(strip_artist_affixes("Levitating - Dua Lipa", "Dua Lipa"), "Levitating");
        assert_eq!(strip_artist_affixes("Levitating", "Dua Lipa"), "Levitating");
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=fHI8X4OXluQ&t=3"),
            Some("fHI8X4OXluQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/_dK2tDK9grQ"),
            Some("_dK2tDK9grQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://music.youtube.com/watch?v=35y_h270-dY"),
            Some("35y_h270-dY".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/i7e8a9f-F6k"),
            Some("i7e8a9f-F6k".to_string())
        );
        assert_eq!(extract_video_id("blinding lights"), None);
    }

    #[test]
    fn test_is_video_id() {
        assert!(is_video_id("fHI8X4OXluQ"));
        assert!(!is_video_id("short"));
        assert!(!is_video_id("has space in"));
    }
}
