//! SubRip (`.srt`) rendering and parsing.

use crate::error::{DubError, Result};
use std::fmt;
use std::path::Path;

/// One subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    /// 1-based position in the document.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Cue text; never contains blank lines.
    pub text: String,
}

impl SubtitleCue {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// An ordered list of cues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrtDocument {
    cues: Vec<SubtitleCue>,
}

impl SrtDocument {
    /// Numbers `(start_ms, end_ms, text)` triples 1..N in the given order.
    pub fn from_triples<I, S>(triples: I) -> Self
    where
        I: IntoIterator<Item = (u64, u64, S)>,
        S: AsRef<str>,
    {
        let cues = triples
            .into_iter()
            .enumerate()
            .map(|(i, (start_ms, end_ms, text))| SubtitleCue {
                index: i + 1,
                start_ms,
                end_ms,
                text: drop_blank_lines(text.as_ref()),
            })
            .collect();
        Self { cues }
    }

    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// First start and last end, if there are any cues.
    pub fn span(&self) -> Option<(u64, u64)> {
        let start = self.cues.iter().map(|c| c.start_ms).min()?;
        let end = self.cues.iter().map(|c| c.end_ms).max()?;
        Some((start, end))
    }

    /// Renders the document in SubRip format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_timestamp(cue.start_ms),
                format_timestamp(cue.end_ms),
                cue.text
            ));
        }
        out
    }

    /// Writes the rendered document to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// Reads and parses a document from `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a SubRip document.
    pub fn parse(content: &str) -> Result<Self> {
        enum State {
            Index,
            Timing { index: usize },
            Text { cue: SubtitleCue, lines: Vec<String> },
        }

        fn finish(cue: SubtitleCue, lines: Vec<String>) -> SubtitleCue {
            SubtitleCue {
                text: lines.join("\n"),
                ..cue
            }
        }

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut cues = Vec::new();
        let mut state = State::Index;

        for (n, raw) in content.lines().enumerate() {
            let line_no = n + 1;
            let line = raw.trim_end_matches('\r');
            let blank = line.trim().is_empty();

            state = match state {
                State::Index if blank => State::Index,
                State::Index => {
                    let index = line.trim().parse::<usize>().map_err(|_| DubError::SubtitleParse {
                        line: line_no,
                        message: format!("expected cue index, found '{}'", line.trim()),
                    })?;
                    State::Timing { index }
                }
                State::Timing { index } => {
                    let (start_ms, end_ms) = parse_timing(line).map_err(|message| {
                        DubError::SubtitleParse {
                            line: line_no,
                            message,
                        }
                    })?;
                    State::Text {
                        cue: SubtitleCue {
                            index,
                            start_ms,
                            end_ms,
                            text: String::new(),
                        },
                        lines: Vec::new(),
                    }
                }
                State::Text { cue, lines } if blank => {
                    cues.push(finish(cue, lines));
                    State::Index
                }
                State::Text { cue, mut lines } => {
                    lines.push(line.to_string());
                    State::Text { cue, lines }
                }
            };
        }

        match state {
            State::Index => {}
            State::Timing { index } => {
                return Err(DubError::SubtitleParse {
                    line: content.lines().count(),
                    message: format!("cue {} has no timing line", index),
                });
            }
            State::Text { cue, lines } => cues.push(finish(cue, lines)),
        }

        Ok(Self { cues })
    }
}

impl fmt::Display for SrtDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builds a document from `(start_ms, end_ms, text)` triples.
pub fn emit<I, S>(triples: I) -> SrtDocument
where
    I: IntoIterator<Item = (u64, u64, S)>,
    S: AsRef<str>,
{
    SrtDocument::from_triples(triples)
}

/// Formats milliseconds as `HH:MM:SS,mmm`. Hours grow past two digits as needed.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parses `HH:MM:SS,mmm` (a `.` before the milliseconds is also accepted).
pub fn parse_timestamp(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let invalid = || format!("invalid timestamp '{}'", s);

    let (clock, millis) = s.split_once([',', '.']).ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let number = |part: &str| -> std::result::Result<u64, String> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse::<u64>().map_err(|_| invalid())
    };

    let (hours, minutes, seconds, millis) = (number(h)?, number(m)?, number(sec)?, number(millis)?);
    if minutes >= 60 || seconds >= 60 || millis >= 1000 || millis_digits(s) != 3 {
        return Err(invalid());
    }
    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}

fn millis_digits(s: &str) -> usize {
    s.rsplit([',', '.']).next().map_or(0, str::len)
}

fn parse_timing(line: &str) -> std::result::Result<(u64, u64), String> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| format!("expected 'start --> end', found '{}'", line.trim()))?;
    let start_ms = parse_timestamp(start)?;
    let end_ms = parse_timestamp(end)?;
    if end_ms < start_ms {
        return Err(format!(
            "cue ends before it starts ({} --> {})",
            start.trim(),
            end.trim()
        ));
    }
    Ok((start_ms, end_ms))
}

fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(500), "00:00:00,500");
        assert_eq!(format_timestamp(2500), "00:00:02,500");
        assert_eq!(format_timestamp(3_723_045), "01:02:03,045");
    }

    #[test]
    fn test_format_timestamp_hours_unbounded() {
        assert_eq!(format_timestamp(100 * 3_600_000 + 1), "100:00:00,001");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:02,500").unwrap(), 2500);
        assert_eq!(parse_timestamp("01:02:03.045").unwrap(), 3_723_045);
        assert_eq!(parse_timestamp("123:00:00,000").unwrap(), 123 * 3_600_000);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for bad in ["", "00:00:02", "00:61:00,000", "00:00:00,50", "aa:00:00,000", "0:0:0:0,000"] {
            assert!(parse_timestamp(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_render_block_format() {
        let doc = emit([(500, 2500, "नमस्ते"), (6000, 9000, "दुनिया")]);
        assert_eq!(
            doc.render(),
            "1\n00:00:00,500 --> 00:00:02,500\nनमस्ते\n\n2\n00:00:06,000 --> 00:00:09,000\nदुनिया\n\n"
        );
    }

    #[test]
    fn test_empty_document_renders_empty() {
        let doc = emit(Vec::<(u64, u64, String)>::new());
        assert!(doc.is_empty());
        assert_eq!(doc.render(), "");
        assert!(SrtDocument::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_blank_lines_in_text_are_dropped() {
        let doc = emit([(0, 1000, "first\n\n  \nsecond")]);
        assert_eq!(doc.cues()[0].text, "first\nsecond");
    }

    #[test]
    fn test_empty_text_cue_survives_round_trip() {
        let doc = emit([(0, 1000, ""), (2000, 3000, "after")]);

        let parsed = SrtDocument::parse(&doc.render()).unwrap();

        assert_eq!(parsed, doc);
        assert_eq!(parsed.cues()[0].text, "");
        assert_eq!(parsed.cues()[1].index, 2);
    }

    #[test]
    fn test_round_trip_multiline() {
        let doc = emit([(0, 1500, "line one\nline two"), (1500, 2000, "42")]);
        assert_eq!(SrtDocument::parse(&doc.render()).unwrap(), doc);
    }

    #[test]
    fn test_parse_tolerates_crlf_and_bom() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nhello\r\n\r\n";
        let doc = SrtDocument::parse(content).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cues()[0].text, "hello");
    }

    #[test]
    fn test_parse_without_trailing_blank_line() {
        let doc = SrtDocument::parse("1\n00:00:01,000 --> 00:00:02,000\nhello").unwrap();
        assert_eq!(doc.cues()[0].text, "hello");
    }

    #[test]
    fn test_parse_reports_line_of_bad_index() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nhi\n\nnot-a-number\n";
        match SrtDocument::parse(content) {
            Err(DubError::SubtitleParse { line, .. }) => assert_eq!(line, 5),
            other => panic!("Expected SubtitleParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_timing() {
        let content = "1\n00:00:01,000 -> 00:00:02,000\nhi\n";
        assert!(matches!(
            SrtDocument::parse(content),
            Err(DubError::SubtitleParse { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_backwards_cue() {
        let content = "1\n00:00:03,000 --> 00:00:02,000\nhi\n";
        assert!(SrtDocument::parse(content).is_err());
    }

    #[test]
    fn test_parse_rejects_dangling_index() {
        assert!(SrtDocument::parse("1\n").is_err());
    }

    #[test]
    fn test_span() {
        let doc = emit([(500, 2500, "a"), (6000, 9000, "b")]);
        assert_eq!(doc.span(), Some((500, 9000)));
        assert_eq!(SrtDocument::default().span(), None);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");
        let doc = emit([(0, 700, "hola")]);

        doc.write(&path).unwrap();

        assert_eq!(SrtDocument::read(&path).unwrap(), doc);
    }
}
