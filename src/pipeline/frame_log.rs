// Frame log format
// Plain-text per-frame detection log: "frame 12: hook 0.83, straight 0.41"

use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

use crate::events::{Detection, DetectionFrame};

/// Errors that can occur while reading or writing frame logs
#[derive(Debug, Error)]
pub enum FrameLogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed frame log line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

const NO_DETECTIONS: &str = "no detections";
const BOM: char = '\u{feff}';

/// Decode raw log bytes to text
///
/// A UTF-16 byte order mark selects UTF-16 (LE or BE). Otherwise the bytes
/// are read as UTF-8, with a leading BOM dropped, falling back to Latin-1
/// when they are not valid UTF-8.
pub fn decode_frame_log(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse a frame log into frames, in file order
///
/// Lines not starting with `frame` (headers, separators) are skipped.
/// Entries are `<label> <confidence>`; the legacy `<count> <label>` form is
/// also accepted and yields one detection at confidence 1.0 when `count` is
/// non-zero. Confidences must lie in [0, 1].
pub fn parse_frame_log(text: &str) -> Result<Vec<DetectionFrame>, FrameLogError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut frames = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        let Some(rest) = line.strip_prefix("frame") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let malformed = |reason: String| FrameLogError::Malformed {
            line: line_no,
            reason,
        };

        let (index, body) = rest
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' after frame index".to_string()))?;
        let frame_index: u64 = index
            .trim()
            .parse()
            .map_err(|_| malformed(format!("invalid frame index '{}'", index.trim())))?;

        let body = body.trim();
        if body.is_empty() || body.eq_ignore_ascii_case(NO_DETECTIONS) {
            frames.push(DetectionFrame::empty(frame_index));
            continue;
        }

        let mut detections = Vec::new();
        for entry in body.split(',') {
            parse_entry(entry, &mut detections).map_err(malformed)?;
        }
        frames.push(DetectionFrame::new(frame_index, detections));
    }

    Ok(frames)
}

fn parse_entry(entry: &str, detections: &mut Vec<Detection>) -> Result<(), String> {
    let tokens: Vec<&str> = entry.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(format!("expected '<label> <confidence>', got '{}'", entry.trim()));
    }

    let (last, head) = tokens.split_last().ok_or("empty entry")?;
    if let Ok(confidence) = last.parse::<f32>() {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!("confidence '{}' is outside [0, 1]", last));
        }
        detections.push(Detection::new(head.join(" "), confidence));
        return Ok(());
    }

    let (first, tail) = tokens.split_first().ok_or("empty entry")?;
    if let Ok(count) = first.parse::<u64>() {
        // Only presence matters to the extractor
        if count > 0 {
            detections.push(Detection::new(tail.join(" "), 1.0));
        }
        return Ok(());
    }

    Err(format!("cannot read detection '{}'", entry.trim()))
}

/// Render frames in the frame log format, one line per frame
pub fn render_frame_log(frames: &[DetectionFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        if frame.detections.is_empty() {
            let _ = writeln!(out, "frame {}: {}", frame.frame_index, NO_DETECTIONS);
            continue;
        }
        let entries: Vec<String> = frame
            .detections
            .iter()
            .map(|d| format!("{} {}", d.label, d.confidence))
            .collect();
        let _ = writeln!(out, "frame {}: {}", frame.frame_index, entries.join(", "));
    }
    out
}

/// Read and parse a frame log file
pub fn read_frame_log(path: &Path) -> Result<Vec<DetectionFrame>, FrameLogError> {
    let contents = decode_frame_log(&std::fs::read(path)?);
    let frames = parse_frame_log(&contents)?;
    log::debug!("Read {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Write frames to a frame log file, replacing it
pub fn write_frame_log(path: &Path, frames: &[DetectionFrame]) -> Result<(), FrameLogError> {
    std::fs::write(path, render_frame_log(frames))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_confidence_form() {
        let frames = parse_frame_log("frame 0: no detections\nframe 1: hook 0.83, straight 0.41\n")
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert!(frames[0].detections.is_empty());
        assert_eq!(frames[1].frame_index, 1);
        assert_eq!(frames[1].detections[0], Detection::new("hook", 0.83));
        assert_eq!(frames[1].detections[1], Detection::new("straight", 0.41));
    }

    #[test]
    fn test_parse_legacy_count_form() {
        let frames = parse_frame_log("frame 4: 1 bag, 2 hook, 0 uppercut").unwrap();

        let labels: Vec<&str> = frames[0].detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["bag", "hook"]);
        assert!(frames[0].detections.iter().all(|d| d.confidence == 1.0));
    }

    #[test]
    fn test_multi_word_labels() {
        let frames = parse_frame_log("frame 2: no punch 0.7").unwrap();
        assert_eq!(frames[0].detections[0].label, "no punch");
    }

    #[test]
    fn test_headers_are_skipped() {
        let text = "Source: bag.avi\nDevice: cpu\n\n=====\nFRAME DETECTIONS:\n=====\n\n\
                    frames: 1\nframe 0: uppercut 0.5\n";
        let frames = parse_frame_log(text).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let err = parse_frame_log("frame 0: hook 0.5\nframe x: hook 0.5").unwrap_err();
        match err {
            FrameLogError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {:?}", other),
        }

        assert!(parse_frame_log("frame 3 hook 0.5").is_err());
        assert!(parse_frame_log("frame 3: hook").is_err());
        assert!(parse_frame_log("frame 3: hook NaN").is_err());
        assert!(parse_frame_log("frame 3: hook 7.5").is_err());
        assert!(parse_frame_log("frame 3: straight -3").is_err());
        assert!(parse_frame_log("frame 3: hook 1.0, straight 0").is_ok());
    }

    #[test]
    fn test_render_then_parse() {
        let frames = vec![
            DetectionFrame::empty(0),
            DetectionFrame::new(
                1,
                vec![Detection::new("hook", 0.8333), Detection::new("straight", 0.25)],
            ),
        ];

        let text = render_frame_log(&frames);
        assert!(text.starts_with("frame 0: no detections\n"));
        assert_eq!(parse_frame_log(&text).unwrap(), frames);
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inference_log.txt");
        let frames = vec![DetectionFrame::new(7, vec![Detection::new("uppercut", 0.66)])];

        write_frame_log(&path, &frames).unwrap();
        assert_eq!(read_frame_log(&path).unwrap(), frames);
    }

    #[test]
    fn test_huge_legacy_count_is_one_detection() {
        let frames = parse_frame_log("frame 0: 4000000000 hook").unwrap();
        assert_eq!(frames[0].detections, vec![Detection::new("hook", 1.0)]);

        assert!(parse_frame_log("frame 0: 99999999999999999999999 hook").is_err());
    }

    #[test]
    fn test_leading_bom_is_ignored() {
        let text = "\u{feff}frame 0: hook 0.9\nframe 1: no detections\n";
        let frames = parse_frame_log(text).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].frame_index, 0);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"frame 0: hook 0.9\n");
        assert_eq!(decode_frame_log(&bytes), "frame 0: hook 0.9\n");
    }

    #[test]
    fn test_decode_utf16_logs() {
        let text = "frame 0: hook 0.9\nframe 1: no detections\n";

        let mut le = vec![0xFF, 0xFE];
        le.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(decode_frame_log(&le), text);

        let mut be = vec![0xFE, 0xFF];
        be.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(decode_frame_log(&be), text);
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let bytes = b"Source: caf\xe9.avi\nframe 0: hook 0.5\n";
        let text = decode_frame_log(bytes);
        assert!(text.starts_with("Source: café.avi"));
        assert_eq!(parse_frame_log(&text).unwrap().len(), 1);
    }

    #[test]
    fn test_read_utf16_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inference_log.txt");

        let mut bytes = vec![0xFF, 0xFE];
        let text = "frame 0: hook 0.8\r\nframe 1: hook 0.7\r\n";
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        std::fs::write(&path, bytes).unwrap();

        let frames = read_frame_log(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].detections[0], Detection::new("hook", 0.7));
    }
}
