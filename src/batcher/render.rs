//! Text layout for batched file content.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::scanner::FileRecord;

/// Marker appended when a file exceeds the per-file character cap
pub const FILE_TRUNCATED_MARKER: &str = "... [file truncated] ...\n";

/// `--- path (Last modified: YYYY-MM-DD HH:MM) ---`
pub fn file_header(record: &FileRecord) -> String {
    format!(
        "--- {} (Last modified: {}) ---\n",
        record.path,
        record.modified_label()
    )
}

/// Header for one chunk of an oversized file, with its byte range
pub fn chunk_header(record: &FileRecord, chunk: u64, total: u64, start: u64, end: u64) -> String {
    format!(
        "--- {} (Last modified: {}) [chunk {}/{}, bytes {}-{}] ---\n",
        record.path,
        record.modified_label(),
        chunk,
        total,
        start,
        end
    )
}

/// Line listing byte-identical copies of the emitted file
pub fn copies_line(copies: &[&str]) -> String {
    format!("(identical copies: {})\n", copies.join(", "))
}

/// `"   7 | content"`, numbered from 1
pub fn numbered_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .enumerate()
        .map(|(i, line)| format!("{:4} | {}\n", i + 1, line))
}

/// Read the byte window `[start, start + len)`; invalid UTF-8 at the window
/// edges is replaced.
pub fn read_window(path: &Path, start: u64, len: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut buffer = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Character count used for budgets
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::test_support::text_record;
    use tempfile::TempDir;

    #[test]
    fn test_numbered_lines_format() {
        let lines: Vec<String> = numbered_lines("a\nb").collect();
        assert_eq!(lines, vec!["   1 | a\n", "   2 | b\n"]);
        let many: Vec<String> = numbered_lines(&"x\n".repeat(12345)).collect();
        assert_eq!(many.last().unwrap(), "12345 | x\n");
    }

    #[test]
    fn test_headers() {
        let record = text_record("logs/app.log", 10);
        assert_eq!(
            file_header(&record),
            "--- logs/app.log (Last modified: unknown) ---\n"
        );
        assert_eq!(
            chunk_header(&record, 2, 5, 100, 200),
            "--- logs/app.log (Last modified: unknown) [chunk 2/5, bytes 100-200] ---\n"
        );
    }

    #[test]
    fn test_read_window() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "0123456789").unwrap();
        assert_eq!(read_window(&path, 3, 4).unwrap(), "3456");
        assert_eq!(read_window(&path, 8, 10).unwrap(), "89");
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        assert_eq!(char_len("héllo"), 5);
    }
}
