//! Text detection and content fingerprinting.
//!
//! A file is text when its extension does not map to a binary MIME family and
//! a sample of its first bytes decodes as UTF-8 without NUL bytes. Binary
//! guesses are decided without opening the file.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::constants::scan::{HASH_BUFFER_BYTES, SNIFF_SAMPLE_BYTES};

/// Coarse MIME family guessed from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeGuess {
    Text,
    Binary,
    Unknown,
}

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "adoc", "json", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "xml", "html", "htm", "css", "scss", "less", "csv", "tsv", "sql", "graphql", "proto", "rs",
    "py", "pyi", "js", "mjs", "cjs", "jsx", "ts", "tsx", "go", "java", "kt", "kts", "scala",
    "groovy", "gradle", "rb", "php", "c", "h", "cc", "cpp", "hpp", "cs", "swift", "m", "lua",
    "pl", "r", "dart", "ex", "exs", "erl", "hs", "ml", "clj", "sh", "bash", "zsh", "fish", "ps1",
    "bat", "cmd", "dockerfile", "tf", "hcl", "vue", "svelte", "lock", "env", "properties", "log",
    "svg", "tex", "mk", "cmake", "nix",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "psd", "pdf", "zip", "gz", "tgz",
    "bz2", "xz", "7z", "rar", "tar", "jar", "war", "ear", "class", "exe", "dll", "so", "dylib",
    "a", "o", "obj", "lib", "bin", "dat", "db", "sqlite", "sqlite3", "woff", "woff2", "ttf", "otf",
    "eot", "mp3", "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm", "wasm", "pyc", "pyo",
    "whl", "egg", "iso", "dmg", "deb", "rpm", "parquet", "avro", "npy", "pkl", "onnx", "pt",
];

/// Guess the MIME family from a lowercased extension
pub fn guess_mime(extension: Option<&str>) -> MimeGuess {
    match extension {
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => MimeGuess::Text,
        Some(ext) if BINARY_EXTENSIONS.contains(&ext) => MimeGuess::Binary,
        _ => MimeGuess::Unknown,
    }
}

/// Decide whether a byte sample looks like text.
///
/// A multi-byte sequence cut off at the end of the sample is not an error.
pub fn sample_is_text(sample: &[u8]) -> bool {
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Read up to the sniff sample from the head of a file
pub fn read_sample(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(SNIFF_SAMPLE_BYTES);
    file.take(SNIFF_SAMPLE_BYTES as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

/// Classify a file as text. Read errors count as not text.
pub fn is_text_file(path: &Path, extension: Option<&str>) -> bool {
    if guess_mime(extension) == MimeGuess::Binary {
        return false;
    }
    read_sample(path)
        .map(|sample| sample_is_text(&sample))
        .unwrap_or(false)
}

/// Stream a file through SHA-256 with a fixed-size buffer; returns lowercase hex
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_BYTES];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Some("rs")), MimeGuess::Text);
        assert_eq!(guess_mime(Some("png")), MimeGuess::Binary);
        assert_eq!(guess_mime(Some("weird")), MimeGuess::Unknown);
        assert_eq!(guess_mime(None), MimeGuess::Unknown);
    }

    #[test]
    fn test_sample_is_text() {
        assert!(sample_is_text(b"fn main() {}\n"));
        assert!(sample_is_text(b""));
        assert!(!sample_is_text(b"abc\0def"));
        assert!(!sample_is_text(&[0xff, 0xfe, 0x41]));
        // "é" cut after its first byte
        assert!(sample_is_text(&[b'a', 0xc3]));
    }

    #[test]
    fn test_is_text_file() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("Makefile");
        let binary = dir.path().join("blob.dat2");
        let image = dir.path().join("logo.png");
        fs::write(&text, "all:\n\tcargo build\n").unwrap();
        fs::write(&binary, [0u8, 1, 2, 3]).unwrap();
        fs::write(&image, "not really a png").unwrap();

        assert!(is_text_file(&text, None));
        assert!(!is_text_file(&binary, Some("dat2")));
        assert!(!is_text_file(&image, Some("png")));
        assert!(!is_text_file(&dir.path().join("missing"), None));
    }

    #[test]
    fn test_hash_file_matches_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_file_streams_past_buffer() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let content = "x".repeat(HASH_BUFFER_BYTES * 2 + 17);
        fs::write(&a, &content).unwrap();
        fs::write(&b, &content).unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }
}
