use std::fs;
use std::path::Path;

use miette::{bail, IntoDiagnostic, Result};

use crate::error;
use crate::machine::MEMORY_SIZE;
use crate::span::{Idx, Span};

/// Read a program image from disk, choosing the format by extension.
///
/// `.ls8` files hold one binary literal per line, `.bin` files are raw bytes.
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let Some(ext) = path.extension() else {
        bail!("File has no extension. Exiting...");
    };
    match ext.to_str() {
        Some("ls8") => {
            let src = fs::read_to_string(path).into_diagnostic()?;
            parse(&src)
        }
        Some("bin") => {
            let bytes = fs::read(path).into_diagnostic()?;
            if bytes.len() > MEMORY_SIZE {
                return Err(error::load_too_large(None, "", bytes.len()));
            }
            Ok(bytes)
        }
        _ => bail!("File has unknown extension. Exiting..."),
    }
}

/// Parse program text into a memory image.
///
/// Only the part of each line before `#` is considered. Lines starting with
/// `0` or `1` contribute one byte, read from their first 8 characters.
/// Everything else is skipped.
pub fn parse(src: &str) -> Result<Vec<u8>> {
    let mut image = Vec::new();
    let mut offs = 0;
    for line in src.split_inclusive('\n') {
        let start = offs;
        offs += line.len();

        let code = line.split('#').next().unwrap_or_default();
        if !code.starts_with(['0', '1']) {
            continue;
        }
        let code = code.trim_end();
        let end = code.char_indices().nth(8).map_or(code.len(), |(i, _)| i);
        let lit = &code[..end];
        let span = Span::new(Idx(start), lit.len());

        if !lit.chars().all(|ch| ch == '0' || ch == '1') {
            return Err(error::load_bad_literal(span, src));
        }
        let byte = u8::from_str_radix(lit, 2).map_err(|_| error::load_bad_literal(span, src))?;

        if image.len() == MEMORY_SIZE {
            let len = image.len() + 1 + remaining_bytes(&src[offs..]);
            return Err(error::load_too_large(Some(span), src, len));
        }
        image.push(byte);
    }
    Ok(image)
}

// Rough count of byte lines after the overflow, for the error message
fn remaining_bytes(rest: &str) -> usize {
    rest.lines()
        .filter(|line| line.starts_with(['0', '1']))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let image = parse("10000010\n00000000\n00001000\n#comment\n\n00000001\n").unwrap();
        assert_eq!(image, [0b10000010, 0, 8, 1]);
    }

    #[test]
    fn trailing_comments_and_crlf() {
        let src = "10000010 # LDI R0,8\r\n00000000\r\n00001000\r\n  # indented comment\r\n01000111 # PRN R0\r\n00000000\r\n00000001 # HLT";
        let image = parse(src).unwrap();
        assert_eq!(image, [0b10000010, 0, 8, 0b01000111, 0, 1]);
    }

    #[test]
    fn reads_first_eight_characters() {
        assert_eq!(parse("0000000101\n").unwrap(), [1]);
        assert_eq!(parse("101\n").unwrap(), [5]);
    }

    #[test]
    fn ignores_lines_not_starting_with_a_digit() {
        assert_eq!(parse("LDI\n 00000001\n\t10\n00000010\n").unwrap(), [2]);
    }

    #[test]
    fn rejects_bad_digits() {
        let report = parse("00000001\n0102\n").unwrap_err();
        assert_eq!(
            report.code().map(|code| code.to_string()),
            Some("load::bad_literal".to_string())
        );
        let label = report.labels().and_then(|mut labels| labels.next()).unwrap();
        assert_eq!(label.offset(), 9);
        assert_eq!(label.len(), 4);
    }

    #[test]
    fn rejects_oversized_programs() {
        let src = "00000000\n".repeat(MEMORY_SIZE + 2);
        let report = parse(&src).unwrap_err();
        assert_eq!(
            report.code().map(|code| code.to_string()),
            Some("load::too_large".to_string())
        );
        assert!(report.to_string().contains("258 bytes"));
        assert_eq!(parse(&"1\n".repeat(MEMORY_SIZE)).unwrap().len(), MEMORY_SIZE);
    }
}
