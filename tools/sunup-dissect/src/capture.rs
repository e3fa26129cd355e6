//! MMIO capture parsing.
//!
//! Input is the CSV a JTAG watchpoint logger produces when armed on the
//! RSB register block: one access per line,
//! `timestamp,op,offset,value`, where `op` is `R` or `W`, `offset` is the
//! register offset within the block and values are hex (with or without a
//! `0x` prefix). Blank lines and `#` comments are skipped.

use anyhow::{bail, Context, Result};

/// One captured register access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmioAccess {
    pub timestamp: f64,
    pub write: bool,
    pub offset: u32,
    pub value: u32,
}

fn parse_hex(field: &str) -> Result<u32> {
    let digits = field.trim().trim_start_matches("0x");
    u32::from_str_radix(digits, 16).with_context(|| format!("bad hex value {field:?}"))
}

/// Parse one capture line. `Ok(None)` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<MmioAccess>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split(',');
    let mut next = |what: &str| {
        fields
            .next()
            .with_context(|| format!("missing {what} in line {line:?}"))
    };

    let timestamp: f64 = next("timestamp")?.trim().parse().context("bad timestamp")?;
    let write = match next("op")?.trim() {
        "W" | "w" => true,
        "R" | "r" => false,
        other => bail!("bad op {other:?} in line {line:?}"),
    };
    let offset = parse_hex(next("offset")?)?;
    let value = parse_hex(next("value")?)?;

    Ok(Some(MmioAccess { timestamp, write, offset, value }))
}

/// Parse a whole capture.
pub fn parse_capture(input: &str) -> Result<Vec<MmioAccess>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(n, line)| match parse_line(line) {
            Ok(Some(access)) => Some(Ok(access)),
            Ok(None) => None,
            Err(e) => Some(Err(e.context(format!("line {}", n + 1)))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reads_writes_and_comments() {
        let capture = "\
# armed on RSB block
0.000010,W,0x2c,0x4e
0.000012,R,0x0c,01
";
        let accesses = parse_capture(capture).unwrap();
        assert_eq!(accesses.len(), 2);
        assert_eq!(
            accesses[0],
            MmioAccess { timestamp: 0.000010, write: true, offset: 0x2c, value: 0x4e }
        );
        assert!(!accesses[1].write);
        assert_eq!(accesses[1].value, 1);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_capture("0.1,X,0x00,0x00").is_err());
        assert!(parse_capture("0.1,W,0x00").is_err());
        assert!(parse_capture("nan?,W,0x00,0x00").is_err());
    }
}
