//! printf-style filename patterns with a single integer placeholder
//!
//! `particles.%07i.psnap` formats counter 12 as `particles.0000012.psnap`.
//! Supported conversions: `%d` / `%i` with optional `0` flag and width,
//! plus `%%` for a literal percent sign.

use crate::error::{TracerError, TracerResult};

#[derive(Debug, Clone, PartialEq)]
pub struct FilenamePattern {
    prefix: String,
    suffix: String,
    zero_pad: bool,
    width: usize,
}

impl FilenamePattern {
    pub fn parse(pattern: &str) -> TracerResult<Self> {
        let invalid = |message: &str| TracerError::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec: Option<(bool, usize)> = None;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if spec.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if spec.is_some() {
                return Err(invalid("more than one placeholder"));
            }

            let zero_pad = chars.peek() == Some(&'0');
            if zero_pad {
                chars.next();
            }
            let mut width = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                width = width * 10 + d as usize;
                chars.next();
            }
            match chars.next() {
                Some('d') | Some('i') => spec = Some((zero_pad, width)),
                _ => return Err(invalid("only %d and %i conversions are supported")),
            }
        }

        let (zero_pad, width) = spec.ok_or_else(|| invalid("no integer placeholder"))?;
        Ok(Self { prefix, suffix, zero_pad, width })
    }

    /// Substitute `counter` into the placeholder
    pub fn format(&self, counter: i64) -> String {
        let number = if self.zero_pad {
            format!("{:0width$}", counter, width = self.width)
        } else {
            format!("{:>width$}", counter, width = self.width)
        };
        format!("{}{}{}", self.prefix, number, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_padded_counter() {
        let p = FilenamePattern::parse("particles.%07i.psnap").unwrap();
        assert_eq!(p.format(12), "particles.0000012.psnap");
        assert_eq!(p.format(-1), "particles.-000001.psnap");
    }

    #[test]
    fn plain_and_literal_percent() {
        let p = FilenamePattern::parse("out_%d_100%%.bin").unwrap();
        assert_eq!(p.format(3), "out_3_100%.bin");
        let p = FilenamePattern::parse("%3d").unwrap();
        assert_eq!(p.format(7), "  7");
    }

    #[test]
    fn rejects_bad_patterns() {
        assert!(FilenamePattern::parse("particles.psnap").is_err());
        assert!(FilenamePattern::parse("%d_%d").is_err());
        assert!(FilenamePattern::parse("%s.psnap").is_err());
        assert!(FilenamePattern::parse("trailing%").is_err());
    }
}
