use anyhow::{Context, Result};
use std::path::Path;

/// Parse numbers separated by newlines, commas or whitespace. Blank lines and
/// `#` comments are skipped.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let val: f64 = token
                .parse()
                .with_context(|| format!("line {} is not f64: {}", idx + 1, token))?;
            out.push(val);
        }
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators_and_comments() {
        let values = parse_f64_series("# features\n1.5, 2\n\n3 4.25\n").unwrap();
        assert_eq!(values, vec![1.5, 2.0, 3.0, 4.25]);
    }

    #[test]
    fn bad_token_names_the_line() {
        let err = parse_f64_series("1.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_f64_series("# nothing\n\n").is_err());
    }
}
