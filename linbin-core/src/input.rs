use std::path::Path;

use linbin_common::{LinbinError, Result};

/// Numbers separated by whitespace, commas or semicolons. `#` comments out the rest of a line.
pub fn parse_samples(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("");
        for token in line.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
            if token.is_empty() {
                continue;
            }
            let value = parse_token(token).ok_or_else(|| LinbinError::InvalidSample {
                line: idx + 1,
                token: token.to_string(),
            })?;
            out.push(value);
        }
    }
    Ok(out)
}

fn parse_token(token: &str) -> Option<f64> {
    // f64::from_str takes nan/inf/infinity in any case, but not R's NA
    if token == "NA" {
        return Some(f64::NAN);
    }
    token.parse().ok()
}

/// `.json` files hold a JSON array of numbers; anything else is read as text.
pub fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        parse_samples(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mixed_separators_and_comments() {
        let xs = parse_samples("1, 2;3\n  4.5e1 # trailing\n# whole line\n-0.25").unwrap();
        assert_eq!(xs, vec![1.0, 2.0, 3.0, 45.0, -0.25]);
    }

    #[test]
    fn non_finite_tokens() {
        let xs = parse_samples("nan NA inf -Inf").unwrap();
        assert!(xs[0].is_nan() && xs[1].is_nan());
        assert_eq!(xs[2], f64::INFINITY);
        assert_eq!(xs[3], f64::NEG_INFINITY);
    }

    #[test]
    fn bad_token_reports_line() {
        let err = parse_samples("1\n2 x3\n").unwrap_err();
        assert!(matches!(err, LinbinError::InvalidSample { line: 2, ref token } if token == "x3"));
    }

    #[test]
    fn empty_text() {
        assert!(parse_samples("").unwrap().is_empty());
    }

    #[test]
    fn reads_json_and_text_files() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, "[1.5, 2, -3]").unwrap();
        assert_eq!(read_samples(json.path()).unwrap(), vec![1.5, 2.0, -3.0]);

        let mut txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(txt, "1.5\n2\n-3").unwrap();
        assert_eq!(read_samples(txt.path()).unwrap(), vec![1.5, 2.0, -3.0]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, "[1.5, ").unwrap();
        assert!(matches!(read_samples(json.path()), Err(LinbinError::Json(_))));
    }
}
