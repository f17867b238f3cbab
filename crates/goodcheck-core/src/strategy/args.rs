//! Shell-style argument splitting
//!
//! Whitespace separates tokens, `"` and `'` group, backslashes stay literal so
//! Windows paths survive untouched.

use crate::error::{Error, Result};

/// Split a command line into argument tokens.
///
/// Quote characters are removed and quoted runs join with adjacent unquoted
/// text, so `--hostlist="C:\a b\list.txt"` yields one token
/// `--hostlist=C:\a b\list.txt`.
pub fn split_arguments(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(Error::UnbalancedQuote {
            input: input.to_string(),
        });
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_plain() {
        let args = split_arguments("  --wf-tcp=80,443   --new ").unwrap();
        assert_eq!(args, vec!["--wf-tcp=80,443", "--new"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_arguments("").unwrap().is_empty());
        assert!(split_arguments("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_split_quoted_path() {
        let args =
            split_arguments(r#"--hostlist="C:\zapret lists\list.txt" --dpi-desync=fake"#).unwrap();
        assert_eq!(
            args,
            vec![r"--hostlist=C:\zapret lists\list.txt", "--dpi-desync=fake"]
        );
    }

    #[test]
    fn test_split_single_quotes_keep_double() {
        let args = split_arguments(r#"-H 'User-Agent: "x"'"#).unwrap();
        assert_eq!(args, vec!["-H", r#"User-Agent: "x""#]);
    }

    #[test]
    fn test_split_empty_quoted_token() {
        let args = split_arguments(r#"--a "" --b"#).unwrap();
        assert_eq!(args, vec!["--a", "", "--b"]);
    }

    #[test]
    fn test_split_unbalanced() {
        let err = split_arguments(r#"--user-agent "broken"#).unwrap_err();
        assert!(matches!(err, Error::UnbalancedQuote { .. }));
    }

    proptest! {
        #[test]
        fn prop_unquoted_matches_split_whitespace(input in "[a-z0-9=,:./ \t-]{0,64}") {
            let expected: Vec<String> = input.split_whitespace().map(String::from).collect();
            prop_assert_eq!(split_arguments(&input).unwrap(), expected);
        }
    }
}
