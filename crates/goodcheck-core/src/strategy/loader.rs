//! Strategy directive file compiler
//!
//! A strategy file holds one raw fragment or directive per line. Port-80 and
//! port-443 directive lists are merged into combined `winws` command lines,
//! one per (port-80, port-443) pair.

use std::path::Path;

use tracing::{debug, info};

use super::args::split_arguments;
use super::{Placeholders, Strategy, StrategySet};
use crate::config::PlaceholderConfig;
use crate::error::{Error, Result};

const EXTRA_KEYS: &str = "_strategyextrakeys";
const CURL_EXTRA_KEYS: &str = "_strategycurlextrakeys";
const PORT80: &str = "_strategyport80";
const PORT443: &str = "_strategyport443";

/// Filter token that opens the port-80 section of a combined strategy
pub const FILTER_TCP_80: &str = "--filter-tcp=80";
/// Filter token that opens the port-443 section of a combined strategy
pub const FILTER_TCP_443: &str = "--filter-tcp=443";

/// Directives collected from a strategy file, before combination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    /// `_strategyExtraKeys` value, prefixed to every strategy
    pub extra_keys: String,
    /// `_strategyCurlExtraKeys` value, passed to every probe
    pub curl_extra_keys: String,
    /// Plain fragment lines
    pub raw: Vec<String>,
    /// `_strategyPort80` values
    pub port80: Vec<String>,
    /// `_strategyPort443` values
    pub port443: Vec<String>,
}

impl DirectiveSet {
    /// Parse file content, substituting placeholders in every value
    pub fn parse(content: &str, placeholders: &Placeholders) -> Self {
        let mut set = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('/') {
                continue;
            }

            if let Some((key, value)) = line.split_once('#') {
                match key.to_ascii_lowercase().as_str() {
                    EXTRA_KEYS => {
                        set.extra_keys = placeholders.apply(value);
                        continue;
                    }
                    CURL_EXTRA_KEYS => {
                        set.curl_extra_keys = placeholders.apply(value);
                        continue;
                    }
                    PORT80 => {
                        set.port80.push(placeholders.apply(value));
                        continue;
                    }
                    PORT443 => {
                        set.port443.push(placeholders.apply(value));
                        continue;
                    }
                    _ => {}
                }
            }

            set.raw.push(placeholders.apply(line));
        }

        set
    }

    /// Fragments paired with port-80 entries: raw lines followed by port-443 lines
    pub fn combined_443(&self) -> Vec<&str> {
        self.raw
            .iter()
            .chain(self.port443.iter())
            .map(String::as_str)
            .collect()
    }

    /// Combine directives into numbered strategies
    pub fn compile(&self) -> Result<StrategySet> {
        let texts = if self.port80.is_empty() {
            self.standalone()
        } else {
            self.combined()?
        };

        if texts.is_empty() {
            return Err(Error::NoStrategies);
        }

        let strategies = texts
            .into_iter()
            .zip(1u32..)
            .map(|(text, index)| Strategy::new(index, text))
            .collect();

        Ok(StrategySet {
            strategies,
            probe_args: split_arguments(&self.curl_extra_keys)?,
        })
    }

    fn combined(&self) -> Result<Vec<String>> {
        let port443 = self.combined_443();
        if port443.is_empty() {
            return Err(Error::MissingPort443);
        }

        let mut texts = Vec::with_capacity(self.port80.len() * port443.len());
        for p80 in &self.port80 {
            for p443 in &port443 {
                let text = collapse_whitespace(&format!(
                    "{} --wf-tcp=80,443 {FILTER_TCP_80} {} --new {FILTER_TCP_443} {}",
                    self.extra_keys, p80, p443
                ));
                verify_filter_tokens(&text)?;
                texts.push(text);
            }
        }
        Ok(texts)
    }

    fn standalone(&self) -> Vec<String> {
        self.combined_443()
            .into_iter()
            .map(|entry| collapse_whitespace(&format!("{} {}", self.extra_keys, entry)))
            .filter(|text| !text.is_empty())
            .collect()
    }
}

/// Compiles strategy files into [`StrategySet`]s
#[derive(Debug, Clone, Default)]
pub struct StrategyLoader {
    overrides: PlaceholderConfig,
    placeholders: Option<Placeholders>,
}

impl StrategyLoader {
    /// Create a loader that resolves placeholders from the strategy file location
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply configured placeholder overrides on top of resolved values
    #[must_use]
    pub fn with_overrides(mut self, overrides: PlaceholderConfig) -> Self {
        self.overrides = overrides;
        self
    }

    /// Use a fixed placeholder table instead of resolving one per file
    #[must_use]
    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = Some(placeholders);
        self
    }

    /// Load and compile a strategy file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<StrategySet> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::strategy_file(path.display().to_string(), e.to_string()))?;
        let content = String::from_utf8_lossy(&bytes);

        let placeholders = self
            .placeholders
            .clone()
            .unwrap_or_else(|| Placeholders::for_file(path).with_overrides(&self.overrides));

        let set = self.compile(&content, &placeholders)?;
        info!(
            path = %path.display(),
            strategies = set.strategies.len(),
            probe_args = set.probe_args.len(),
            "Loaded strategy file"
        );
        Ok(set)
    }

    /// Compile strategy file content held in memory
    pub fn parse_str(&self, content: &str) -> Result<StrategySet> {
        let placeholders = self
            .placeholders
            .clone()
            .unwrap_or_else(|| Placeholders::default().with_overrides(&self.overrides));
        self.compile(content, &placeholders)
    }

    fn compile(&self, content: &str, placeholders: &Placeholders) -> Result<StrategySet> {
        let directives = DirectiveSet::parse(content, placeholders);
        debug!(
            raw = directives.raw.len(),
            port80 = directives.port80.len(),
            port443 = directives.port443.len(),
            "Parsed strategy directives"
        );
        directives.compile()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn verify_filter_tokens(text: &str) -> Result<()> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let position = |token: &'static str| -> Result<usize> {
        let mut hits = tokens.iter().enumerate().filter(|(_, t)| **t == token);
        match (hits.next(), hits.next()) {
            (Some((pos, _)), None) => Ok(pos),
            _ => Err(Error::MissingFilterToken {
                token,
                strategy: text.to_string(),
            }),
        }
    };

    let p80 = position(FILTER_TCP_80)?;
    let p443 = position(FILTER_TCP_443)?;
    if p80 > p443 {
        return Err(Error::MissingFilterToken {
            token: FILTER_TCP_80,
            strategy: text.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> StrategyLoader {
        StrategyLoader::new().with_placeholders(Placeholders::default())
    }

    #[test]
    fn test_raw_fragments() {
        let content = "// comment\n\n--dpi-desync=fake\n  --dpi-desync=split2  \n/another\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(set.strategies.len(), 2);
        assert_eq!(set.strategies[0], Strategy::new(1, "--dpi-desync=fake"));
        assert_eq!(set.strategies[1], Strategy::new(2, "--dpi-desync=split2"));
        assert!(set.probe_args.is_empty());
    }

    #[test]
    fn test_extra_keys_prefix() {
        let content = "_strategyExtraKeys#--wf-tcp=443\n--dpi-desync=fake\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(set.strategies[0].text, "--wf-tcp=443 --dpi-desync=fake");
    }

    #[test]
    fn test_directive_keys_case_insensitive() {
        let content = "_STRATEGYCURLEXTRAKEYS#--http1.1 -H \"X-A: b c\"\n--a\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(set.probe_args, vec!["--http1.1", "-H", "X-A: b c"]);
        assert_eq!(set.strategies.len(), 1);
    }

    #[test]
    fn test_scalar_directive_last_wins() {
        let content = "_strategyExtraKeys#--one\n_strategyExtraKeys#--two\n--a\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(set.strategies[0].text, "--two --a");
    }

    #[test]
    fn test_unknown_hash_line_is_fragment() {
        let content = "--dpi-desync-fake-tls=0x00#comment\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(set.strategies[0].text, "--dpi-desync-fake-tls=0x00#comment");
    }

    #[test]
    fn test_port443_only() {
        let content = "_strategyPort443#--dpi-desync=fake\n_strategyPort443#--dpi-desync=split\n";
        let set = loader().parse_str(content).unwrap();
        let texts: Vec<_> = set.strategies.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["--dpi-desync=fake", "--dpi-desync=split"]);
    }

    #[test]
    fn test_combined_product_order() {
        let content = "\
_strategyExtraKeys#--debug
_strategyPort80#--a80
_strategyPort80#--b80
--raw443
_strategyPort443#--x443
";
        let set = loader().parse_str(content).unwrap();
        let texts: Vec<_> = set.strategies.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "--debug --wf-tcp=80,443 --filter-tcp=80 --a80 --new --filter-tcp=443 --raw443",
                "--debug --wf-tcp=80,443 --filter-tcp=80 --a80 --new --filter-tcp=443 --x443",
                "--debug --wf-tcp=80,443 --filter-tcp=80 --b80 --new --filter-tcp=443 --raw443",
                "--debug --wf-tcp=80,443 --filter-tcp=80 --b80 --new --filter-tcp=443 --x443",
            ]
        );
        let indices: Vec<_> = set.strategies.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_combined_collapses_whitespace() {
        let content = "_strategyPort80#   --a   --b \n_strategyPort443#\t--c\t\t--d\n";
        let set = loader().parse_str(content).unwrap();
        assert_eq!(
            set.strategies[0].text,
            "--wf-tcp=80,443 --filter-tcp=80 --a --b --new --filter-tcp=443 --c --d"
        );
    }

    #[test]
    fn test_port80_without_443_fails() {
        let content = "_strategyPort80#--a80\n";
        let err = loader().parse_str(content).unwrap_err();
        assert!(matches!(err, Error::MissingPort443));
    }

    #[test]
    fn test_duplicate_filter_token_fails() {
        let content = "_strategyPort80#--a80 --filter-tcp=443\n--x\n";
        let err = loader().parse_str(content).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingFilterToken { token: FILTER_TCP_443, .. }
        ));
    }

    #[test]
    fn test_empty_file_fails() {
        let err = loader().parse_str("// only comments\n\n").unwrap_err();
        assert!(matches!(err, Error::NoStrategies));
    }

    #[test]
    fn test_directives_only_fails() {
        let content = "_strategyExtraKeys#--wf-tcp=443\n_strategyCurlExtraKeys#--http1.1\n";
        let err = loader().parse_str(content).unwrap_err();
        assert!(matches!(err, Error::NoStrategies));
    }

    #[test]
    fn test_placeholders_applied_to_directives() {
        let placeholders = Placeholders {
            list_dir: "/lists".to_string(),
            ..Placeholders::default()
        };
        let content = "\
_strategyExtraKeys#--hostlist=%LISTDIR%/a.txt
_strategyPort80#--sni=FAKESNI
_strategyPort443#--fake-tls=FAKEHEX
";
        let set = StrategyLoader::new()
            .with_placeholders(placeholders)
            .parse_str(content)
            .unwrap();
        let text = &set.strategies[0].text;
        assert!(text.starts_with("--hostlist=/lists/a.txt "));
        assert!(text.contains("--sni=www.google.com"));
        assert!(text.contains(super::super::placeholders::FAKE_HEX));
    }

    #[test]
    fn test_unbalanced_curl_args_fail() {
        let content = "_strategyCurlExtraKeys#-H \"broken\n--a\n";
        let err = loader().parse_str(content).unwrap_err();
        assert!(matches!(err, Error::UnbalancedQuote { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StrategyLoader::new()
            .load("/definitely/not/here/strategies.txt")
            .unwrap_err();
        assert!(matches!(err, Error::StrategyFile { .. }));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_load_lossy_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, b"--dpi-desync=fake\n--bad=\xff\xfe\n").unwrap();
        let set = StrategyLoader::new().load(&path).unwrap();
        assert_eq!(set.strategies.len(), 2);
    }
}
