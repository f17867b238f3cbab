//! Placeholder substitution for strategy fragments

use std::path::{Path, PathBuf};

use crate::config::PlaceholderConfig;

/// Fake SNI used by `FAKESNI`
pub const FAKE_SNI: &str = "www.google.com";

/// TLS ClientHello prefix used by `FAKEHEX`
pub const FAKE_HEX: &str = "1603030135010001310303424143facf5c983ac8ff20b819cfd634cbf5143c0005b2b8b142a6cd3\
35012c220008969b6b387683dedb4114d466ca90be3212b2bde0c4f56261a9801";

/// Replacement table applied to every directive value and raw fragment.
///
/// Tokens are replaced literally and in a fixed order: `FAKESNI`, `FAKEHEX`,
/// `FAKEHEXBYTES`, `%LISTDIR%`, `%BIN%`. A token whose replacement is empty
/// is left in place. Since `FAKEHEX` runs before `FAKEHEXBYTES`, the latter
/// only survives as `<hex>BYTES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    /// Replacement for `FAKESNI`
    pub fake_sni: String,
    /// Replacement for `FAKEHEX`
    pub fake_hex: String,
    /// Replacement for `FAKEHEXBYTES`
    pub fake_hex_bytes: String,
    /// Replacement for `%LISTDIR%`
    pub list_dir: String,
    /// Replacement for `%BIN%`
    pub bin_dir: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            fake_sni: FAKE_SNI.to_string(),
            fake_hex: FAKE_HEX.to_string(),
            fake_hex_bytes: String::new(),
            list_dir: String::new(),
            bin_dir: String::new(),
        }
    }
}

impl Placeholders {
    /// Resolve placeholders for a strategy file.
    ///
    /// `%LISTDIR%` and `%BIN%` come from the `LISTDIR` / `BIN` environment
    /// variables, falling back to the file's parent directory.
    pub fn for_file(path: impl AsRef<Path>) -> Self {
        Self::for_file_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`for_file`](Self::for_file), reading variables through `lookup`.
    ///
    /// A variable that is set but empty wins over the parent directory, which
    /// leaves its token unreplaced.
    pub fn for_file_with<F>(path: impl AsRef<Path>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = base_dir(path.as_ref()).display().to_string();
        Self {
            list_dir: lookup("LISTDIR").unwrap_or_else(|| base.clone()),
            bin_dir: lookup("BIN").unwrap_or(base),
            ..Self::default()
        }
    }

    /// Apply non-empty overrides from configuration
    #[must_use]
    pub fn with_overrides(mut self, overrides: &PlaceholderConfig) -> Self {
        let pairs = [
            (&mut self.fake_sni, &overrides.fake_sni),
            (&mut self.fake_hex, &overrides.fake_hex),
            (&mut self.fake_hex_bytes, &overrides.fake_hex_bytes),
            (&mut self.list_dir, &overrides.list_dir),
            (&mut self.bin_dir, &overrides.bin_dir),
        ];
        for (slot, value) in pairs {
            if !value.is_empty() {
                slot.clone_from(value);
            }
        }
        self
    }

    /// Substitute all placeholders in `text` and trim the result
    pub fn apply(&self, text: &str) -> String {
        let table = [
            ("FAKESNI", self.fake_sni.as_str()),
            ("FAKEHEX", self.fake_hex.as_str()),
            ("FAKEHEXBYTES", self.fake_hex_bytes.as_str()),
            ("%LISTDIR%", self.list_dir.as_str()),
            ("%BIN%", self.bin_dir.as_str()),
        ];

        let mut out = text.to_string();
        for (token, replacement) in table {
            if !replacement.is_empty() {
                out = out.replace(token, replacement);
            }
        }
        out.trim().to_string()
    }
}

fn base_dir(path: &Path) -> PathBuf {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf())
}
