//! Command-line interface definitions for the two binaries.
//!
//! Every option has a default taken from [`crate::config`], so both
//! programs run with no arguments at all. Flags only exist to point the
//! runs at other files or another listing page.

use crate::config::{BASE_URL, CONFIG_FILE, DATA_FILE, TRANSLATED_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Crawl the answer listing page and store every question page as JSON.
///
/// ```sh
/// feud_parse
/// feud_parse --data-file ./out/data.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ParseCli {
    /// Listing page that links to the question pages
    #[arg(long, default_value = BASE_URL)]
    pub base_url: String,

    /// JSON store of extracted questions (read on startup, rewritten after each page)
    #[arg(short, long, default_value = DATA_FILE)]
    pub data_file: PathBuf,
}

/// Translate the extracted questions with DeepL.
///
/// ```sh
/// DEEPL_AUTH_KEY=... feud_translate
/// feud_translate -c ./config.yaml -o ./out/dataRu.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct TranslateCli {
    /// JSON store produced by `feud_parse`
    #[arg(short, long, default_value = DATA_FILE)]
    pub input_file: PathBuf,

    /// Translated output (read on startup, rewritten after each record)
    #[arg(short, long, default_value = TRANSLATED_FILE)]
    pub output_file: PathBuf,

    /// Path to config.yaml holding the DeepL settings
    #[arg(short, long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// DeepL authentication key (overrides the config file)
    #[arg(long, env = "DEEPL_AUTH_KEY", hide_env_values = true)]
    pub deepl_auth_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_defaults() {
        let cli = ParseCli::parse_from(["feud_parse"]);
        assert_eq!(cli.base_url, BASE_URL);
        assert_eq!(cli.data_file, PathBuf::from("data.json"));
    }

    #[test]
    fn test_parse_cli_short_flags() {
        let cli = ParseCli::parse_from(["feud_parse", "-d", "/tmp/data.json"]);
        assert_eq!(cli.data_file, PathBuf::from("/tmp/data.json"));
    }

    #[test]
    fn test_translate_cli_defaults() {
        let cli = TranslateCli::parse_from(["feud_translate"]);
        assert_eq!(cli.input_file, PathBuf::from("data.json"));
        assert_eq!(cli.output_file, PathBuf::from("dataRu.json"));
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
    }

    #[test]
    fn test_translate_cli_key_flag() {
        let cli = TranslateCli::parse_from(["feud_translate", "--deepl-auth-key", "abc:fx"]);
        assert_eq!(cli.deepl_auth_key.as_deref(), Some("abc:fx"));
    }
}
