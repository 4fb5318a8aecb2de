//! # Feud Answers
//!
//! A resumable crawler for a Family Feud answer site plus a DeepL
//! translation pass over what it collected.
//!
//! ## Binaries
//!
//! - `feud_parse`: reads the listing page, visits every question page not
//!   yet in `data.json`, and appends each extracted question to it
//! - `feud_translate`: translates `data.json` into `dataRu.json`, skipping
//!   records that are already translated
//!
//! ## Architecture
//!
//! The extraction run is a pipeline:
//! 1. **Indexing**: [`scrapers::links`] collects question URLs from the listing page
//! 2. **Fetching**: [`scrapers::fetch`] downloads pages, 10 at a time ([`crawl`])
//! 3. **Extraction**: [`scrapers::table`] reads the question and its scored answers
//! 4. **Output**: [`outputs::store`] appends each record and rewrites `data.json`
//!
//! Both runs persist after every record, so stopping and restarting
//! either binary picks up where it left off.

pub mod api;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod models;
pub mod outputs;
pub mod scrapers;
pub mod translate;
pub mod utils;
