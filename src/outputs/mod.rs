//! Persistence for extracted and translated questions.
//!
//! # Submodules
//!
//! - [`json`]: Snapshot writer and loader for top-level JSON arrays
//! - [`store`]: Deduplicating store of extracted questions (`data.json`)
//!
//! # Output Structure
//!
//! ```text
//! ./
//! ├── data.json     # [{url, question_en, variants_en: [{variant, points}]}]
//! └── dataRu.json   # [{url, question_en, question, variants: [{variant, points}]}]
//! ```

pub mod json;
pub mod store;
