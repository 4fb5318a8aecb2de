//! Scraping the answer site.
//!
//! The site is scraped in two phases:
//!
//! 1. **Indexing**: [`links::discover_links`] reads the listing page and
//!    returns every question page URL
//! 2. **Extraction**: each question page is fetched through a
//!    [`fetch::PageSource`] and turned into a
//!    [`QuestionRecord`](crate::models::QuestionRecord) by
//!    [`table::extract_question`]
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | HTTP download with a browser User-Agent and a 10 s timeout |
//! | [`links`] | `.blog-post ul li a` link collection on the listing page |
//! | [`table`] | Question title and answer table extraction with fallbacks |
//!
//! Failed downloads and pages without a usable table are logged and come
//! back as `None`; nothing in this module returns an error.

pub mod fetch;
pub mod links;
pub mod table;
