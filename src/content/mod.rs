//! Content sanitization and enrichment.

mod emoticon;
mod enrich;

pub use emoticon::{normalize_name, EmoticonRepository, EmoticonSet};
pub use enrich::{autolink, escape_html, Enricher};
