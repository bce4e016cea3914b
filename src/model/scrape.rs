use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot produced by the scraper. Immutable once produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub html: String,
    pub element_tree: Value,
    pub element_tree_trimmed: Value,
    pub id_to_xpath: HashMap<String, String>,
    #[serde(default)]
    pub screenshots: Vec<Vec<u8>>,
}
