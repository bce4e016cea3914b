//! `FakeScraper`: wraps whatever the `FakePage` already holds into a
//! `ScrapedPage`, with a trivial one-element id→xpath map so tests have an
//! `element_id` to target.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::EngineResult;
use crate::model::ScrapedPage;
use crate::ports::{BrowserState, Scraper};

pub struct FakeScraper;

#[async_trait]
impl Scraper for FakeScraper {
    async fn scrape(&self, browser_state: &BrowserState, _url: Option<&str>) -> EngineResult<ScrapedPage> {
        let html = match &browser_state.page {
            Some(page) => page.content().await?,
            None => String::new(),
        };
        let mut id_to_xpath = HashMap::new();
        id_to_xpath.insert("e1".to_string(), "//button[1]".to_string());
        id_to_xpath.insert("e2".to_string(), "//button[2]".to_string());

        Ok(ScrapedPage {
            html,
            element_tree: serde_json::json!({"tag": "body", "children": []}),
            element_tree_trimmed: serde_json::json!({"tag": "body", "children": []}),
            id_to_xpath,
            screenshots: vec![b"fake-screenshot".to_vec()],
        })
    }
}
