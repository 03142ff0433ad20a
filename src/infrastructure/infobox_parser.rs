//! NPC infobox parser
//!
//! Locates the NPC's infobox on a wiki page by its two-column heading,
//! then pulls the portrait URL and the attribute row out of it.

#![allow(clippy::uninlined_format_args)]

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::{HarvestSettings, SourceConfig, fandom};
use super::parsing_error::{ParsingError, ParsingResult};
use crate::domain::NpcRecord;

/// Parser settings derived from the source and harvest configuration
#[derive(Debug, Clone)]
pub struct InfoboxParserConfig {
    /// Only image URLs on this host are canonicalized
    pub image_host: String,
    pub wiki_slug: String,
    /// Row label of the attribute, matched case-insensitively
    pub attribute_label: String,
}

impl InfoboxParserConfig {
    pub fn from_config(source: &SourceConfig, harvest: &HarvestSettings) -> Self {
        Self {
            image_host: source.image_host.clone(),
            wiki_slug: source.wiki_slug.clone(),
            attribute_label: harvest.attribute_label.clone(),
        }
    }
}

impl Default for InfoboxParserConfig {
    fn default() -> Self {
        Self {
            image_host: fandom::IMAGE_HOST.to_string(),
            wiki_slug: fandom::WIKI_SLUG.to_string(),
            attribute_label: fandom::ATTRIBUTE_LABEL.to_string(),
        }
    }
}

/// Parser for extracting NPC records from wiki pages
pub struct NpcInfoboxParser {
    table_selector: Selector,
    heading_selector: Selector,
    image_selector: Selector,
    row_selector: Selector,
    cell_selector: Selector,

    image_host: String,
    attribute_label: String,

    /// `<asset>.jpg/revision/latest` on the wiki's image path
    strict_image_pattern: Regex,
    /// Anything after `/revision/latest/`
    scaled_suffix_pattern: Regex,
}

impl NpcInfoboxParser {
    /// Create a new parser with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&InfoboxParserConfig::default())
    }

    /// Create parser with custom configuration
    pub fn with_config(config: &InfoboxParserConfig) -> ParsingResult<Self> {
        let strict_pattern = format!(
            r"(https://{}/{}/images/[^/]+/[^/]+/[^/]+\.jpg)/revision/latest",
            regex::escape(&config.image_host),
            regex::escape(&config.wiki_slug)
        );

        Ok(Self {
            table_selector: Self::compile_selector("table")?,
            heading_selector: Self::compile_selector(r#"th[colspan="2"]"#)?,
            image_selector: Self::compile_selector("img")?,
            row_selector: Self::compile_selector("tr")?,
            cell_selector: Self::compile_selector("td")?,
            image_host: config.image_host.clone(),
            attribute_label: config.attribute_label.to_lowercase(),
            strict_image_pattern: Self::compile_pattern(&strict_pattern)?,
            scaled_suffix_pattern: Self::compile_pattern(r"/revision/latest/.*")?,
        })
    }

    fn compile_selector(selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| ParsingError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    fn compile_pattern(pattern: &str) -> ParsingResult<Regex> {
        Regex::new(pattern).map_err(|e| ParsingError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    /// Extract the record for `expected_name` from a wiki page.
    ///
    /// The returned record carries the matched heading text as its name;
    /// callers key it by the expected name.
    pub fn extract(&self, html: &str, expected_name: &str) -> ParsingResult<NpcRecord> {
        let document = Html::parse_document(html);

        let (infobox, heading) = self
            .find_infobox(&document, expected_name)
            .ok_or_else(|| ParsingError::infobox_not_found(expected_name))?;

        let image_url = self.extract_image_url(infobox);
        let sex = self.extract_attribute(infobox);

        debug!(
            "Extracted infobox '{}' (image: {}, sex: {:?})",
            heading,
            image_url.is_some(),
            sex
        );

        let mut record = NpcRecord::new(heading);
        record.image_url = image_url;
        record.sex = sex;
        Ok(record)
    }

    /// First table holding a two-column heading whose text equals the name
    fn find_infobox<'a>(
        &self,
        document: &'a Html,
        expected_name: &str,
    ) -> Option<(ElementRef<'a>, String)> {
        document.select(&self.table_selector).find_map(|table| {
            table
                .select(&self.heading_selector)
                .map(element_text)
                .find(|text| text == expected_name)
                .map(|text| (table, text))
        })
    }

    fn extract_image_url(&self, infobox: ElementRef<'_>) -> Option<String> {
        infobox
            .select(&self.image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| self.canonicalize_image_url(src))
    }

    fn extract_attribute(&self, infobox: ElementRef<'_>) -> Option<String> {
        infobox
            .select(&self.row_selector)
            .find_map(|row| {
                let mut cells = row.select(&self.cell_selector);
                let label = cells.next()?;
                let value = cells.next()?;
                (element_text(label).to_lowercase() == self.attribute_label)
                    .then(|| element_text(value))
            })
            .filter(|value| !value.is_empty())
    }

    /// Point a wiki image URL at the unscaled latest revision.
    ///
    /// Thumbnails embed the requested dimensions after `/revision/latest/`.
    /// The strict `.jpg` shape is tried first; any other URL on the image
    /// host falls back to dropping everything after `/revision/latest/`.
    /// The two paths can disagree on malformed input and are kept distinct.
    pub fn canonicalize_image_url(&self, url: &str) -> String {
        if !url.contains(&self.image_host) {
            return url.to_string();
        }

        if let Some(asset) = self
            .strict_image_pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
        {
            return format!("{}/revision/latest", asset.as_str());
        }

        self.scaled_suffix_pattern
            .replace_all(url, "/revision/latest")
            .into_owned()
    }
}

/// Element text with each text node trimmed and concatenated
fn element_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}
