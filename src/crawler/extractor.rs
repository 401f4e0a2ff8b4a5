//! Product extraction from listing pages
//!
//! This module turns an HTML listing page into:
//! - A lazy sequence of product records (name, price, image URL)
//! - The "next page" link, if the site paginates
//! - Every followable link on the page
//!
//! All site-specific knowledge lives in [`ExtractionRules`]; this module only
//! applies the compiled selectors.

use crate::config::ExtractionRules;
use crate::ScrapeError;
use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// One extracted product, in CSV column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    /// Product name, never empty
    pub name: String,

    /// Price text as displayed; `None` is written as an empty field
    pub price: Option<String>,

    /// Absolute image URL
    pub image_url: Option<String>,

    /// Listing page the product was found on
    pub page_url: String,
}

/// A product entry that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("product #{position} on {page_url} has no {field}")]
    MissingField {
        field: &'static str,
        position: usize,
        page_url: String,
    },
}

/// Extraction rules with every selector compiled once per run
#[derive(Debug, Clone)]
pub struct CompiledRules {
    product: Selector,
    name: Selector,
    price: Selector,
    image: Selector,
    image_attribute: String,
    next_page: Option<Selector>,
    link: Selector,
}

impl CompiledRules {
    /// Compiles the rule set
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledRules)` - Every selector parsed
    /// * `Err(ScrapeError::Selector)` - The first selector that failed
    pub fn compile(rules: &ExtractionRules) -> Result<Self, ScrapeError> {
        Ok(Self {
            product: compile_selector(&rules.product)?,
            name: compile_selector(&rules.name)?,
            price: compile_selector(&rules.price)?,
            image: compile_selector(&rules.image)?,
            image_attribute: rules.image_attribute.clone(),
            next_page: rules
                .next_page
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            link: compile_selector("a[href]")?,
        })
    }
}

fn compile_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// A parsed listing page
pub struct ListingPage {
    document: Html,
    url: Url,
}

impl ListingPage {
    /// Parses HTML fetched from `url`
    ///
    /// # Example
    ///
    /// ```
    /// use shop_scraper::config::ExtractionRules;
    /// use shop_scraper::crawler::{CompiledRules, ListingPage};
    /// use url::Url;
    ///
    /// let html = r#"<ul><li class="product">
    ///     <h2 class="woocommerce-loop-product__title">Bulbasaur</h2>
    ///     <span class="price">£63.00</span>
    /// </li></ul>"#;
    /// let rules = CompiledRules::compile(&ExtractionRules::default()).unwrap();
    /// let page = ListingPage::parse(html, Url::parse("https://scrapeme.live/shop/").unwrap());
    ///
    /// let product = page.products(&rules).next().unwrap().unwrap();
    /// assert_eq!(product.name, "Bulbasaur");
    /// assert_eq!(product.price.as_deref(), Some("£63.00"));
    /// ```
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the product entries of this page, in document order
    ///
    /// The iterator is lazy and single-pass; each call starts a new pass.
    pub fn products<'a>(&'a self, rules: &'a CompiledRules) -> Products<'a> {
        Products {
            entries: self.document.select(&rules.product),
            rules,
            page_url: &self.url,
            position: 0,
        }
    }

    /// Returns the absolute URL of the "next page" link, if any
    pub fn next_page(&self, rules: &CompiledRules) -> Option<Url> {
        let selector = rules.next_page.as_ref()?;

        self.document
            .select(selector)
            .filter_map(|element| element.value().attr("href"))
            .find_map(|href| resolve_link(href, &self.url))
    }

    /// Returns every followable link on the page, in document order
    ///
    /// # Link Extraction Rules
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - `javascript:`, `mailto:`, `tel:` links
    /// - Data URIs
    /// - Fragment-only links
    pub fn links(&self, rules: &CompiledRules) -> Vec<Url> {
        self.document
            .select(&rules.link)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, &self.url))
            .collect()
    }
}

/// Lazy iterator over the product entries of one page
pub struct Products<'a> {
    entries: Select<'a, 'a>,
    rules: &'a CompiledRules,
    page_url: &'a Url,
    position: usize,
}

impl<'a> Iterator for Products<'a> {
    type Item = Result<ProductRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        self.position += 1;
        Some(self.extract(entry))
    }
}

impl<'a> Products<'a> {
    fn extract(&self, entry: ElementRef<'a>) -> Result<ProductRecord, ParseError> {
        let name = first_text(entry, &self.rules.name).ok_or_else(|| ParseError::MissingField {
            field: "name",
            position: self.position,
            page_url: self.page_url.to_string(),
        })?;

        let price = first_text(entry, &self.rules.price);

        let image_url = entry
            .select(&self.rules.image)
            .next()
            .and_then(|image| image.value().attr(&self.rules.image_attribute))
            .and_then(|src| resolve_link(src, self.page_url))
            .map(|url| url.to_string());

        Ok(ProductRecord {
            name,
            price,
            image_url,
            page_url: self.page_url.to_string(),
        })
    }
}

/// Text of the first match with whitespace collapsed; `None` if absent or blank
fn first_text(entry: ElementRef<'_>, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
