//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock shops and run the fetcher and
//! the full fetch/extract/write cycle end-to-end.

mod fetch_tests;
mod scrape_tests;

use shop_scraper::config::Config;

/// One product entry of a mock listing page
pub struct Product<'a> {
    pub name: Option<&'a str>,
    pub price: Option<&'a str>,
    pub image: Option<&'a str>,
}

impl<'a> Product<'a> {
    pub fn new(name: &'a str, price: &'a str, image: &'a str) -> Self {
        Self {
            name: Some(name),
            price: Some(price),
            image: Some(image),
        }
    }
}

/// Renders a WooCommerce-style listing page
pub fn listing_page(products: &[Product<'_>], next: Option<&str>, extra_links: &[&str]) -> String {
    let mut html = String::from("<html><head><title>Shop</title></head><body><ul class=\"products\">");

    for product in products {
        html.push_str("<li class=\"product\"><a href=\"#\">");
        if let Some(image) = product.image {
            html.push_str(&format!("<img class=\"wp-post-image\" src=\"{}\" />", image));
        }
        if let Some(name) = product.name {
            html.push_str(&format!(
                "<h2 class=\"woocommerce-loop-product__title\">{}</h2>",
                name
            ));
        }
        if let Some(price) = product.price {
            html.push_str(&format!("<span class=\"price\">{}</span>", price));
        }
        html.push_str("</a></li>");
    }

    html.push_str("</ul><nav>");
    for link in extra_links {
        html.push_str(&format!("<a href=\"{}\">link</a>", link));
    }
    if let Some(next) = next {
        html.push_str(&format!("<a class=\"next page-numbers\" href=\"{}\">→</a>", next));
    }
    html.push_str("</nav></body></html>");

    html
}

/// Configuration pointed at a mock server, with pacing turned off
pub fn test_config(base_uri: &str, csv_path: &str) -> Config {
    let mut config = Config::default();
    config.scraper.start_url = format!("{}/shop/", base_uri);
    config.scraper.delay_ms = 0;
    config.scraper.delay_jitter_ms = 0;
    config.scraper.retries = 0;
    config.scraper.retry_backoff_ms = 10;
    config.scraper.request_timeout_secs = 5;
    config.user_agent.agents = vec!["TestBot/1.0".to_string()];
    config.output.csv_path = csv_path.to_string();
    config
}
