use crate::error::AdvisorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Http(String),
    File(PathBuf),
}

impl CatalogSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Http(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Fetches the product list. Every call goes back to the source.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    source: CatalogSource,
    client: reqwest::Client,
}

impl CatalogLoader {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
        }
    }

    pub async fn load(&self) -> Result<Vec<Product>, AdvisorError> {
        let bytes = match &self.source {
            CatalogSource::Http(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| AdvisorError::Fetch(format!("GET {url} failed: {err}")))?;
                if !response.status().is_success() {
                    return Err(AdvisorError::Fetch(format!(
                        "GET {url} returned {}",
                        response.status()
                    )));
                }
                response
                    .bytes()
                    .await
                    .map_err(|err| AdvisorError::Fetch(format!("failed to read {url}: {err}")))?
                    .to_vec()
            }
            CatalogSource::File(path) => tokio::fs::read(path).await.map_err(|err| {
                AdvisorError::Fetch(format!("failed to read {}: {err}", path.display()))
            })?,
        };

        let document: CatalogDocument = serde_json::from_slice(&bytes).map_err(|err| {
            AdvisorError::Fetch(format!(
                "failed to parse catalog {}: {err}",
                self.source.describe()
            ))
        })?;

        tracing::debug!(
            source = %self.source.describe(),
            products = document.products.len(),
            "catalog loaded"
        );
        Ok(document.products)
    }
}

pub fn filter_by_category(products: &[Product], category: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|product| product.category == category)
        .cloned()
        .collect()
}

/// Distinct categories in the order they first appear in the feed.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    products
        .iter()
        .filter(|product| !product.category.is_empty())
        .filter(|product| seen.insert(product.category.as_str()))
        .map(|product| product.category.clone())
        .collect()
}

#[cfg(test)]
pub(crate) fn sample_product(name: &str, category: &str) -> Product {
    Product {
        name: name.to_string(),
        brand: "CeraVe".to_string(),
        category: category.to_string(),
        image: format!("https://img.example.com/{}.jpg", name.replace(' ', "_")),
        description: format!("{name} description"),
    }
}
