//! Paginated list responses.
//!
//! TestRail wraps every list endpoint in the same envelope, naming the item
//! array after the resource (`plans`, `cases`, `tests`, ...).

use serde::{Deserialize, Serialize};

/// Navigation links of a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    /// Relative path of the next page, absent on the last page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    /// Number of items on this page
    #[serde(default)]
    pub size: u32,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
    #[serde(
        alias = "plans",
        alias = "cases",
        alias = "tests",
        alias = "runs",
        alias = "results",
        default = "Vec::new"
    )]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Whether another page should be requested after this one.
    pub fn has_next(&self) -> bool {
        self.links.next.is_some() && self.size > 0
    }
}
