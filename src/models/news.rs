use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,

    #[serde(default, alias = "published_at")]
    pub published: Option<String>,

    pub url: String,

    #[serde(default)]
    pub summary: String,
}

/// Response of `GET /news/{query}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsList {
    pub query: String,

    #[serde(alias = "total")]
    pub count: u64,

    pub articles: Vec<NewsArticle>,
}
