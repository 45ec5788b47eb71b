use serde::{Deserialize, Serialize};

/// Short-horizon return prediction for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub ticker: String,
    pub target_days: u32,

    /// Expected return over `target_days`, as a fraction (0.05 = +5%)
    pub predicted_return: f64,

    #[serde(default)]
    pub confidence: Option<f64>,
}

impl PredictionResult {
    pub fn predicted_return_percent(&self) -> f64 {
        self.predicted_return * 100.0
    }
}

/// Body of `POST /analysis/sentiment`
#[derive(Debug, Clone, Serialize)]
pub struct SentimentRequest {
    pub text: String,
}

/// Sentiment classification of a piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub text: String,
    pub label: String,
    pub score: f64,
}
