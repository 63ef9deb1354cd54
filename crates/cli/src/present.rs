//! Output layouts for merged records.

use cinemerge_merge::{FieldValue, MergedRecord};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Layout {
    /// Nested movie view: ratings and financials grouped under sub-objects
    #[default]
    Movies,
    /// Merged records exactly as the engine produced them
    Flat,
}

pub fn shape(record: &MergedRecord, layout: Layout) -> Value {
    match layout {
        Layout::Movies => movie_view(record),
        Layout::Flat => json!(record),
    }
}

/// Regroup a flat merged movie. Only reshapes; absent fields become null.
pub fn movie_view(record: &MergedRecord) -> Value {
    let get = |name: &str| record.get(name).map(to_json).unwrap_or(Value::Null);

    json!({
        "movie_id": record.entity_id,
        "movie_title": get("movie_title"),
        "release_year": get("release_year"),
        "ratings": {
            "critic": {
                "score": get("critic_score"),
                "top_score": get("top_critic_score"),
                "total_ratings": get("total_critic_ratings"),
            },
            "audience": {
                "score": get("audience_avg_score"),
                "total_ratings": get("total_audience_ratings"),
            },
        },
        "financials": {
            "domestic_box_office_usd": get("domestic_box_office_gross"),
            "worldwide_box_office_usd": get("box_office_gross_usd"),
            "production_budget_usd": get("production_budget_usd"),
            "marketing_spend_usd": get("marketing_spend_usd"),
        },
        "providers": record.providers,
    })
}

fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => json!(i),
        FieldValue::Float(f) => json!(f),
        FieldValue::Text(s) => json!(s),
    }
}
