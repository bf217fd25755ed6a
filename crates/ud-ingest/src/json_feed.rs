//! JSON feeds.
//!
//! A feed is either `{"result": [{..}, ..]}` or a bare array of objects.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{IngestError, Result};

/// One flat feed object.
pub type FeedObject = Map<String, Value>;

/// Read and parse a JSON feed file.
pub fn read_json_feed(path: &Path) -> Result<Vec<FeedObject>> {
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::read(path, e))?;
    parse_json_feed(&content).map_err(|failure| match failure {
        FeedFailure::Json(source) => IngestError::JsonParse {
            path: path.to_path_buf(),
            source,
        },
        FeedFailure::Shape(reason) => IngestError::FeedShape {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        },
    })
}

#[derive(Debug)]
pub enum FeedFailure {
    Json(serde_json::Error),
    Shape(&'static str),
}

pub fn parse_json_feed(content: &str) -> std::result::Result<Vec<FeedObject>, FeedFailure> {
    let root: Value = serde_json::from_str(content).map_err(FeedFailure::Json)?;
    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("result") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FeedFailure::Shape("`result` is not an array")),
            None => return Err(FeedFailure::Shape("missing `result` array")),
        },
        _ => return Err(FeedFailure::Shape("root is neither an object nor an array")),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(object) => Ok(object),
            _ => Err(FeedFailure::Shape("feed entry is not an object")),
        })
        .collect()
}
