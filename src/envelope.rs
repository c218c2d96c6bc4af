//! Uniform JSON wrapper returned by every endpoint.
//!
//! `success == true` always comes with `data` and never with `error`;
//! `success == false` always comes with `error` and never with `data`.
//! Handlers only build envelopes through `ok` and `failure`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            page: None,
            query: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            page: None,
            query: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_carries_data_and_no_error() {
        let env = Envelope::ok(vec![1, 2]).with_page(3).with_query("matrix");
        let out = serde_json::to_value(&env).expect("serialize");
        assert_eq!(
            out,
            json!({ "success": true, "data": [1, 2], "page": 3, "query": "matrix" })
        );
    }

    #[test]
    fn empty_data_is_still_present() {
        let out = serde_json::to_value(Envelope::ok(Vec::<i32>::new())).expect("serialize");
        assert_eq!(out, json!({ "success": true, "data": [] }));
    }

    #[test]
    fn failure_omits_data() {
        let out = serde_json::to_value(Envelope::<()>::failure("Movie not found")).expect("serialize");
        assert_eq!(out, json!({ "success": false, "error": "Movie not found" }));
    }
}
