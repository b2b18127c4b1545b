use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opportunity_scout::sources::normalize_records;
use opportunity_scout::ContentItem;
use serde::Deserialize;
use thiserror::Error;

pub const MAX_CLUSTERS: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct ApiDiscoveryRequest {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    pub clusters: Option<usize>,
    pub seed: Option<u64>,
}

impl ApiDiscoveryRequest {
    pub fn into_items(self) -> Result<Vec<ContentItem>, ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::BadRequest("items are required".to_string()));
        }
        match self.clusters {
            Some(0) => {
                return Err(ApiError::BadRequest("clusters must be at least 1".to_string()));
            }
            Some(clusters) if clusters > MAX_CLUSTERS => {
                return Err(ApiError::BadRequest(format!(
                    "clusters must be at most {}",
                    MAX_CLUSTERS
                )));
            }
            _ => {}
        }
        Ok(normalize_records(self.items))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(clusters: Option<usize>) -> ApiDiscoveryRequest {
        ApiDiscoveryRequest {
            items: vec![json!({"platform": "instagram", "caption": "목이 아파요"})],
            clusters,
            seed: None,
        }
    }

    #[test]
    fn rejects_out_of_range_cluster_counts() {
        assert!(matches!(request(Some(0)).into_items(), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            request(Some(usize::MAX / 64)).into_items(),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(request(Some(MAX_CLUSTERS)).into_items().unwrap().len(), 1);
        assert_eq!(request(None).into_items().unwrap().len(), 1);
    }

    #[test]
    fn malformed_items_are_skipped() {
        let request = ApiDiscoveryRequest {
            items: vec![
                json!({"platform": "instagram", "caption": "ok"}),
                json!({"platform": "myspace", "text": "unknown"}),
            ],
            clusters: Some(2),
            seed: None,
        };
        assert_eq!(request.into_items().unwrap().len(), 1);
    }
}
