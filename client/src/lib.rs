//! Client for the Manticore Search JSON API.
//!
//! ```no_run
//! # async fn run() -> Result<(), manticore_client::ClientError> {
//! use manticore_client::{ApiClient, ClientConfig, FulltextFilter, SearchApi, SearchRequest};
//!
//! let api = SearchApi::new(ApiClient::new(&ClientConfig::from_env()?)?);
//! let request = SearchRequest::new("movies")
//!     .fulltext(FulltextFilter::matching("title", "star wars"))
//!     .sort_by("year", "desc")
//!     .limit(10);
//! let response = api.search(&request).await?;
//! println!("{} hits", response.hits.hits.len());
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod config;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod search_api;

pub use api_client::{ApiClient, ApiResponse};
pub use config::ClientConfig;
pub use errors::ClientError;
pub use models::{
    Aggregation, ErrorResponse, FulltextFilter, Highlight, HighlightField, Hit, PercolateRequest,
    SearchHits, SearchRequest, SearchResponse,
};
pub use normalize::{normalize, normalized};
pub use search_api::{prepare_search_body, SearchApi};
