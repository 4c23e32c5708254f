//! Request signing traits for authenticated API calls.
//!
//! Each venue implements its own signing algorithm; the HTTP client only
//! knows that signing appends a timestamp and a signature to the query.

/// Name of the timestamp query parameter.
pub const TIMESTAMP_PARAM: &str = "timestamp";

/// Name of the signature query parameter.
pub const SIGNATURE_PARAM: &str = "signature";

/// Trait for signing HTTP requests.
///
/// Implementations must be safe to call repeatedly on the same parameter
/// list: a previous `timestamp`/`signature` pair is replaced, never signed
/// over.
pub trait RequestSigner: Send + Sync {
    /// Sign the request parameters.
    ///
    /// Removes any existing timestamp and signature, appends `timestamp`,
    /// computes the signature over the resulting query string and appends it.
    ///
    /// # Arguments
    ///
    /// * `params` - Mutable reference to the request parameters
    /// * `timestamp` - Server-adjusted timestamp in milliseconds
    fn sign(&self, params: &mut Vec<(String, String)>, timestamp: u64);

    /// Returns the header name for the API key.
    fn api_key_header(&self) -> &str;

    /// Returns the API key value.
    fn api_key(&self) -> &str;
}

/// Build a query string from parameters, preserving their order.
pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Drop previously added authentication parameters.
pub fn strip_auth_params(params: &mut Vec<(String, String)>) {
    params.retain(|(k, _)| k != TIMESTAMP_PARAM && k != SIGNATURE_PARAM);
}
