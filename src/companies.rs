//! Companies accessible to the authenticated user

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BpnrError, Result};
use crate::http::{read_str, ApiClient};
use crate::urls::trim_trailing_slash;

const ID_KEYS: [&str; 3] = ["id", "companyId", "uuid"];
const NAME_KEYS: [&str; 3] = ["name", "displayName", "legalName"];

/// A company the user can work in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Stable company identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// Lists the companies available to the bearer of `access_token`.
///
/// Issues `GET <api_base_url>/api/companies`.
///
/// # Errors
///
/// Returns [`BpnrError::Http`] or [`BpnrError::Transport`] from the client
/// layer, or [`BpnrError::Companies`] when the body is unusable (see
/// [`parse_companies`]).
pub async fn fetch_companies(
    api: &ApiClient,
    api_base_url: &str,
    access_token: &str,
) -> Result<Vec<Company>> {
    let url = format!("{}/api/companies", trim_trailing_slash(api_base_url));
    let raw = api.get_json(&url, Some(access_token)).await?;
    let companies = parse_companies(&raw)?;
    tracing::debug!(count = companies.len(), "companies loaded");
    Ok(companies)
}

/// Parses a companies response.
///
/// Accepts a bare array or `{"companies": [...]}`.  Entries that are not
/// objects, or that lack a non-empty id or name, are skipped.  Order is
/// preserved.
///
/// # Errors
///
/// - `Companies("invalid companies response")` for any other shape.
/// - `Companies("no companies available")` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use bpnr::companies::parse_companies;
///
/// let raw = serde_json::json!([
///     { "companyId": "c1", "legalName": "First Ltd" },
///     { "id": "c2" },
/// ]);
/// let companies = parse_companies(&raw).unwrap();
/// assert_eq!(companies.len(), 1);
/// assert_eq!(companies[0].name, "First Ltd");
/// ```
pub fn parse_companies(raw: &Value) -> Result<Vec<Company>> {
    let entries = match raw {
        Value::Array(items) => items,
        Value::Object(body) => body
            .get("companies")
            .and_then(Value::as_array)
            .ok_or_else(invalid_response)?,
        _ => return Err(invalid_response().into()),
    };

    let companies: Vec<Company> = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let id = first_non_empty(entry, &ID_KEYS)?;
            let name = first_non_empty(entry, &NAME_KEYS)?;
            Some(Company {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect();

    if companies.is_empty() {
        return Err(BpnrError::Companies("no companies available".to_string()).into());
    }
    Ok(companies)
}

fn first_non_empty<'a>(entry: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| read_str(entry, key))
        .filter(|value| !value.is_empty())
}

fn invalid_response() -> BpnrError {
    BpnrError::Companies("invalid companies response".to_string())
}
