//! Confluence REST client: find, create, update, and label pages.
//!
//! A thin async wrapper over the Confluence content API, carrying exactly
//! the operations the publishing flow needs. Requests use basic auth (an
//! API token works as the password) and JSON bodies; non-success statuses
//! surface as [`MarkonError::Api`] with the response body attached, since
//! Confluence error payloads usually explain what was wrong.
//!
//! Deliberately no retry or backoff machinery and no API-version
//! negotiation — a failed call fails the page and the caller moves on.
//!
//! ## Page identity
//!
//! Pages are looked up by *label*, not title: every page markon creates is
//! labelled with the document slug, so renaming a page's title in front
//! matter updates the same page instead of creating a sibling.

use crate::error::MarkonError;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

/// Everything needed to create or update one page.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec<'a> {
    /// Page title, from front matter.
    pub title: &'a str,
    /// Document slug, applied as a page label.
    pub slug: &'a str,
    /// Destination space key.
    pub space: &'a str,
    /// Parent page id, when the page should live under an ancestor.
    pub ancestor_id: Option<&'a str>,
    /// Storage-format markup.
    pub content: &'a str,
}

impl PageSpec<'_> {
    /// Reject empty required fields before issuing any request.
    fn require(&self) -> Result<(), MarkonError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("title", self.title),
            ("slug", self.slug),
            ("space", self.space),
            ("content", self.content),
        ] {
            if value.is_empty() {
                missing.push(name);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MarkonError::MissingArgument {
                fields: missing.join(", "),
            })
        }
    }
}

/// A page as returned by the content API; only the fields the update flow
/// needs are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePage {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<PageVersion>,
    #[serde(default, rename = "_links")]
    pub links: Option<PageLinks>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageVersion {
    pub number: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub webui: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// A page label.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    results: Vec<RemotePage>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelResults {
    #[serde(default)]
    results: Vec<Label>,
}

/// Async client for the Confluence content REST API.
pub struct ConfluenceApi {
    api_url: Url,
    username: String,
    password: String,
    client: Client,
}

// Manual impl: the password is a credential and must not land in logs or
// panic messages.
impl std::fmt::Debug for ConfluenceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceApi")
            .field("api_url", &self.api_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ConfluenceApi {
    /// Build a client for the given API base URL and credentials.
    ///
    /// The base URL is normalized to a trailing slash so relative paths
    /// join underneath it rather than replacing the last segment.
    pub fn new(
        api_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, MarkonError> {
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        let api_url = Url::parse(&normalized).map_err(|e| MarkonError::InvalidApiUrl {
            url: normalized,
            detail: e.to_string(),
        })?;

        Ok(Self {
            api_url,
            username: username.into(),
            password: password.into(),
            client: Client::new(),
        })
    }

    /// Look up an existing page by slug label, optionally narrowed by
    /// ancestor and space. `None` means no page matched.
    pub async fn exists(
        &self,
        slug: &str,
        space: Option<&str>,
        ancestor_id: Option<&str>,
    ) -> Result<Option<RemotePage>, MarkonError> {
        if slug.is_empty() {
            return Err(MarkonError::MissingArgument {
                fields: "slug".into(),
            });
        }

        let cql = build_cql(slug, space, ancestor_id);
        debug!(%cql, "Searching for existing page");

        let response = self
            .request(
                Method::GET,
                "content/search",
                &[("expand", "version"), ("cql", &cql)],
                None,
            )
            .await?;
        let found: SearchResults = serde_json::from_value(response)
            .map_err(|e| MarkonError::Internal(format!("Unexpected search response: {e}")))?;

        if found.size == 0 {
            return Ok(None);
        }
        Ok(found.results.into_iter().next())
    }

    /// Create a page, then immediately update it with the real content.
    ///
    /// The two-step dance exists because the create endpoint does not
    /// report version conflicts usefully; creating a placeholder and
    /// updating it reuses the well-trodden update path for the real markup.
    pub async fn create(&self, spec: &PageSpec<'_>) -> Result<RemotePage, MarkonError> {
        spec.require()?;

        let placeholder = PageSpec {
            content: "Creating/updating page in progress...",
            ..*spec
        };
        let response = self
            .request(
                Method::POST,
                "content/",
                &[],
                Some(&page_payload(&placeholder, None)),
            )
            .await?;
        let page: RemotePage = serde_json::from_value(response)
            .map_err(|e| MarkonError::Internal(format!("Unexpected create response: {e}")))?;

        info!(
            title = spec.title,
            id = %page.id,
            url = %self.webui_url(&page).unwrap_or_default(),
            "Page created"
        );

        self.update(&page, spec).await
    }

    /// Update an existing page in place, bumping its version and applying
    /// the slug label.
    pub async fn update(
        &self,
        page: &RemotePage,
        spec: &PageSpec<'_>,
    ) -> Result<RemotePage, MarkonError> {
        spec.require()?;

        let next_version = page.version.map(|v| v.number).unwrap_or(1) + 1;
        let payload = page_payload(spec, Some(next_version));

        let path = format!("content/{}", page.id);
        let response = self
            .request(Method::PUT, &path, &[], Some(&payload))
            .await?;
        let updated: RemotePage = serde_json::from_value(response)
            .map_err(|e| MarkonError::Internal(format!("Unexpected update response: {e}")))?;

        self.create_labels(&updated.id, spec.slug).await?;

        info!(
            title = spec.title,
            id = %updated.id,
            version = next_version,
            url = %self.webui_url(&updated).unwrap_or_default(),
            "Page updated"
        );

        Ok(updated)
    }

    /// Apply the slug label to a page.
    pub async fn create_labels(
        &self,
        page_id: &str,
        slug: &str,
    ) -> Result<Vec<Label>, MarkonError> {
        let path = format!("content/{page_id}/label");
        let body = json!([{ "name": slug }]);

        let response = self.request(Method::POST, &path, &[], Some(&body)).await?;
        let labels: LabelResults = serde_json::from_value(response).unwrap_or_default();

        if !labels.results.iter().any(|l| l.name == slug) {
            warn!(page_id, slug, "Label is missing expected slug after update");
        }

        Ok(labels.results)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, MarkonError> {
        let url = self
            .api_url
            .join(path)
            .map_err(|e| MarkonError::InvalidApiUrl {
                url: format!("{}{path}", self.api_url),
                detail: e.to_string(),
            })?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .basic_auth(&self.username, Some(&self.password));
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| MarkonError::Http { source })?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarkonError::Api {
                status: status.as_u16(),
                method: method.to_string(),
                path: path.to_string(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|source| MarkonError::Http { source })
    }

    /// Best-effort browser URL for log lines.
    fn webui_url(&self, page: &RemotePage) -> Option<String> {
        let links = page.links.as_ref()?;
        let relative = format!(
            "{}{}",
            links.context.as_deref().unwrap_or(""),
            links.webui.as_deref()?
        );
        self.api_url.join(&relative).ok().map(String::from)
    }
}

/// Assemble the CQL query used to find an existing page by label.
fn build_cql(slug: &str, space: Option<&str>, ancestor_id: Option<&str>) -> String {
    let mut clauses = vec![format!("label={slug}")];
    if let Some(ancestor) = ancestor_id {
        clauses.push(format!("ancestor={ancestor}"));
    }
    if let Some(space) = space {
        clauses.push(format!("space='{space}'"));
    }
    clauses.join(" and ")
}

/// The JSON payload for page create/update calls.
fn page_payload(spec: &PageSpec<'_>, version: Option<u64>) -> Value {
    let mut payload = json!({
        "type": "page",
        "title": spec.title,
        "space": { "key": spec.space },
        "body": {
            "storage": {
                "representation": "storage",
                "value": spec.content,
            }
        },
    });
    if let Some(ancestor) = spec.ancestor_id {
        payload["ancestors"] = json!([{ "id": ancestor }]);
    }
    if let Some(number) = version {
        payload["version"] = json!({ "number": number });
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>() -> PageSpec<'a> {
        PageSpec {
            title: "Runbook",
            slug: "runbook",
            space: "OPS",
            ancestor_id: Some("42"),
            content: "<p>hi</p>",
        }
    }

    #[test]
    fn cql_with_all_parts() {
        assert_eq!(
            build_cql("runbook", Some("OPS"), Some("42")),
            "label=runbook and ancestor=42 and space='OPS'"
        );
    }

    #[test]
    fn cql_label_only() {
        assert_eq!(build_cql("runbook", None, None), "label=runbook");
    }

    #[test]
    fn payload_shape() {
        let payload = page_payload(&spec(), Some(7));
        assert_eq!(payload["type"], "page");
        assert_eq!(payload["title"], "Runbook");
        assert_eq!(payload["space"]["key"], "OPS");
        assert_eq!(payload["body"]["storage"]["representation"], "storage");
        assert_eq!(payload["body"]["storage"]["value"], "<p>hi</p>");
        assert_eq!(payload["ancestors"][0]["id"], "42");
        assert_eq!(payload["version"]["number"], 7);
    }

    #[test]
    fn payload_omits_absent_parts() {
        let payload = page_payload(
            &PageSpec {
                ancestor_id: None,
                ..spec()
            },
            None,
        );
        assert!(payload.get("ancestors").is_none());
        assert!(payload.get("version").is_none());
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let api = ConfluenceApi::new("https://wiki.example.com/rest/api", "u", "p").unwrap();
        assert_eq!(api.api_url.as_str(), "https://wiki.example.com/rest/api/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ConfluenceApi::new("not a url", "u", "p").unwrap_err();
        assert!(matches!(err, MarkonError::InvalidApiUrl { .. }));
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let api =
            ConfluenceApi::new("https://wiki.example.com/rest/api", "u", "hunter2").unwrap();
        let rendered = format!("{api:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn require_reports_every_empty_field() {
        let err = PageSpec {
            title: "",
            slug: "",
            space: "OPS",
            ancestor_id: None,
            content: "x",
        }
        .require()
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("title"));
        assert!(msg.contains("slug"));
        assert!(!msg.contains("space"));
    }
}
