//! CLI binary for markon.
//!
//! A thin shim over the library crate: clap flags (with environment-variable
//! defaults) name the Confluence instance, positional arguments name the
//! markdown pages, and each page is converted and created-or-updated in
//! turn. A page that fails to convert is logged and skipped; the run
//! continues with the remaining pages.

use anyhow::{bail, Context, Result};
use clap::Parser;
use markon::{convert_file, page_slug, ConfluenceApi, ConvertedPage, MarkonError, PageSpec};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Markon — a tool for updating Atlassian Confluence pages from markdown.
#[derive(Parser, Debug)]
#[command(name = "markon", version, about)]
struct Cli {
    /// URL pointing to the Confluence content API
    #[arg(long, env = "CONFLUENCE_API_URL")]
    api_url: Option<String>,

    /// Username for authentication to the Confluence API
    #[arg(long, env = "CONFLUENCE_USERNAME", default_value = "")]
    username: String,

    /// Password for authentication, can also be an API token
    #[arg(long, env = "CONFLUENCE_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Confluence space where the markdown files should reside
    #[arg(long, env = "CONFLUENCE_SPACE")]
    space: Option<String>,

    /// Confluence id of the parent page to put the markdown files under
    #[arg(long, env = "CONFLUENCE_ANCESTOR_ID")]
    ancestor_id: Option<String>,

    /// Markdown pages to sync into Confluence pages
    pages: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let Some(api_url) = cli.api_url.as_deref().filter(|u| !u.is_empty()) else {
        bail!("Please provide a valid API URL (--api-url or CONFLUENCE_API_URL)");
    };
    let api = ConfluenceApi::new(api_url, cli.username.as_str(), cli.password.as_str())
        .context("Failed to build Confluence API client")?;

    let mut pages = Vec::with_capacity(cli.pages.len());
    for page in &cli.pages {
        let absolute = std::fs::canonicalize(page)
            .with_context(|| format!("File {} does not exist", page.display()))?;
        if !absolute.is_file() {
            bail!("File {} is not a regular file", absolute.display());
        }
        pages.push(absolute);
    }

    if pages.is_empty() {
        info!("No page created/modified");
        return Ok(());
    }

    for page in &pages {
        info!("Creating or updating {}", page.display());
        create_or_update_page(page, &cli, &api).await;
    }

    Ok(())
}

/// Convert one file and push it to Confluence. Per-page failures are logged
/// and swallowed so one bad document does not abort the whole run.
async fn create_or_update_page(path: &Path, cli: &Cli, api: &ConfluenceApi) {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| markon::SUPPORTED_EXTENSIONS.contains(&e));
    if !supported {
        info!("Skipping {} since not a supported format", path.display());
        return;
    }

    let converted = match convert_file(path) {
        Ok(converted) => converted,
        Err(e) => {
            error!("Error when processing {}: {e}", path.display());
            return;
        }
    };

    if !converted.page.confluence.share {
        info!("Page {} not set to be uploaded to Confluence", path.display());
        return;
    }

    if let Err(e) = publish(path, &converted, cli, api).await {
        error!("Error when publishing {}: {e:#}", path.display());
    }
}

async fn publish(
    path: &Path,
    converted: &ConvertedPage,
    cli: &Cli,
    api: &ConfluenceApi,
) -> Result<()> {
    let Some(title) = converted.page.title.as_deref() else {
        return Err(MarkonError::MissingMetadata {
            field: "title",
            path: path.to_path_buf(),
        }
        .into());
    };

    // Front matter takes precedence over flags/environment.
    let meta = &converted.page.confluence;
    let Some(space) = meta.space.as_deref().or(cli.space.as_deref()) else {
        bail!("no space given in front matter, --space, or CONFLUENCE_SPACE");
    };
    let ancestor_id = meta
        .ancestor_id
        .as_ref()
        .map(|id| id.to_string())
        .or_else(|| cli.ancestor_id.clone());

    if !converted.attachments.is_empty() {
        // TODO: upload collected attachments alongside the page so local
        // image tags resolve.
        warn!(
            "Page {} references {} local image(s) that will not be uploaded: {}",
            path.display(),
            converted.attachments.len(),
            converted.attachments.join(", ")
        );
    }

    let slug = page_slug(path);
    let spec = PageSpec {
        title,
        slug: &slug,
        space,
        ancestor_id: ancestor_id.as_deref(),
        content: &converted.markup,
    };

    match api.exists(&slug, Some(space), ancestor_id.as_deref()).await? {
        Some(existing) => api.update(&existing, &spec).await?,
        None => api.create(&spec).await?,
    };

    Ok(())
}
