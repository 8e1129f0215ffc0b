pub mod compile;

pub use compile::{compile, CompileError};

use futures::future::join_all;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::github::{GithubError, HostingApi};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to fetch include '{path}': {source}")]
    IncludeFetch {
        path: String,
        #[source]
        source: GithubError,
    },
}

/// A changed file's text after marker removal and include substitution,
/// paired with the template it targets.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template_id: String,
    pub markup: String,
}

/// The `[id]...[/id]` marker as found in the source text. The raw match is
/// kept so exactly that substring (plus its wrapper) can be removed.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMarker {
    pub raw: String,
    pub id: String,
}

/// One `<mj-include absolute-path="..."/>` occurrence: the path to fetch and
/// the literal tag text to substitute away.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    pub path: String,
    pub tag: String,
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[id\](.*?)\[/id\]").expect("marker pattern is valid"))
}

fn include_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<mj-include\s[^>]*?absolute-path="([^"]*)"[^>]*?/>"#)
            .expect("include pattern is valid")
    })
}

/// First `[id]...[/id]` marker in the text, if any. A file without a marker
/// is not a synchronized template.
pub fn extract_template_id(text: &str) -> Option<TemplateMarker> {
    marker_pattern().captures(text).map(|caps| TemplateMarker {
        raw: caps[0].to_string(),
        id: caps[1].to_string(),
    })
}

/// All include directives in document order, duplicates included.
pub fn extract_includes(text: &str) -> Vec<IncludeDirective> {
    include_pattern()
        .captures_iter(text)
        .map(|caps| IncludeDirective {
            path: caps[1].to_string(),
            tag: caps[0].to_string(),
        })
        .collect()
}

/// Remove the first occurrence of the marker and its `<mj-raw>` wrapper.
/// The marker is metadata, not renderable content. A marker outside a
/// wrapper is left in place, matching the established convention.
pub fn strip_marker(text: &str, marker: &TemplateMarker) -> String {
    text.replacen(&format!("<mj-raw>{}</mj-raw>", marker.raw), "", 1)
}

/// Resolve one changed file's raw text into composed markup, or `None` when
/// the file carries no template marker.
///
/// Each unique include path is fetched at most once (the memo map lives only
/// for this call), concurrently, with a join barrier before substitution.
pub async fn resolve(
    api: &dyn HostingApi,
    text: &str,
    head_ref: &str,
) -> Result<Option<ResolvedTemplate>, ResolveError> {
    let Some(marker) = extract_template_id(text) else {
        debug!("no template marker found, not a synchronized template");
        return Ok(None);
    };

    let mut unique: Vec<IncludeDirective> = Vec::new();
    for include in extract_includes(text) {
        if !unique.iter().any(|seen| seen.path == include.path) {
            unique.push(include);
        }
    }
    debug!(includes = unique.len(), template_id = %marker.id, "resolving template");

    let fetched = join_all(unique.iter().map(|include| async move {
        api.file_at_ref(&include.path, head_ref)
            .await
            .map(|content| (include, content))
            .map_err(|source| ResolveError::IncludeFetch {
                path: include.path.clone(),
                source,
            })
    }))
    .await;

    let mut markup = strip_marker(text, &marker);
    for result in fetched {
        let (include, content) = result?;
        markup = markup.replace(&include.tag, &content);
    }

    Ok(Some(ResolvedTemplate {
        template_id: marker.id,
        markup,
    }))
}
