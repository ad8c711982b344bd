//! Role-based link extraction
//!
//! Catalog pages come in three roles. Index pages are scanned with an ordered
//! list of selector strategies because navigation markup varies between site
//! revisions; list pages are scanned with a single content selector; detail
//! pages are never parsed.
//!
//! # Classification policy
//!
//! Inside a list page an href is classified purely by its shape:
//!
//! | Shape | Meaning |
//! |-------|---------|
//! | `/path` | detail page, absolutized with the host prefix |
//! | `http(s)://…`, `//…` | ignored (off-host or already absolute) |
//! | anything else | pagination, resolved against the list page directory |
//!
//! This is a heuristic that fits catalog sites where items are linked
//! host-relative and pages are linked by bare file name. It is not a general
//! classifier.

use crate::crawler::PageRole;
use crate::url::{is_absolute, is_host_relative};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// An anchor found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Raw `href` attribute value, trimmed
    pub href: String,

    /// Trimmed anchor text, `None` when the anchor has no text
    pub text: Option<String>,
}

/// How a list-page href should be followed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLinkKind {
    Detail,
    Pagination,
    Ignored,
}

/// Classifies an href found on a list page, see the module docs
pub fn classify_list_href(href: &str) -> ListLinkKind {
    if is_host_relative(href) {
        ListLinkKind::Detail
    } else if href.is_empty() || href.starts_with('#') || is_absolute(href) || has_scheme(href) {
        ListLinkKind::Ignored
    } else {
        ListLinkKind::Pagination
    }
}

/// `javascript:`, `mailto:` and friends
fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Extracts the links relevant to a page of the given role
///
/// # Arguments
///
/// * `html` - The decoded page
/// * `role` - Which kind of page this is
/// * `index_selectors` - Strategies for index pages, evaluated in order
/// * `list_selector` - Selector for list page anchors
///
/// # Returns
///
/// Index pages: the union of all strategy matches, deduplicated by href in
/// first-seen order. List pages: every match, duplicates included. Detail
/// pages: nothing.
///
/// Anchors without an `href` are skipped. Malformed markup never fails; it
/// just yields whatever the parser recovers.
pub fn extract_links(
    html: &str,
    role: PageRole,
    index_selectors: &[String],
    list_selector: &str,
) -> Vec<Link> {
    match role {
        PageRole::Index => extract_index_links(html, index_selectors),
        PageRole::List => extract_list_links(html, list_selector),
        PageRole::Detail => Vec::new(),
    }
}

fn extract_index_links(html: &str, strategies: &[String]) -> Vec<Link> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for strategy in strategies {
        let matches = select_links(&document, strategy);
        if matches.is_empty() {
            continue;
        }

        tracing::debug!("Selector '{}' matched {} link(s)", strategy, matches.len());
        for link in matches {
            if seen.insert(link.href.clone()) {
                links.push(link);
            }
        }
    }

    tracing::info!("Found {} unique index link(s)", links.len());
    links
}

fn extract_list_links(html: &str, selector: &str) -> Vec<Link> {
    let document = Html::parse_document(html);
    select_links(&document, selector)
}

fn select_links(document: &Html, selector: &str) -> Vec<Link> {
    let parsed = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Skipping invalid selector '{}': {:?}", selector, e);
            return Vec::new();
        }
    };

    document
        .select(&parsed)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }

            let text = element.text().collect::<String>();
            let text = text.trim();

            Some(Link {
                href: href.to_string(),
                text: (!text.is_empty()).then(|| text.to_string()),
            })
        })
        .collect()
}
