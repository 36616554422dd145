//! Rendering of search results as display text.
//!
//! `format_item` is a pure function from one validated record to one markdown
//! block; `render_search_results` assembles the final tool response (failure
//! and no-result messages, 25-result cap, separator joining).

use chrono::{DateTime, Utc};

use super::schema::SearchResultItem;

/// Fixed cap on rendered results per query.
pub const MAX_RESULTS: usize = 25;

/// Separator between formatted result blocks.
pub const BLOCK_SEPARATOR: &str = "\n---\n\n";

/// User-facing text when the upstream call failed for any reason.
pub const FAILURE_MESSAGE: &str = "Failed to retrieve search results";

/// Render a date the way the catalog displays them, e.g. "January 5, 2024".
fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format one result record as a display-text block.
///
/// Section order is fixed; absent fields are skipped without placeholders.
/// Note the asymmetry kept from the upstream behavior: the By line renders
/// whenever the `creators` key exists (even empty), while the child,
/// see-also, and tag blocks require a non-empty list.
pub fn format_item(item: &SearchResultItem) -> String {
    let mut out = String::new();

    let heading = item.title.as_deref().unwrap_or(&item.id);
    out.push_str(&format!("## {heading}\n\n"));

    if let Some(format) = &item.format {
        out.push_str(&format!("**Format:** {format}\n"));
    }

    if let Some(creators) = &item.creators {
        let names: Vec<&str> = creators.iter().map(|c| c.name.as_str()).collect();
        out.push_str(&format!("**By:** {}\n", names.join(", ")));
    }

    if let Some(source) = &item.source {
        out.push_str(&format!("**Source:** {source}\n"));
    }

    out.push_str(&format!("**Created:** {}\n", display_date(&item.extracted_on)));
    out.push_str(&format!("**Updated:** {}\n", display_date(&item.last_updated)));

    if let Some(extract) = &item.extract {
        out.push_str(&format!("\n{extract}\n"));
    }

    if let Some(notes) = &item.notes {
        out.push_str(&format!("\n*Curator's Note:*\n\n{notes}\n"));
    }

    out.push_str("\n\n");

    if let Some(parent) = &item.parent {
        out.push_str(&format!("**Parent Record:** {}\n", parent.name));
    }

    if let Some(children) = item.children.as_deref().filter(|c| !c.is_empty()) {
        out.push_str("**Child Records:**\n");
        for child in children {
            out.push_str(&format!("- {}\n", child.name));
        }
        out.push('\n');
    }

    if let Some(connections) = item.connections.as_deref().filter(|c| !c.is_empty()) {
        out.push_str("**See also:**\n");
        for connection in connections {
            out.push_str(&format!("- {}\n", connection.name));
        }
        out.push('\n');
    }

    if let Some(spaces) = item.spaces.as_deref().filter(|s| !s.is_empty()) {
        let tags: Vec<String> = spaces.iter().map(|s| format!("#{}", s.name)).collect();
        out.push_str(&format!("**Tagged:** {}\n", tags.join(", ")));
    }

    out
}

/// Assemble the final response text for one query.
///
/// `None` means the upstream call failed; an empty list means the query
/// matched nothing. Otherwise at most [`MAX_RESULTS`] items are rendered in
/// API order.
pub fn render_search_results(query: &str, results: Option<Vec<SearchResultItem>>) -> String {
    let results = match results {
        None => return FAILURE_MESSAGE.to_string(),
        Some(r) => r,
    };

    if results.is_empty() {
        return format!("No results found for \"{query}\"");
    }

    let blocks: Vec<String> = results
        .iter()
        .take(MAX_RESULTS)
        .map(format_item)
        .collect();

    format!(
        "Search results for \"{query}\":\n\n{}",
        blocks.join(BLOCK_SEPARATOR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::LinkedRecord;
    use chrono::TimeZone;

    fn minimal_item(id: &str) -> SearchResultItem {
        SearchResultItem {
            id: id.to_string(),
            extracted_on: Utc.with_ymd_and_hms(2024, 1, 5, 12, 30, 0).unwrap(),
            last_updated: Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0).unwrap(),
            title: None,
            creators: None,
            spaces: None,
            connections: None,
            parent: None,
            parent_creators: None,
            children: None,
            extract: None,
            notes: None,
            images: None,
            image_caption: None,
            michelin_stars: None,
            source: None,
            format: None,
            published_on: None,
        }
    }

    fn linked(name: &str) -> LinkedRecord {
        LinkedRecord {
            id: format!("id-{name}"),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_minimal_item_exact_output() {
        let text = format_item(&minimal_item("abc123"));
        assert_eq!(
            text,
            "## abc123\n\n**Created:** January 5, 2024\n**Updated:** February 10, 2024\n\n\n"
        );
    }

    #[test]
    fn test_title_preferred_over_id() {
        let mut item = minimal_item("abc123");
        item.title = Some("A Title".to_string());
        assert!(format_item(&item).starts_with("## A Title\n\n"));
    }

    #[test]
    fn test_full_item_section_order() {
        let mut item = minimal_item("r1");
        item.title = Some("On Typography".to_string());
        item.format = Some("book".to_string());
        item.creators = Some(vec![linked("Robert Bringhurst"), linked("Jan Tschichold")]);
        item.source = Some("https://example.com/book".to_string());
        item.extract = Some("Typography exists to honor content.".to_string());
        item.notes = Some("Worth rereading.".to_string());
        item.parent = Some(linked("The Elements of Typographic Style"));
        item.children = Some(vec![linked("Chapter One")]);
        item.connections = Some(vec![linked("Grid Systems")]);
        item.spaces = Some(vec![linked("typography"), linked("design")]);

        let text = format_item(&item);
        assert_eq!(
            text,
            "## On Typography\n\n\
             **Format:** book\n\
             **By:** Robert Bringhurst, Jan Tschichold\n\
             **Source:** https://example.com/book\n\
             **Created:** January 5, 2024\n\
             **Updated:** February 10, 2024\n\
             \nTypography exists to honor content.\n\
             \n*Curator's Note:*\n\nWorth rereading.\n\
             \n\n\
             **Parent Record:** The Elements of Typographic Style\n\
             **Child Records:**\n- Chapter One\n\n\
             **See also:**\n- Grid Systems\n\n\
             **Tagged:** #typography, #design\n"
        );
    }

    #[test]
    fn test_empty_creators_still_renders_by_line() {
        let mut item = minimal_item("r1");
        item.creators = Some(vec![]);
        assert!(format_item(&item).contains("**By:** \n"));
    }

    #[test]
    fn test_empty_children_block_omitted() {
        let mut item = minimal_item("r1");
        item.children = Some(vec![]);
        let text = format_item(&item);
        assert!(!text.contains("Child Records"));
    }

    #[test]
    fn test_empty_connections_and_spaces_omitted() {
        let mut item = minimal_item("r1");
        item.connections = Some(vec![]);
        item.spaces = Some(vec![]);
        let text = format_item(&item);
        assert!(!text.contains("See also"));
        assert!(!text.contains("Tagged"));
    }

    #[test]
    fn test_render_failure_message() {
        assert_eq!(
            render_search_results("anything", None),
            "Failed to retrieve search results"
        );
    }

    #[test]
    fn test_render_no_results() {
        assert_eq!(
            render_search_results("xyz", Some(vec![])),
            "No results found for \"xyz\""
        );
    }

    #[test]
    fn test_render_truncates_to_cap_in_order() {
        let items: Vec<SearchResultItem> =
            (0..30).map(|i| minimal_item(&format!("item-{i}"))).collect();
        let text = render_search_results("art", Some(items));

        assert!(text.starts_with("Search results for \"art\":\n\n"));
        assert_eq!(text.matches("\n---\n\n").count(), MAX_RESULTS - 1);
        assert!(text.contains("## item-0\n"));
        assert!(text.contains("## item-24\n"));
        assert!(!text.contains("## item-25\n"));

        // Original API order is preserved.
        let first = text.find("## item-1\n").unwrap();
        let later = text.find("## item-24\n").unwrap();
        assert!(first < later);
    }
}
