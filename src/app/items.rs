//! Item list loading and validation

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};
use url::Url;

use super::models::{item_count, DownloadItem, ItemGroups};
use crate::errors::{ItemsError, ItemsResult};

/// Read and validate the item list at `path`
pub async fn load_items(path: &Path) -> ItemsResult<ItemGroups> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ItemsError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ItemsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let groups = parse_items(&content)?;
    debug!(
        "Loaded {} items in {} groups from {}",
        item_count(&groups),
        groups.len(),
        path.display()
    );
    Ok(groups)
}

/// Parse an item list document. A group with no entries is kept as an empty group.
///
/// Only an item without a filename fails the whole list. Items without URLs
/// and unparsable URLs are logged and kept; the run reports them per item.
pub fn parse_items(content: &str) -> ItemsResult<ItemGroups> {
    if content.trim().is_empty() {
        return Ok(ItemGroups::new());
    }

    let raw: IndexMap<String, Option<Vec<DownloadItem>>> = serde_yaml::from_str(content)?;
    let groups: ItemGroups = raw
        .into_iter()
        .map(|(group, items)| (group, items.unwrap_or_default()))
        .collect();

    for (group, items) in &groups {
        for (index, item) in items.iter().enumerate() {
            validate_item(group, index + 1, item)?;
        }
    }

    Ok(groups)
}

fn validate_item(group: &str, index: usize, item: &DownloadItem) -> ItemsResult<()> {
    let invalid = |reason: String| ItemsError::InvalidItem {
        group: group.to_string(),
        index,
        reason,
    };

    if item.filename.trim().is_empty() {
        return Err(invalid("filename is empty".to_string()));
    }
    if item.download_urls.is_empty() {
        warn!(
            "Item #{} '{}' in group '{}' has no download-urls",
            index,
            item.display_name(),
            group
        );
    }
    for url in &item.download_urls {
        if let Err(e) = Url::parse(url.trim()) {
            warn!(
                "Item #{} '{}' in group '{}' has a bad URL '{}': {}",
                index,
                item.display_name(),
                group,
                url,
                e
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
tools:
  - module: ripgrep
    filename: rg.tar.gz
    download-urls:
      - https://example.com/rg.tar.gz
      - https://mirror.example.org/rg.tar.gz
    keep-updated: true
  - module: hosts
    filename: hosts.txt
    download-urls:
      - https://github.com/o/r/blob/main/hosts.txt
lists:
  - filename: blocklist.txt
    download-urls: [ "https://example.com/blocklist.txt" ]
"#;

    #[test]
    fn test_parse_groups_in_order() {
        let groups = parse_items(SAMPLE).unwrap();

        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["tools", "lists"]);

        let tools = &groups["tools"];
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].module, "ripgrep");
        assert_eq!(tools[0].download_urls.len(), 2);
        assert!(tools[0].keep_updated);
        assert!(!tools[1].keep_updated);

        let lists = &groups["lists"];
        assert_eq!(lists[0].display_name(), "blocklist.txt");
    }

    #[test]
    fn test_empty_document_and_empty_group() {
        assert!(parse_items("   \n").unwrap().is_empty());

        let groups = parse_items("placeholder:\n").unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups["placeholder"].is_empty());
    }

    #[test]
    fn test_item_without_filename_is_rejected() {
        let yaml = "g:\n  - module: a\n    filename: \"\"\n    download-urls: [\"https://example.com/a\"]\n";
        let err = parse_items(yaml).unwrap_err();
        assert!(matches!(err, ItemsError::InvalidItem { ref group, index: 1, .. } if group == "g"));
    }

    #[test]
    fn test_unusable_urls_do_not_fail_the_list() {
        let yaml = r#"
g:
  - module: a
    filename: a.txt
  - filename: b.txt
    download-urls: ["ftp//broken", "https://example.com/b.txt"]
  - filename: c.txt
    download-urls: ["https://example.com/c.txt"]
"#;
        let groups = parse_items(yaml).unwrap();
        assert_eq!(groups["g"].len(), 3);
        assert!(groups["g"][0].download_urls.is_empty());
        assert_eq!(groups["g"][1].download_urls[0], "ftp//broken");
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_items("g: [unclosed"),
            Err(ItemsError::Yaml(_))
        ));
    }

    #[tokio::test]
    async fn test_load_items_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let groups = load_items(&path).await.unwrap();
        assert_eq!(item_count(&groups), 3);

        let missing = load_items(&temp_dir.path().join("nope.yaml")).await;
        assert!(matches!(missing, Err(ItemsError::NotFound { .. })));
    }
}
