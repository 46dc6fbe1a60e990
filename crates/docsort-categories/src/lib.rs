use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use docsort_core::Category;
use docsort_core::relocate::category_folder;

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {name:?} cannot be used as a folder name")]
    InvalidName { line: usize, name: String },
    #[error("line {line}: category {name:?} is defined more than once")]
    DuplicateName { line: usize, name: String },
}

/// Load categories from a keyword-grouped categories file.
///
/// ```text
/// # comment line
/// [Invoices]
/// invoice
/// nota fiscal
/// ```
pub fn load_categories(path: &Path) -> Result<Vec<Category>, CategoryError> {
    let content = std::fs::read_to_string(path)?;
    let categories = parse_categories(&content)?;
    tracing::debug!(path = %path.display(), count = categories.len(), "loaded categories");
    Ok(categories)
}

/// Parse categories file content from a string (useful for testing).
///
/// Lines are trimmed. Blank lines and `#` comments are skipped. `[Name]`
/// opens a category; every other line is a keyword of the open category.
/// Keywords seen while no category is open are ignored, and `[]` closes the
/// open category without opening a new one.
pub fn parse_categories(content: &str) -> Result<Vec<Category>, CategoryError> {
    let mut categories: Vec<Category> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<Category> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = header_name(line) {
            categories.extend(current.take());
            let Some(category) = Category::new(name, Vec::<&str>::new()) else {
                continue;
            };
            let line_no = index + 1;
            if category_folder(Path::new(""), name).is_err() {
                return Err(CategoryError::InvalidName {
                    line: line_no,
                    name: name.to_string(),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(CategoryError::DuplicateName {
                    line: line_no,
                    name: name.to_string(),
                });
            }
            current = Some(category);
        } else if let Some(category) = current.as_mut() {
            category.push_keyword(line);
        }
    }
    categories.extend(current);

    for category in categories.iter().filter(|c| !c.is_matchable()) {
        tracing::warn!(category = category.name(), "category has no keywords and will never match");
    }
    Ok(categories)
}

/// Name inside a `[...]` header line, with brackets and whitespace trimmed.
fn header_name(line: &str) -> Option<&str> {
    if line.starts_with('[') && line.ends_with(']') {
        Some(line.trim_matches(|c| c == '[' || c == ']').trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(Category::name).collect()
    }

    #[test]
    fn test_parse_basic_file() {
        let content = r#"
# comment line
[CategoryName]
keyword-one
keyword-two

[AnotherCategory]
keyword-three
"#;
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["CategoryName", "AnotherCategory"]);
        assert_eq!(categories[0].keywords(), &["keyword-one", "keyword-two"]);
        assert_eq!(categories[1].keywords(), &["keyword-three"]);
    }

    #[test]
    fn test_keywords_lowercased_and_trimmed() {
        let content = "[Invoices]\n   Nota FISCAL  \n\tINVOICE\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(categories[0].keywords(), &["nota fiscal", "invoice"]);
    }

    #[test]
    fn test_keywords_before_first_header_ignored() {
        let content = "orphan\nanother orphan\n[Bills]\nenergy\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["Bills"]);
        assert_eq!(categories[0].keywords(), &["energy"]);
    }

    #[test]
    fn test_comment_lines_skipped_even_indented() {
        let content = "[Bills]\n   # not a keyword\nenergy\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(categories[0].keywords(), &["energy"]);
    }

    #[test]
    fn test_empty_header_closes_category() {
        let content = "[Bills]\nenergy\n[]\nignored\n[Taxes]\nirpf\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["Bills", "Taxes"]);
        assert_eq!(categories[0].keywords(), &["energy"]);
    }

    #[test]
    fn test_header_name_trimmed() {
        let content = "[ Medical Records ]\nexam\n[[Nested]]\nx\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["Medical Records", "Nested"]);
    }

    #[test]
    fn test_category_without_keywords_kept() {
        let content = "[Empty]\n[Bills]\nenergy\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["Empty", "Bills"]);
        assert!(!categories[0].is_matchable());
    }

    #[test]
    fn test_order_preserved() {
        let content = "[C]\nc\n[A]\na\n[B]\nb\n";
        let categories = parse_categories(content).unwrap();
        assert_eq!(names(&categories), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_path_like_name_rejected() {
        for header in ["[../escape]", "[a/b]", "[..]", "[.]"] {
            let content = format!("[Ok]\nx\n{header}\ny\n");
            match parse_categories(&content) {
                Err(CategoryError::InvalidName { line, .. }) => assert_eq!(line, 3),
                other => panic!("{header}: expected InvalidName, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let content = "[Bills]\nenergy\n\n[Bills]\nwater\n";
        match parse_categories(content) {
            Err(CategoryError::DuplicateName { line, name }) => {
                assert_eq!(line, 4);
                assert_eq!(name, "Bills");
            }
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_categories("").unwrap().is_empty());
        assert!(parse_categories("# only comments\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("categories.conf");
        std::fs::write(&path, "[Invoices]\ninvoice\n").unwrap();
        let categories = load_categories(&path).unwrap();
        assert_eq!(names(&categories), vec!["Invoices"]);

        let missing = load_categories(&dir.path().join("missing.conf"));
        assert!(matches!(missing, Err(CategoryError::Io(_))));
    }
}
