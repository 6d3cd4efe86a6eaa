//! Naming and addressing of downloadable conversion archives.

use crate::constants::ARTIFACT_SUFFIX;
use crate::types::Target;

/// File name for a downloaded archive: `{title}_{target}_template.zip`,
/// lower-cased, with every whitespace run collapsed to one underscore.
pub fn artifact_file_name(title: &str, target: Target) -> String {
    let stem: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();

    let stem = if stem.is_empty() { "untitled" } else { stem.as_str() };
    format!("{stem}_{}_{ARTIFACT_SUFFIX}", target.slug())
}

/// Resolve an artifact or image reference against the media base URL.
///
/// Absolute references are returned unchanged.
pub fn resolve_media_url(media_base: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    format!(
        "{}/{}",
        media_base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_normalises_whitespace() {
        assert_eq!(
            artifact_file_name("Homepage  Template\tv2", Target::Django),
            "homepage_template_v2_django_template.zip"
        );
    }

    #[test]
    fn test_file_name_trims_and_lowercases() {
        assert_eq!(
            artifact_file_name("  My Shop ", Target::Nextjs),
            "my_shop_nextjs_template.zip"
        );
    }

    #[test]
    fn test_file_name_strips_separators() {
        assert_eq!(
            artifact_file_name("a/b\\c", Target::Nextjs),
            "a_b_c_nextjs_template.zip"
        );
        assert_eq!(
            artifact_file_name("   ", Target::Django),
            "untitled_django_template.zip"
        );
    }

    #[test]
    fn test_resolve_relative_reference() {
        assert_eq!(
            resolve_media_url("http://127.0.0.1:8000/", "/media/builds/x.zip"),
            "http://127.0.0.1:8000/media/builds/x.zip"
        );
    }

    #[test]
    fn test_resolve_absolute_reference() {
        let url = "https://cdn.example.com/builds/x.zip";
        assert_eq!(resolve_media_url("http://127.0.0.1:8000", url), url);
    }
}
