//! Lot detail-page extraction.
//!
//! The lot page carries the full description in standard meta tags; no
//! scripting is needed to read them. Extraction is best-effort: a page
//! without the expected tags yields `None`, never an error.

/// Extracts the lot description from a detail page.
///
/// Tries `<meta name="description">` first, then `og:description`.
pub(crate) fn extract_description(html: &str) -> Option<String> {
    extract_meta_content(html, r#"name=["']description["']"#)
        .or_else(|| extract_meta_content(html, r#"property=["']og:description["']"#))
}

/// Extracts the lot title from a detail page.
///
/// Tries `og:title` first (cleaner than `<title>`, which carries the site
/// name suffix), then the `<title>` element.
pub(crate) fn extract_title(html: &str) -> Option<String> {
    extract_meta_content(html, r#"property=["']og:title["']"#).or_else(|| {
        let re = regex::Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex");
        re.captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|t| !t.is_empty())
    })
}

/// Finds a `<meta ... content="...">` tag whose attributes match
/// `attr_pattern`, tolerating either attribute order.
fn extract_meta_content(html: &str, attr_pattern: &str) -> Option<String> {
    let before = format!(r#"(?is)<meta[^>]*{attr_pattern}[^>]*content=["']([^"']*)["']"#);
    let after = format!(r#"(?is)<meta[^>]*content=["']([^"']*)["'][^>]*{attr_pattern}"#);

    for pattern in [before, after] {
        let re = regex::Regex::new(&pattern).expect("valid regex");
        if let Some(content) = re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|c| !c.is_empty())
        {
            return Some(content);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_meta_description() {
        let html = r#"
            <html><head>
            <meta name="description" content="Imóvel com área de 375,00m² no Loteamento Balneário Itapiruba">
            </head></html>
        "#;
        assert_eq!(
            extract_description(html).as_deref(),
            Some("Imóvel com área de 375,00m² no Loteamento Balneário Itapiruba")
        );
    }

    #[test]
    fn falls_back_to_og_description() {
        let html = r#"<meta property="og:description" content="Casa de alvenaria em Laguna/SC">"#;
        assert_eq!(
            extract_description(html).as_deref(),
            Some("Casa de alvenaria em Laguna/SC")
        );
    }

    #[test]
    fn extracts_meta_with_reversed_attribute_order() {
        let html = r#"<meta content="Terreno urbano" name="description">"#;
        assert_eq!(extract_description(html).as_deref(), Some("Terreno urbano"));
    }

    #[test]
    fn extracts_title_from_og_title() {
        let html = r#"<meta property="og:title" content="Lote 235407 - Imóvel em Itapiruba">"#;
        assert_eq!(
            extract_title(html).as_deref(),
            Some("Lote 235407 - Imóvel em Itapiruba")
        );
    }

    #[test]
    fn extracts_title_from_title_element() {
        let html = "<html><head><title> Casa na Praia </title></head></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Casa na Praia"));
    }

    #[test]
    fn missing_tags_yield_none() {
        let html = "<html><body><p>nothing here</p></body></html>";
        assert!(extract_description(html).is_none());
        assert!(extract_title(html).is_none());
    }
}
