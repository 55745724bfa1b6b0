//! 网页正文抽取

use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

const BLOCK_ELEMENTS: [&str; 14] = [
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "blockquote",
];

/// 将HTML转换为可读文本，截断到max_chars个字符
pub fn page_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        match node.value() {
            Node::Text(fragment) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
                });
                let words = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
                if !hidden && !words.is_empty() {
                    text.push_str(&words);
                    text.push(' ');
                }
            }
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => {
                text.push('\n');
            }
            _ => {}
        }
    }

    truncate_chars(&collapse_whitespace(&text), max_chars)
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(" ...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_drops_scripts_and_styles() {
        let html = r#"
            <html>
                <head><title>Kyoto guide</title><style>p { color: red; }</style></head>
                <body>
                    <h1>Gion at night</h1>
                    <script>track('visit');</script>
                    <p>Lantern-lit   streets and
                       teahouses.</p>
                </body>
            </html>
        "#;

        let text = page_text(html, 1000);
        assert_eq!(text, "Gion at night\nLantern-lit streets and teahouses.");
    }

    #[test]
    fn test_page_text_truncates_on_char_boundary() {
        let html = "<body><p>清水寺 Kiyomizu-dera temple</p></body>";

        let text = page_text(html, 5);
        assert_eq!(text, "清水寺 K ...");
    }

    #[test]
    fn test_page_text_without_body_keeps_text() {
        assert_eq!(page_text("Nishiki Market", 100), "Nishiki Market");
    }
}
