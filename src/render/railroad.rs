//! Railroad Diagram Generator client
//!
//! The generator is a web form: it takes W3C-notation EBNF and answers with an XHTML
//! page holding one `<svg>` per production, followed by an `<hr/>` and a footer. The
//! page is converted to HTML before anything else looks at it.

use async_trait::async_trait;

use super::html::{extract_tag, inner_tag_before, xhtml_to_html};
use super::{RenderError, Renderer};
use crate::config::RailroadSettings;
use crate::grammar::parse;

const ATTRIBUTION: &str =
    r#"<p>generated by <a href="http://www.bottlecaps.de/rr/ui">Railroad Diagram Generator</a></p>"#;

pub struct RailroadService {
    client: reqwest::Client,
    settings: RailroadSettings,
    /// Page that production links in statement diagrams point at
    grammar_link: String,
}

impl RailroadService {
    pub fn new(settings: RailroadSettings, grammar_link: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            grammar_link: grammar_link.into(),
        }
    }

    /// Submit `ebnf` and return the generated page as HTML
    pub async fn generate(&self, ebnf: &str) -> Result<String, RenderError> {
        let text = parse(ebnf)?.to_w3c();
        let mut form: Vec<(&str, String)> = vec![
            ("frame", "diagram".to_string()),
            ("text", text),
            ("width", self.settings.width.to_string()),
        ];
        for option in &self.settings.options {
            form.push(("options", option.clone()));
        }

        tracing::debug!(url = %self.settings.url, "requesting railroad diagram");
        let response = self
            .client
            .post(&self.settings.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| RenderError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RenderError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        xhtml_to_html(&body)
    }

    fn link_statement(&self, svg: &str) -> String {
        svg.replace(
            r##"<a xlink:href="#"##,
            &format!(r##"<a xlink:href="{}#"##, self.grammar_link),
        )
    }
}

/// Page body up to the footer, with attribution, wrapped in a `<div>`
fn grammar_page(html: &str) -> Result<String, RenderError> {
    let diagrams = inner_tag_before(html, "body", "hr")?;
    Ok(format!("<div>{}{}</div>", diagrams, ATTRIBUTION))
}

#[async_trait]
impl Renderer for RailroadService {
    fn name(&self) -> &str {
        "railroad"
    }

    async fn statement_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
        let html = self.generate(ebnf).await?;
        let svg = extract_tag(&html, "svg")?;
        Ok(self.link_statement(&svg))
    }

    async fn grammar_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
        let html = self.generate(ebnf).await?;
        grammar_page(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RailroadService {
        RailroadService::new(
            RailroadSettings {
                url: "http://localhost/rr/ui".into(),
                width: 620,
                options: vec![],
            },
            "sql-grammar.html",
        )
    }

    #[test]
    fn test_statement_links_point_at_grammar_page() {
        let svg = r##"<svg><a xlink:href="#name">name</a></svg>"##;
        assert_eq!(
            service().link_statement(svg),
            r##"<svg><a xlink:href="sql-grammar.html#name">name</a></svg>"##
        );
    }

    #[test]
    fn test_grammar_page_drops_footer() {
        let html = "<html><body><svg></svg><hr/><p>footer</p></body></html>";
        assert_eq!(
            grammar_page(html).unwrap(),
            format!("<div><svg></svg>{}</div>", ATTRIBUTION)
        );
    }

    #[test]
    fn test_grammar_page_without_rule_keeps_whole_body() {
        assert_eq!(
            grammar_page("<svg></svg>").unwrap(),
            format!("<div><svg></svg>{}</div>", ATTRIBUTION)
        );
    }

    #[test]
    fn test_service_page_is_post_processed_as_html() {
        let xhtml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body>"#,
            r##"<svg xmlns="http://www.w3.org/2000/svg"><a xlink:href="#name"><rect/></a></svg>"##,
            r#"<hr/><p>footer</p></body></html>"#,
        );
        let html = xhtml_to_html(xhtml).unwrap();
        assert!(html.starts_with("<html"));
        assert!(html.contains("<hr>"));

        let svg = service().link_statement(&extract_tag(&html, "svg").unwrap());
        assert_eq!(
            svg,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
                r##"<a xlink:href="sql-grammar.html#name"><rect></rect></a></svg>"##,
            )
        );
        assert_eq!(
            grammar_page(&html).unwrap(),
            format!(
                "<div>{}{}</div>",
                r##"<svg xmlns="http://www.w3.org/2000/svg"><a xlink:href="#name"><rect></rect></a></svg>"##,
                ATTRIBUTION
            )
        );
    }
}
