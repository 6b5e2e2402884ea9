//! Offline renderer: emits the EBNF itself as preformatted HTML

use async_trait::async_trait;

use super::html::listing;
use super::{RenderError, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct EbnfRenderer;

#[async_trait]
impl Renderer for EbnfRenderer {
    fn name(&self) -> &str {
        "ebnf"
    }

    async fn statement_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
        listing(ebnf)
    }

    async fn grammar_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
        Ok(format!("<div>{}</div>", listing(ebnf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_statement_is_escaped() {
        let markup = EbnfRenderer
            .statement_diagram("a:\n    '<' b\n  ;\n")
            .await
            .unwrap();
        assert_eq!(
            markup,
            "<pre class=\"ebnf\">a:\n    '&lt;' b\n  ;\n</pre>"
        );
    }
}
