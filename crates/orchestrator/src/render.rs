//! What the rendering surface shows, and the policy markup passes through
//! before it gets there.

use aula_core::CompletionFailure;

/// The visualization pane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderView {
    /// Nothing rendered yet
    #[default]
    Empty,
    /// A layout call is in flight
    Loading,
    /// Cleaned markup, ready to display
    Markup(String),
    /// The last layout call failed. Stale markup is never kept around.
    Failed(CompletionFailure),
}

impl RenderView {
    pub fn markup(&self) -> Option<&str> {
        match self {
            RenderView::Markup(markup) => Some(markup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Content of the assistant turn behind the last successful render.
    pub last_rendered: Option<String>,
    pub view: RenderView,
}

/// Gatekeeper between the layout agent's output and the display.
///
/// Layout output is model-generated and may contain anything. Whatever a
/// policy returns is shown as-is.
pub trait MarkupPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn admit(&self, markup: String) -> String;
}

/// Passes markup through unchanged. The rendering surface is trusted to
/// sandbox it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedMarkup;

impl MarkupPolicy for TrustedMarkup {
    fn name(&self) -> &str {
        "trusted"
    }

    fn admit(&self, markup: String) -> String {
        markup
    }
}

/// Escapes markup so it displays as text. For surfaces that cannot sandbox
/// HTML at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapedMarkup;

impl MarkupPolicy for EscapedMarkup {
    fn name(&self) -> &str {
        "escaped"
    }

    fn admit(&self, markup: String) -> String {
        let mut escaped = String::with_capacity(markup.len());
        for c in markup.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#39;"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_is_identity() {
        let markup = "<script>alert(1)</script>".to_string();
        assert_eq!(TrustedMarkup.admit(markup.clone()), markup);
    }

    #[test]
    fn escaped_neutralizes_tags() {
        assert_eq!(
            EscapedMarkup.admit("<b class=\"x\">Tom & Jerry's</b>".into()),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/b&gt;"
        );
    }

    #[test]
    fn only_markup_view_exposes_markup() {
        assert_eq!(RenderView::Markup("<p/>".into()).markup(), Some("<p/>"));
        assert_eq!(RenderView::Loading.markup(), None);
        assert_eq!(RenderView::default(), RenderView::Empty);
    }
}
