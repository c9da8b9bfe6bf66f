//! Cleanup of layout-agent output before it is rendered.

const FENCE: &str = "```";

/// Strip code fences wrapped around a layout answer.
///
/// Removes a leading fence (with an optional language tag such as `html`) and
/// a trailing fence, then trims. Stacked fences at either end are removed
/// until none is left, so `clean(clean(x)) == clean(x)` for every input.
/// Fences in the middle of the text are left alone.
pub fn clean(raw: &str) -> String {
    let mut text = raw.trim();
    loop {
        let before = text.len();
        if let Some(rest) = strip_opening_fence(text) {
            text = rest.trim();
        }
        if let Some(rest) = text.strip_suffix(FENCE) {
            text = rest.trim();
        }
        if text.len() == before {
            return text.to_string();
        }
    }
}

/// Language tags that may sit directly against the markup they label.
const MARKUP_TAGS: [&str; 3] = ["html", "xml", "svg"];

/// Remove "```" and, when present, the language tag right after it.
///
/// Any tag counts when a line break follows it (`` ```c++\n ``). A
/// markup tag also counts before a space or directly before markup
/// (`` ```html<div> ``). Otherwise the word after the fence is content.
fn strip_opening_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '_')))
        .unwrap_or(rest.len());
    let (tag, after_tag) = rest.split_at(tag_len);

    let ends_line = after_tag
        .trim_start_matches([' ', '\t'])
        .starts_with(['\n', '\r']);
    let markup_tag = MARKUP_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
        && (after_tag.is_empty()
            || after_tag.starts_with(char::is_whitespace)
            || after_tag.starts_with('<'));

    if ends_line || markup_tag {
        Some(after_tag)
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence() {
        assert_eq!(clean("```html\n<h1>Hi</h1>\n```"), "<h1>Hi</h1>");
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        assert_eq!(clean("  ```\n<p>x</p>\n```  \n"), "<p>x</p>");
    }

    #[test]
    fn tag_is_case_insensitive_in_practice() {
        assert_eq!(clean("```HTML\n<p>x</p>```"), "<p>x</p>");
    }

    #[test]
    fn tag_glued_to_markup() {
        assert_eq!(clean("```html<div>a</div>```"), "<div>a</div>");
    }

    #[test]
    fn word_after_fence_on_same_line_is_content() {
        assert_eq!(clean("```Hello world```"), "Hello world");
        assert_eq!(clean("```Answer: 42\n```"), "Answer: 42");
        assert_eq!(clean("```Hello"), "Hello");
    }

    #[test]
    fn any_tag_on_its_own_line_is_dropped() {
        assert_eq!(clean("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(clean("```svg <svg/>```"), "<svg/>");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(clean("\n <p>plain</p> \n"), "<p>plain</p>");
    }

    #[test]
    fn interior_fences_are_untouched() {
        let input = "<p>Use ```code``` like this</p>";
        assert_eq!(clean(input), input);

        let wrapped = "```html\n<pre>```js\nlet x;\n```</pre>\n```";
        assert_eq!(clean(wrapped), "<pre>```js\nlet x;\n```</pre>");
    }

    #[test]
    fn stacked_fences_are_all_removed() {
        assert_eq!(clean("```html\n```html\n<b>x</b>\n```\n```"), "<b>x</b>");
    }

    #[test]
    fn lone_fences() {
        assert_eq!(clean("```"), "");
        assert_eq!(clean("``````"), "");
        assert_eq!(clean("```html"), "");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn idempotent_on_tricky_inputs() {
        let inputs = [
            "```html\n<h1>Hi</h1>\n```",
            "```\n```\n```",
            "````html\nx\n````",
            "```html{color:red}```",
            "  ```  ```html  x  ```  ```  ",
            "<p>no fences</p>",
            "text ending in a fence ```",
            "```` ```",
            "```c++\nint x;\n```",
            "```Hello world```",
            "```Html ```xml\n<a/>",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {input:?}");
            assert!(!once.starts_with(FENCE), "leading fence left in {once:?}");
            assert!(!once.ends_with(FENCE), "trailing fence left in {once:?}");
        }
    }
}
