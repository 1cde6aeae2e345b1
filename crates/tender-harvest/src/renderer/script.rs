//! JavaScript snippets evaluated in the page.
//!
//! User-provided values (selectors, phrases) are only ever injected into
//! single-quoted string literals after passing through [`sanitize_js_string`].

/// Attribute stamped on queried elements so later actions can address them.
pub const REF_ATTRIBUTE: &str = "data-harvest-ref";

/// Upper bound on elements returned by a single query.
pub const MAX_QUERY_RESULTS: usize = 500;

/// Snapshot elements matching `selector` as an array of `DomElement` objects.
///
/// Each element is stamped with a unique [`REF_ATTRIBUTE`] and reported with
/// a handle selector addressing exactly that element. An invalid selector
/// yields `{ error }` instead of throwing.
pub fn query_elements(selector: &str) -> String {
    format!(
        r#"(() => {{
            let nodes;
            try {{ nodes = Array.from(document.querySelectorAll('{selector}')); }}
            catch (e) {{ return {{ error: String(e) }}; }}
            window.__harvestRef = window.__harvestRef || 0;
            return nodes.slice(0, {limit}).map(el => {{
                let ref = el.getAttribute('{attr}');
                if (!ref) {{
                    window.__harvestRef += 1;
                    ref = String(window.__harvestRef);
                    el.setAttribute('{attr}', ref);
                }}
                const r = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                const shown = style.display !== 'none' && style.visibility !== 'hidden'
                    && r.width > 0 && r.height > 0;
                const cls = typeof el.className === 'string' ? el.className : (el.getAttribute('class') || '');
                return {{
                    handle: '[{attr}="' + ref + '"]',
                    tag: el.tagName.toLowerCase(),
                    text: (el.innerText || el.value || '').trim(),
                    id: el.id || '',
                    class_name: cls,
                    name: el.getAttribute('name') || '',
                    placeholder: el.getAttribute('placeholder') || '',
                    aria_label: el.getAttribute('aria-label') || '',
                    role: el.getAttribute('role') || '',
                    bounding_box: shown ? {{ x: r.x, y: r.y, width: r.width, height: r.height }} : null,
                    parent_text: el.parentElement ? (el.parentElement.innerText || '').trim() : '',
                }};
            }});
        }})()"#,
        selector = sanitize_js_string(selector),
        limit = MAX_QUERY_RESULTS,
        attr = REF_ATTRIBUTE,
    )
}

/// Click via the DOM, for elements the input pipeline cannot reach
/// (covered by overlays, zero-size wrappers).
pub fn dom_click(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) {{ return {{ success: false }}; }}
            el.scrollIntoView({{ block: 'center' }});
            el.click();
            return {{ success: true }};
        }})()"#,
        sanitize_js_string(selector)
    )
}

/// Clear a form control's value so typing replaces it.
pub fn clear_value(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) {{ return {{ success: false }}; }}
            el.focus();
            if ('value' in el) {{
                el.value = '';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            }}
            return {{ success: true }};
        }})()"#,
        sanitize_js_string(selector)
    )
}

/// True when any selector matches a rendered element.
pub fn any_selector_visible(selectors: &[String]) -> String {
    let list = selectors
        .iter()
        .map(|s| format!("'{}'", sanitize_js_string(s)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"(() => {{
            for (const sel of [{list}]) {{
                let nodes = [];
                try {{ nodes = Array.from(document.querySelectorAll(sel)); }} catch (e) {{ continue; }}
                if (nodes.some(el => {{ const r = el.getBoundingClientRect(); return r.width > 0 && r.height > 0; }})) {{
                    return true;
                }}
            }}
            return false;
        }})()"#
    )
}

/// True when the page text contains any phrase, ignoring case.
pub fn text_contains_any(phrases: &[String]) -> String {
    let list = phrases
        .iter()
        .map(|p| format!("'{}'", sanitize_js_string(&p.to_lowercase())))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"(() => {{
            const text = (document.body ? document.body.innerText : '').toLowerCase();
            return [{list}].some(p => text.includes(p));
        }})()"#
    )
}

/// Visible text of the whole page.
pub const PAGE_TEXT: &str = "document.body ? document.body.innerText : ''";

/// Serialized DOM of the whole page.
pub const OUTER_HTML: &str = "document.documentElement.outerHTML";

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes backslashes, quotes, backticks and line breaks, strips null bytes
/// and hex-escapes angle brackets so a value cannot close a script tag.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_quotes() {
        assert_eq!(sanitize_js_string("a[name='q']"), "a[name=\\'q\\']");
        assert_eq!(sanitize_js_string("it\"s"), "it\\\"s");
    }

    #[test]
    fn test_sanitize_script_close() {
        let sanitized = sanitize_js_string("</script>");
        assert!(!sanitized.contains("</script>"));
        assert_eq!(sanitized, "\\x3c/script\\x3e");
    }

    #[test]
    fn test_sanitize_strips_null_bytes() {
        assert_eq!(sanitize_js_string("ab\0c"), "abc");
    }

    #[test]
    fn test_query_script_embeds_selector_and_ref_attribute() {
        let js = query_elements("div.search-results-container > div > a");
        assert!(js.contains("document.querySelectorAll('div.search-results-container \\x3e div \\x3e a')"));
        assert!(js.contains(REF_ATTRIBUTE));
        assert!(js.contains(&MAX_QUERY_RESULTS.to_string()));
    }

    #[test]
    fn test_text_contains_any_lowercases_phrases() {
        let js = text_contains_any(&["Successful Tenderer".to_string()]);
        assert!(js.contains("'successful tenderer'"));
    }

    #[test]
    fn test_any_selector_visible_lists_all_selectors() {
        let js = any_selector_visible(&["#a".to_string(), ".b".to_string()]);
        assert!(js.contains("['#a', '.b']"));
    }
}
