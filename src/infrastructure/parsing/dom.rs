//! Tree navigation helpers over `scraper` elements

use scraper::ElementRef;

/// Concatenated descendant text, trimmed
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Ancestors named `tag` carrying `class`, outermost first
pub fn classed_ancestors<'a>(element: ElementRef<'a>, tag: &str, class: &str) -> Vec<ElementRef<'a>> {
    let mut found: Vec<ElementRef<'a>> = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == tag && has_class(*el, class))
        .collect();
    found.reverse();
    found
}

/// Nearest element named `tag` that starts before `start` in document order.
///
/// Walks backwards: previous siblings (deepest last descendant first), then the
/// parent, then the parent's previous siblings, and so on up to the root.
/// Ancestors count as preceding elements.
pub fn preceding_element<'a>(start: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let mut cursor = *start;
    loop {
        if let Some(prev) = cursor.prev_sibling() {
            let subtree: Vec<_> = prev.descendants().collect();
            if let Some(found) = subtree
                .into_iter()
                .rev()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == tag)
            {
                return Some(found);
            }
            cursor = prev;
        } else {
            let parent = cursor.parent()?;
            if let Some(el) = ElementRef::wrap(parent) {
                if el.value().name() == tag {
                    return Some(el);
                }
            }
            cursor = parent;
        }
    }
}
