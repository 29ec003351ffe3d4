//! Filter sidebar of the change list.

use ironhtml::typed::Element;
use ironhtml_elements::{Div, A, I};
use serde::Serialize;

use crate::filters::ChoiceOption;

/// A filter as rendered: its title and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPanel {
    /// Filter heading.
    pub title: String,
    /// Options, in display order.
    pub choices: Vec<ChoiceOption>,
}

/// Renders the filters as Bootstrap cards holding a list group of links.
///
/// The selected options are marked `active`. Returns an empty string when
/// there are no filters.
pub fn render_filter_sidebar(panels: &[FilterPanel]) -> String {
    let mut html = String::new();
    for panel in panels {
        let heading = format!("By {}", panel.title);
        Element::<Div>::new()
            .class("card mb-3")
            .child::<Div, _>(|d| {
                d.class("card-header")
                    .child::<I, _>(|i| i.class("bi bi-funnel me-2"))
                    .text(&heading)
            })
            .child::<Div, _>(|d| {
                d.class("list-group list-group-flush").children(
                    panel.choices.iter(),
                    |choice, a: Element<A>| {
                        let class = if choice.selected {
                            "list-group-item list-group-item-action active"
                        } else {
                            "list-group-item list-group-item-action"
                        };
                        a.attr("href", &choice.query_string)
                            .class(class)
                            .text(&choice.display)
                    },
                )
            })
            .render_to(&mut html);
    }
    html
}

/// Serializes the filters for client-side rendering.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn filters_to_json(panels: &[FilterPanel]) -> serde_json::Result<String> {
    serde_json::to_string(panels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> FilterPanel {
        FilterPanel {
            title: "status".to_string(),
            choices: vec![
                ChoiceOption {
                    selected: false,
                    query_string: "?".to_string(),
                    display: "All".to_string(),
                },
                ChoiceOption {
                    selected: true,
                    query_string: "?status__in=A".to_string(),
                    display: "R&D".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_sidebar() {
        let html = render_filter_sidebar(&[panel()]);
        assert!(html.contains("card-header"));
        assert!(html.contains("By status"));
        assert!(html.contains(r#"href="?status__in=A""#));
        assert!(html.contains("list-group-item-action active"));
        assert_eq!(html.matches("list-group-item-action active").count(), 1);
        assert!(html.contains("R&amp;D"));
    }

    #[test]
    fn test_render_without_filters() {
        assert!(render_filter_sidebar(&[]).is_empty());
    }

    #[test]
    fn test_filters_to_json() {
        let json = filters_to_json(&[panel()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "status");
        assert_eq!(value[0]["choices"][1]["selected"], true);
        assert_eq!(value[0]["choices"][1]["query_string"], "?status__in=A");
    }
}
