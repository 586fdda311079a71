// Server-rendered HTML pages
use crate::domain::alert::AlertItem;
use crate::domain::dashboard::DASHBOARD_CONTAINER_ID;
use crate::infrastructure::dom::{AlertElement, DomContainer};

pub const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");
const ALERTS_PLACEHOLDER: &str = "{{alerts}}";

/// Dashboard page with the container pre-filled from `items`
pub fn render_dashboard(items: &[AlertItem]) -> String {
    let mut container = DomContainer::new(DASHBOARD_CONTAINER_ID);
    for item in items {
        container.append_child(AlertElement::new(item));
    }
    DASHBOARD_TEMPLATE.replace(ALERTS_PLACEHOLDER, &container.inner_html())
}
