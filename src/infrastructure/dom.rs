// In-memory DOM-like render target with HTML output
use crate::application::render_target::{RenderError, RenderTarget};
use crate::domain::alert::AlertItem;
use std::io::Write;
use std::path::PathBuf;

pub const ALERT_ITEM_CLASS: &str = "alert-item";

/// One rendered alert. Text is stored raw and only escaped on HTML output.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertElement {
    pub class_name: String,
    pub timestamp: String,
    pub message: String,
}

impl AlertElement {
    pub fn new(item: &AlertItem) -> Self {
        Self {
            class_name: ALERT_ITEM_CLASS.to_string(),
            timestamp: item.timestamp.clone(),
            message: item.message.clone(),
        }
    }

    pub fn text_content(&self) -> String {
        format!("{}: {}", self.timestamp, self.message)
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"{}\"><strong>{}</strong>: {}</div>",
            escape_html(&self.class_name),
            escape_html(&self.timestamp),
            escape_html(&self.message)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomContainer {
    pub id: String,
    children: Vec<AlertElement>,
}

impl DomContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[AlertElement] {
        &self.children
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn append_child(&mut self, element: AlertElement) {
        self.children.push(element);
    }

    pub fn inner_html(&self) -> String {
        self.children
            .iter()
            .map(AlertElement::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div id=\"{}\">\n{}\n</div>",
            escape_html(&self.id),
            self.inner_html()
        )
    }
}

/// A page holding containers addressable by id
#[derive(Debug, Clone, Default)]
pub struct DomDocument {
    containers: Vec<DomContainer>,
}

impl DomDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, id: impl Into<String>) -> Self {
        self.containers.push(DomContainer::new(id));
        self
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&DomContainer> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn get_element_by_id_mut(&mut self, id: &str) -> Option<&mut DomContainer> {
        self.containers.iter_mut().find(|c| c.id == id)
    }
}

/// How a re-rendered container is shown outside the process
#[derive(Debug, Clone)]
pub enum Presentation {
    Silent,
    Stdout,
    HtmlFile(PathBuf),
}

/// Renders into one container of a `DomDocument`, looked up by id on every write.
#[derive(Debug)]
pub struct DocumentTarget {
    document: DomDocument,
    container_id: String,
    presentation: Presentation,
}

impl DocumentTarget {
    pub fn new(document: DomDocument, container_id: impl Into<String>) -> Self {
        Self {
            document,
            container_id: container_id.into(),
            presentation: Presentation::Silent,
        }
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn container(&self) -> Option<&DomContainer> {
        self.document.get_element_by_id(&self.container_id)
    }

    fn container_mut(&mut self) -> Result<&mut DomContainer, RenderError> {
        self.document
            .get_element_by_id_mut(&self.container_id)
            .ok_or_else(|| RenderError::MissingContainer(self.container_id.clone()))
    }
}

impl RenderTarget for DocumentTarget {
    fn clear(&mut self) -> Result<(), RenderError> {
        self.container_mut()?.clear();
        Ok(())
    }

    fn append(&mut self, item: &AlertItem) -> Result<(), RenderError> {
        self.container_mut()?.append_child(AlertElement::new(item));
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let container = self.container_mut()?.clone();

        match &self.presentation {
            Presentation::Silent => {}
            Presentation::Stdout => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                writeln!(out, "--- {} alert(s) ---", container.children().len())?;
                for element in container.children() {
                    writeln!(out, "{}", element.text_content())?;
                }
                out.flush()?;
            }
            Presentation::HtmlFile(path) => {
                std::fs::write(path, container.to_html())?;
            }
        }

        Ok(())
    }
}

/// Escape text for use inside HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x')</script> & \"y\""),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;y&quot;"
        );
        assert_eq!(escape_html("12:00:01"), "12:00:01");
    }

    #[test]
    fn test_element_html_is_escaped() {
        let element = AlertElement::new(&AlertItem::new("12:00:01", "<b>disk</b> full"));
        assert_eq!(
            element.to_html(),
            "<div class=\"alert-item\"><strong>12:00:01</strong>: &lt;b&gt;disk&lt;/b&gt; full</div>"
        );
        assert_eq!(element.text_content(), "12:00:01: <b>disk</b> full");
    }

    #[test]
    fn test_missing_container() {
        let mut target = DocumentTarget::new(DomDocument::new().with_container("other"), "dashboard-container");
        let err = target.clear().unwrap_err();
        assert!(matches!(err, RenderError::MissingContainer(id) if id == "dashboard-container"));
        assert!(target.container().is_none());
    }

    #[test]
    fn test_html_file_presentation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.html");
        let mut target = DocumentTarget::new(DomDocument::new().with_container("dashboard-container"), "dashboard-container")
            .with_presentation(Presentation::HtmlFile(path.clone()));

        target.clear().unwrap();
        target.append(&AlertItem::new("12:00:01", "disk full")).unwrap();
        target.present().unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<div id=\"dashboard-container\">"));
        assert!(html.contains("<strong>12:00:01</strong>: disk full"));
    }
}
