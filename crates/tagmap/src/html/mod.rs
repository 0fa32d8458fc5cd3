//! Embedded HTML templates.
//!
//! The templates are compiled into the binary so the server and the offline
//! builder need no template directory at runtime.

use tera::{Context, Tera};

use crate::error::{Error, Result};

/// The generated map document.
pub const MAP_TEMPLATE: &str = include_str!("map.html");

/// Upload form.
pub const INDEX_TEMPLATE: &str = include_str!("index.html");

/// Page embedding the generated map.
pub const VIEWER_TEMPLATE: &str = include_str!("viewer.html");

/// Shown when no map exists yet.
pub const NOT_FOUND_TEMPLATE: &str = include_str!("not_found.html");

/// Page title used throughout.
pub const TITLE: &str = "Work Site Map";

/// Compiled templates.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if a template fails to parse.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("map.html", MAP_TEMPLATE),
            ("index.html", INDEX_TEMPLATE),
            ("viewer.html", VIEWER_TEMPLATE),
            ("not_found.html", NOT_FOUND_TEMPLATE),
        ])
        .map_err(|source| Error::Render {
            template: "templates",
            source,
        })?;
        Ok(Self { tera })
    }

    /// Render the map document around an already-serialized JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] on template failure.
    pub fn map_document(&self, payload_json: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", TITLE);
        context.insert("payload", payload_json);
        self.render("map.html", &context)
    }

    /// Render the upload form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] on template failure.
    pub fn index(&self, columns: &[&str], has_map: bool) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", TITLE);
        context.insert("columns", columns);
        context.insert("has_map", &has_map);
        self.render("index.html", &context)
    }

    /// Render the viewer page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] on template failure.
    pub fn viewer(&self) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", TITLE);
        self.render("viewer.html", &context)
    }

    /// Render the page shown when no map has been generated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] on template failure.
    pub fn not_found(&self, message: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", TITLE);
        context.insert("message", message);
        self.render("not_found.html", &context)
    }

    fn render(&self, template: &'static str, context: &Context) -> Result<String> {
        self.tera
            .render(template, context)
            .map_err(|source| Error::Render { template, source })
    }
}
