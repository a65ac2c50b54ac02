//! Print dispatch types

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DispatchError;

/// Declared content type of a print request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Html,
    Pdf,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Html => "html",
            ContentType::Pdf => "pdf",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "html" => Ok(ContentType::Html),
            "pdf" => Ok(ContentType::Pdf),
            "image" => Ok(ContentType::Image),
            _ => Err(DispatchError::UnsupportedContentType(s.to_string())),
        }
    }
}

fn default_content_type() -> String {
    ContentType::Text.as_str().to_string()
}

/// Options bag as received from a transport
///
/// `content_type` stays an untyped tag here so an unknown value can be
/// reported as a dispatch outcome instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintOptions {
    #[serde(default = "default_content_type", alias = "contentType")]
    pub content_type: String,
    #[serde(default, alias = "printerName")]
    pub printer: Option<String>,
    /// Keys the dispatcher does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            printer: None,
            extra: Map::new(),
        }
    }
}

impl PrintOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Self::default()
        }
    }

    pub fn with_printer(mut self, printer: impl Into<String>) -> Self {
        self.printer = Some(printer.into());
        self
    }
}

/// Validated print request
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRequest {
    pub content: String,
    pub content_type: ContentType,
    pub printer: String,
    pub options: Map<String, Value>,
}

impl PrintRequest {
    /// Validate `content` and `options`, falling back to `default_printer`
    pub fn parse(
        content: String,
        options: &PrintOptions,
        default_printer: Option<&str>,
    ) -> Result<Self, DispatchError> {
        let content_type: ContentType = options.content_type.parse()?;

        let printer = options
            .printer
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or(default_printer)
            .ok_or(DispatchError::MissingParameter("printer"))?
            .to_string();

        if content.is_empty() {
            return Err(DispatchError::MissingParameter("content"));
        }

        Ok(Self {
            content,
            content_type,
            printer,
            options: options.extra.clone(),
        })
    }
}

/// Machine-readable failure category carried by a [`PrintOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedContentType,
    MissingParameter,
    PrinterUnavailable,
    SubmissionFailed,
    RenderingFailed,
    DecodeFailed,
    ArtifactWrite,
    EnumerationFailed,
    WorkerFailed,
}

/// Result of one dispatch, returned to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
    pub printer: String,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Retained output file (decoded PDFs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl PrintOutcome {
    pub fn succeeded(printer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            printer: printer.into(),
            timestamp: Local::now(),
            error: None,
            artifact: None,
        }
    }

    pub fn failed(printer: impl Into<String>, error: &DispatchError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            printer: printer.into(),
            timestamp: Local::now(),
            error: Some(error.kind()),
            artifact: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        assert_eq!("text".parse::<ContentType>().unwrap(), ContentType::Text);
        assert_eq!("PDF".parse::<ContentType>().unwrap(), ContentType::Pdf);
        assert!(matches!(
            "fax".parse::<ContentType>(),
            Err(DispatchError::UnsupportedContentType(t)) if t == "fax"
        ));
    }

    #[test]
    fn test_options_default_to_text_and_keep_extra_keys() {
        let options: PrintOptions =
            serde_json::from_str(r#"{"printer":"Office","copies":2}"#).unwrap();
        assert_eq!(options.content_type, "text");
        assert_eq!(options.printer.as_deref(), Some("Office"));
        assert_eq!(options.extra.get("copies"), Some(&Value::from(2)));
    }

    #[test]
    fn test_parse_falls_back_to_default_printer() {
        let request =
            PrintRequest::parse("hi".to_string(), &PrintOptions::default(), Some("Office")).unwrap();
        assert_eq!(request.printer, "Office");
        assert_eq!(request.content_type, ContentType::Text);
    }

    #[test]
    fn test_parse_blank_printer_uses_default() {
        let options = PrintOptions::default().with_printer("  ");
        let request = PrintRequest::parse("hi".to_string(), &options, Some("Office")).unwrap();
        assert_eq!(request.printer, "Office");
    }

    #[test]
    fn test_parse_requires_printer_and_content() {
        assert!(matches!(
            PrintRequest::parse("hi".to_string(), &PrintOptions::default(), None),
            Err(DispatchError::MissingParameter("printer"))
        ));
        assert!(matches!(
            PrintRequest::parse(String::new(), &PrintOptions::default(), Some("Office")),
            Err(DispatchError::MissingParameter("content"))
        ));
    }

    #[test]
    fn test_failed_outcome_carries_kind() {
        let outcome = PrintOutcome::failed(
            "Office",
            &DispatchError::UnsupportedContentType("fax".into()),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::UnsupportedContentType));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "unsupported_content_type");
        assert!(json.get("artifact").is_none());
    }
}
