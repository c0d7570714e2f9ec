//! XML (de)serialization helpers for the Nexus wire format

use crate::error::{CliError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Render a request document with an XML declaration
pub(crate) fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let body =
        quick_xml::se::to_string(value).map_err(|e| CliError::Serialization(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}{body}"))
}

/// Render a document without the declaration; used for canonical-form
/// comparison where only the element tree matters
pub(crate) fn to_xml_fragment<T: Serialize>(value: &T) -> Result<String> {
    quick_xml::se::to_string(value).map_err(|e| CliError::Serialization(e.to_string()))
}

/// Parse a server response document
pub(crate) fn from_xml<T: DeserializeOwned>(text: &str) -> Result<T> {
    quick_xml::de::from_str(text).map_err(|e| CliError::InvalidResponse(e.to_string()))
}
