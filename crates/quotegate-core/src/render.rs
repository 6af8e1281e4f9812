//! XML and JSON rendering of stock results and error payloads.
//!
//! Both formats carry the same fields. XML writes missing numbers as `N/A`,
//! JSON writes them as `null`.

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{NormalizedRecord, StockResult};

const MISSING: &str = "N/A";

/// Output format chosen by content negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Xml,
    Json,
}

impl ResponseFormat {
    /// JSON when the `Accept` header mentions `application/json`, XML otherwise.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.to_ascii_lowercase().contains("application/json") => Self::Json,
            _ => Self::Xml,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("xml rendering failed: {0}")]
    Xml(String),
    #[error("json rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct StockPayload<'a> {
    symbol: &'a str,
    current_price: Option<f64>,
    source: &'a str,
    interval: &'a str,
    records_returned: usize,
    history: &'a [NormalizedRecord],
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    message: &'a str,
}

/// Renders a successful result in the requested format.
pub fn render_result(result: &StockResult, format: ResponseFormat) -> Result<String, RenderError> {
    match format {
        ResponseFormat::Json => {
            let payload = StockPayload {
                symbol: result.symbol.as_str(),
                current_price: result.current_price,
                source: &result.source,
                interval: result.interval.as_str(),
                records_returned: result.records_returned(),
                history: &result.records,
            };
            Ok(serde_json::to_string(&payload)?)
        }
        ResponseFormat::Xml => render_result_xml(result),
    }
}

/// Renders a one-field `{message}` error payload. Never fails.
pub fn render_error(message: &str, format: ResponseFormat) -> String {
    let rendered = match format {
        ResponseFormat::Json => {
            serde_json::to_string(&ErrorPayload { message }).map_err(RenderError::from)
        }
        ResponseFormat::Xml => render_error_xml(message),
    };

    rendered.unwrap_or_else(|error| {
        tracing::error!(%error, "error payload rendering failed");
        match format {
            ResponseFormat::Json => String::from(r#"{"message":"internal error"}"#),
            ResponseFormat::Xml => {
                String::from("<error><message>internal error</message></error>")
            }
        }
    })
}

/// Formats a price the way the upstream service always has. Integral values
/// keep a trailing `.0`; magnitudes below `1e-4` or from `1e16` up use a
/// signed two-digit exponent (`1e+16`, `1e-05`).
pub fn format_price(value: f64) -> String {
    if value.is_nan() {
        return String::from("nan");
    }
    if value.is_infinite() {
        return String::from(if value < 0.0 { "-inf" } else { "inf" });
    }
    if value == 0.0 {
        return String::from(if value.is_sign_negative() { "-0.0" } else { "0.0" });
    }

    let scientific = format!("{value:e}");
    let parsed = scientific
        .split_once('e')
        .and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?)));

    match parsed {
        Some((mantissa, exponent)) if !(-4..16).contains(&exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        _ => {
            let plain = value.to_string();
            if plain.contains('.') {
                plain
            } else {
                format!("{plain}.0")
            }
        }
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| String::from(MISSING), format_price)
}

fn render_result_xml(result: &StockResult) -> Result<String, RenderError> {
    let mut writer = xml_writer()?;

    start(&mut writer, "stock")?;
    text_element(&mut writer, "symbol", result.symbol.as_str())?;
    text_element(&mut writer, "current_price", &format_optional(result.current_price))?;
    text_element(&mut writer, "source", &result.source)?;
    text_element(&mut writer, "interval", result.interval.as_str())?;
    text_element(
        &mut writer,
        "records_returned",
        &result.records_returned().to_string(),
    )?;

    start(&mut writer, "history")?;
    for record in &result.records {
        start(&mut writer, "record")?;
        text_element(&mut writer, "date", &record.date)?;
        text_element(&mut writer, "open", &format_optional(record.open))?;
        text_element(&mut writer, "close", &format_optional(record.close))?;
        end(&mut writer, "record")?;
    }
    end(&mut writer, "history")?;
    end(&mut writer, "stock")?;

    finish(writer)
}

fn render_error_xml(message: &str) -> Result<String, RenderError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "error")?;
    text_element(&mut writer, "message", message)?;
    end(&mut writer, "error")?;
    finish(writer)
}

fn xml_writer() -> Result<Writer<Vec<u8>>, RenderError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;
    Ok(writer)
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), RenderError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), RenderError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), RenderError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(writer, name)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, RenderError> {
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn xml_error(error: impl Display) -> RenderError {
    RenderError::Xml(error.to_string())
}
