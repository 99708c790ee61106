#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! XML adapter that renders emitted records as `<unload>` fixture documents.
//!
//! Every record becomes one element named after its [`RecordKind`] carrying
//! `action="INSERT_OR_UPDATE"`. Fields become child elements in record order;
//! reference fields add a `display_value` attribute and empty fields render
//! as self-closing elements.

use std::io::{Cursor, Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use samgen_core::{EmissionClock, FieldValue, Record, RecordKind};
use thiserror::Error;

/// Root element of every fixture document.
pub const ROOT_ELEMENT: &str = "unload";
/// Attribute carrying the capture timestamp on the root element.
pub const UNLOAD_DATE_ATTRIBUTE: &str = "unload_date";
/// Attribute carrying the display label of reference fields.
pub const DISPLAY_VALUE_ATTRIBUTE: &str = "display_value";
/// Import action stamped on every record element.
pub const ACTION: &str = "INSERT_OR_UPDATE";

/// Element name used for records of the provided kind.
#[must_use]
pub const fn element_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Usage => "samp_eng_app_concurrent_usage",
        RecordKind::Denial => "samp_eng_app_denial",
        RecordKind::License => "samp_eng_app_license",
    }
}

/// Failure while producing a fixture document.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The underlying writer rejected an event.
    #[error("failed to write xml: {0}")]
    Write(String),
    /// The rendered document was not valid UTF-8.
    #[error("rendered xml is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders an indented `<unload>` document into a string.
pub fn render_unload(records: &[Record], clock: &EmissionClock) -> Result<String, XmlError> {
    let mut buffer = Cursor::new(Vec::new());
    write_unload(&mut buffer, records, clock)?;
    Ok(String::from_utf8(buffer.into_inner())?)
}

/// Streams an indented `<unload>` document into `sink`.
pub fn write_unload<W: Write>(
    sink: W,
    records: &[Record],
    clock: &EmissionClock,
) -> Result<(), XmlError> {
    let mut writer = Writer::new_with_indent(sink, b' ', 2);
    let stamp = clock.timestamp();

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    emit(
        &mut writer,
        Event::Start(
            BytesStart::new(ROOT_ELEMENT).with_attributes([(UNLOAD_DATE_ATTRIBUTE, stamp.as_str())]),
        ),
    )?;
    for record in records {
        write_record(&mut writer, record)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))
}

fn write_record<W: Write>(writer: &mut Writer<W>, record: &Record) -> Result<(), XmlError> {
    let name = element_name(record.kind());
    emit(
        writer,
        Event::Start(BytesStart::new(name).with_attributes([("action", ACTION)])),
    )?;

    for field in record.fields() {
        match field.value() {
            FieldValue::Text(text) => {
                emit(writer, Event::Start(BytesStart::new(field.name())))?;
                emit(writer, Event::Text(BytesText::new(text)))?;
                emit(writer, Event::End(BytesEnd::new(field.name())))?;
            }
            FieldValue::Reference { display, sys_id } => {
                let start = BytesStart::new(field.name())
                    .with_attributes([(DISPLAY_VALUE_ATTRIBUTE, display.as_str())]);
                emit(writer, Event::Start(start))?;
                emit(writer, Event::Text(BytesText::new(sys_id)))?;
                emit(writer, Event::End(BytesEnd::new(field.name())))?;
            }
            FieldValue::Empty => {
                emit(writer, Event::Empty(BytesStart::new(field.name())))?;
            }
        }
    }

    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|error| XmlError::Write(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn clock() -> EmissionClock {
        EmissionClock::new(
            NaiveDate::from_ymd_opt(2024, 3, 4)
                .expect("date")
                .and_time(NaiveTime::from_hms_opt(5, 6, 7).expect("time")),
        )
    }

    #[test]
    fn empty_document_has_stamped_root() {
        let xml = render_unload(&[], &clock()).expect("render");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<unload unload_date=\"2024-03-04 05:06:07\">"));
        assert!(xml.trim_end().ends_with("</unload>"));
    }

    #[test]
    fn fields_render_in_order_with_reference_attributes() {
        let record = Record::new(RecordKind::Denial)
            .with("additional_key", FieldValue::Empty)
            .with("computer", FieldValue::reference("alice-pc", "c-1"))
            .with("denial_id", FieldValue::text("Denial 6"));
        let xml = render_unload(&[record], &clock()).expect("render");

        let open = xml
            .find("<samp_eng_app_denial action=\"INSERT_OR_UPDATE\">")
            .expect("record element");
        let empty = xml.find("<additional_key/>").expect("empty field");
        let reference = xml
            .find("<computer display_value=\"alice-pc\">c-1</computer>")
            .expect("reference field");
        let text = xml.find("<denial_id>Denial 6</denial_id>").expect("text field");
        assert!(open < empty && empty < reference && reference < text);
        assert!(xml.contains("</samp_eng_app_denial>"));
    }

    #[test]
    fn text_is_escaped() {
        let record = Record::new(RecordKind::License)
            .with("product", FieldValue::text("R&D <Suite>"))
            .with("norm_product", FieldValue::reference("A \"B\"", "np"));
        let xml = render_unload(&[record], &clock()).expect("render");
        assert!(xml.contains("<product>R&amp;D &lt;Suite&gt;</product>"));
        assert!(xml.contains("display_value=\"A &quot;B&quot;\""));
    }

    #[test]
    fn element_names_follow_record_kind() {
        assert_eq!(element_name(RecordKind::Usage), "samp_eng_app_concurrent_usage");
        assert_eq!(element_name(RecordKind::License), "samp_eng_app_license");
    }
}
