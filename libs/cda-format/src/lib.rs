//! CCD document tree → XML serialization.
//!
//! Renders a [`ClinicalDocument`] to its CDA R2 wire form with one small
//! writer rule per document-tree shape. The generic writer escapes every
//! text node, including the HTML table markup inside section narratives, so
//! [`generate`] runs the serialized artifact through an entity-unescape
//! pass afterwards. The unescape pass deliberately covers the WHOLE
//! document rather than just narrative regions: no other part of a CCD
//! legitimately contains escaped markup characters as data, and the global
//! pass reproduces the established output exactly.

use cedra_models::{
    AddressElement, Author, ClinicalDocument, ClinicalSection, CodedValue, ContactPoint,
    Custodian, DocumentHeader, EncounterActivity, EncountersSection, InstanceIdentifier,
    PerformerEntity, PersonName, PlaceholderSection, RecordTarget, ServiceEvent,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

const CDA_NS: &str = "urn:hl7-org:v3";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("entity unescape error: {0}")]
    Unescape(#[from] quick_xml::escape::EscapeError),
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serialize a document tree to the final XML artifact: the escaped wire
/// form of [`to_xml`] with all XML entities unescaped again, restoring the
/// narrative HTML.
pub fn generate(document: &ClinicalDocument) -> Result<String, FormatError> {
    let xml = to_xml(document)?;
    unescape_entities(&xml)
}

/// Serialize a document tree to XML. Text content, including narrative
/// HTML, is entity-escaped by the writer at this stage.
pub fn to_xml(document: &ClinicalDocument) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("ClinicalDocument");
    root.push_attribute(("xmlns", CDA_NS));
    writer.write_event(Event::Start(root))?;

    write_header(&mut writer, &document.header)?;
    write_record_target(&mut writer, &document.record_target)?;
    write_author(&mut writer, &document.author)?;
    write_custodian(&mut writer, &document.custodian)?;
    write_documentation_of(&mut writer, &document.service_event)?;
    write_body(&mut writer, &document.sections)?;

    writer.write_event(Event::End(BytesEnd::new("ClinicalDocument")))?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Reverse XML entity escaping (`&lt;` `&gt;` `&amp;` `&quot;` `&apos;`)
/// across an entire serialized document.
pub fn unescape_entities(xml: &str) -> Result<String, FormatError> {
    Ok(quick_xml::escape::unescape(xml)?.into_owned())
}

fn write_header(writer: &mut XmlWriter, header: &DocumentHeader) -> Result<(), FormatError> {
    write_identifier(writer, "typeId", &header.type_id)?;
    for template_id in &header.template_ids {
        write_identifier(writer, "templateId", template_id)?;
    }
    write_identifier(writer, "id", &header.id)?;
    write_coded_value(writer, "code", &header.code)?;
    write_text_element(writer, "title", &header.title)?;
    write_timestamp(writer, "effectiveTime", &header.effective_time)?;
    write_coded_value(writer, "confidentialityCode", &header.confidentiality)?;

    let mut language = BytesStart::new("languageCode");
    language.push_attribute(("code", header.language_code.as_str()));
    writer.write_event(Event::Empty(language))?;
    Ok(())
}

fn write_record_target(writer: &mut XmlWriter, target: &RecordTarget) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("recordTarget")))?;
    writer.write_event(Event::Start(BytesStart::new("patientRole")))?;

    write_identifier(writer, "id", &target.id)?;
    write_address(writer, &target.address)?;
    for telecom in &target.telecoms {
        write_telecom(writer, telecom)?;
    }

    writer.write_event(Event::Start(BytesStart::new("patient")))?;
    write_person_name(writer, &target.name)?;
    write_coded_value(writer, "administrativeGenderCode", &target.gender)?;
    write_timestamp(writer, "birthTime", &target.birth_time)?;
    write_coded_value(writer, "raceCode", &target.race)?;
    write_coded_value(writer, "ethnicGroupCode", &target.ethnicity)?;
    writer.write_event(Event::End(BytesEnd::new("patient")))?;

    writer.write_event(Event::End(BytesEnd::new("patientRole")))?;
    writer.write_event(Event::End(BytesEnd::new("recordTarget")))?;
    Ok(())
}

fn write_author(writer: &mut XmlWriter, author: &Author) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("author")))?;
    write_timestamp(writer, "time", &author.time)?;

    writer.write_event(Event::Start(BytesStart::new("assignedAuthor")))?;
    for id in &author.ids {
        write_identifier(writer, "id", id)?;
    }
    write_coded_value(writer, "code", &author.code)?;
    write_address(writer, &author.address)?;
    for telecom in &author.telecoms {
        write_telecom(writer, telecom)?;
    }

    writer.write_event(Event::Start(BytesStart::new("representedOrganization")))?;
    write_text_element(writer, "name", &author.organization.name)?;
    write_address(writer, &author.organization.address)?;
    writer.write_event(Event::End(BytesEnd::new("representedOrganization")))?;

    writer.write_event(Event::End(BytesEnd::new("assignedAuthor")))?;
    writer.write_event(Event::End(BytesEnd::new("author")))?;
    Ok(())
}

fn write_custodian(writer: &mut XmlWriter, custodian: &Custodian) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("custodian")))?;
    writer.write_event(Event::Start(BytesStart::new("assignedCustodian")))?;
    writer.write_event(Event::Start(BytesStart::new(
        "representedCustodianOrganization",
    )))?;

    write_identifier(writer, "id", &custodian.id)?;
    write_text_element(writer, "name", &custodian.name)?;
    write_telecom(writer, &custodian.telecom)?;
    write_address(writer, &custodian.address)?;

    writer.write_event(Event::End(BytesEnd::new(
        "representedCustodianOrganization",
    )))?;
    writer.write_event(Event::End(BytesEnd::new("assignedCustodian")))?;
    writer.write_event(Event::End(BytesEnd::new("custodian")))?;
    Ok(())
}

fn write_documentation_of(
    writer: &mut XmlWriter,
    service_event: &ServiceEvent,
) -> Result<(), FormatError> {
    let mut documentation_of = BytesStart::new("documentationOf");
    documentation_of.push_attribute(("typeCode", "DOC"));
    writer.write_event(Event::Start(documentation_of))?;

    let mut event = BytesStart::new("serviceEvent");
    event.push_attribute(("classCode", "PCPR"));
    writer.write_event(Event::Start(event))?;

    writer.write_event(Event::Start(BytesStart::new("effectiveTime")))?;
    write_timestamp(writer, "low", &service_event.low)?;
    write_timestamp(writer, "high", &service_event.high)?;
    writer.write_event(Event::End(BytesEnd::new("effectiveTime")))?;

    writer.write_event(Event::End(BytesEnd::new("serviceEvent")))?;
    writer.write_event(Event::End(BytesEnd::new("documentationOf")))?;
    Ok(())
}

fn write_body(writer: &mut XmlWriter, sections: &[ClinicalSection]) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("component")))?;
    writer.write_event(Event::Start(BytesStart::new("structuredBody")))?;

    for section in sections {
        writer.write_event(Event::Start(BytesStart::new("component")))?;
        match section {
            ClinicalSection::Placeholder(placeholder) => {
                write_placeholder_section(writer, placeholder)?
            }
            ClinicalSection::Encounters(encounters) => {
                write_encounters_section(writer, encounters)?
            }
        }
        writer.write_event(Event::End(BytesEnd::new("component")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("structuredBody")))?;
    writer.write_event(Event::End(BytesEnd::new("component")))?;
    Ok(())
}

fn write_placeholder_section(
    writer: &mut XmlWriter,
    section: &PlaceholderSection,
) -> Result<(), FormatError> {
    let mut start = BytesStart::new("section");
    if section.no_information {
        start.push_attribute(("nullFlavor", "NI"));
    }
    writer.write_event(Event::Start(start))?;

    write_coded_value(writer, "code", &section.code)?;
    write_text_element(writer, "title", &section.title)?;
    write_text_element(writer, "text", &section.narrative)?;

    writer.write_event(Event::End(BytesEnd::new("section")))?;
    Ok(())
}

fn write_encounters_section(
    writer: &mut XmlWriter,
    section: &EncountersSection,
) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("section")))?;

    write_coded_value(writer, "code", &section.code)?;
    write_text_element(writer, "title", &section.title)?;
    write_text_element(writer, "text", &section.narrative)?;
    for activity in &section.activities {
        write_encounter_activity(writer, activity)?;
    }

    writer.write_event(Event::End(BytesEnd::new("section")))?;
    Ok(())
}

fn write_encounter_activity(
    writer: &mut XmlWriter,
    activity: &EncounterActivity,
) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("entry")))?;

    let mut encounter = BytesStart::new("encounter");
    encounter.push_attribute(("classCode", "ENC"));
    encounter.push_attribute(("moodCode", "EVN"));
    writer.write_event(Event::Start(encounter))?;

    write_identifier(writer, "id", &activity.id)?;
    write_coded_value(writer, "code", &activity.code)?;
    write_timestamp(writer, "effectiveTime", &activity.effective_time)?;
    write_performer(writer, &activity.performer)?;

    writer.write_event(Event::End(BytesEnd::new("encounter")))?;
    writer.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

fn write_performer(writer: &mut XmlWriter, performer: &PerformerEntity) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("performer")))?;
    writer.write_event(Event::Start(BytesStart::new("assignedEntity")))?;

    write_identifier(writer, "id", &performer.id)?;
    write_coded_value(writer, "code", &performer.code)?;
    write_address(writer, &performer.address)?;

    writer.write_event(Event::Start(BytesStart::new("assignedPerson")))?;
    write_person_name(writer, &performer.name)?;
    writer.write_event(Event::End(BytesEnd::new("assignedPerson")))?;

    writer.write_event(Event::End(BytesEnd::new("assignedEntity")))?;
    writer.write_event(Event::End(BytesEnd::new("performer")))?;
    Ok(())
}

fn write_identifier(
    writer: &mut XmlWriter,
    name: &str,
    identifier: &InstanceIdentifier,
) -> Result<(), FormatError> {
    let mut elem = BytesStart::new(name);
    if let Some(root) = &identifier.root {
        elem.push_attribute(("root", root.as_str()));
    }
    if let Some(extension) = &identifier.extension {
        elem.push_attribute(("extension", extension.as_str()));
    }
    if let Some(flavor) = identifier.null_flavor {
        elem.push_attribute(("nullFlavor", flavor.as_str()));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_coded_value(
    writer: &mut XmlWriter,
    name: &str,
    coded: &CodedValue,
) -> Result<(), FormatError> {
    let mut elem = BytesStart::new(name);
    if let Some(code) = &coded.code {
        elem.push_attribute(("code", code.as_str()));
    }
    if let Some(system) = &coded.code_system {
        elem.push_attribute(("codeSystem", system.as_str()));
    }
    if let Some(system_name) = &coded.code_system_name {
        elem.push_attribute(("codeSystemName", system_name.as_str()));
    }
    if let Some(display) = &coded.display_name {
        elem.push_attribute(("displayName", display.as_str()));
    }
    if let Some(flavor) = coded.null_flavor {
        elem.push_attribute(("nullFlavor", flavor.as_str()));
    }

    // A narrative anchor turns the element from an empty tag into one
    // wrapping an originalText reference.
    match &coded.original_text_reference {
        Some(anchor) => {
            writer.write_event(Event::Start(elem))?;
            writer.write_event(Event::Start(BytesStart::new("originalText")))?;
            let mut reference = BytesStart::new("reference");
            reference.push_attribute(("value", anchor.as_str()));
            writer.write_event(Event::Empty(reference))?;
            writer.write_event(Event::End(BytesEnd::new("originalText")))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        None => writer.write_event(Event::Empty(elem))?,
    }
    Ok(())
}

fn write_address(writer: &mut XmlWriter, address: &AddressElement) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("addr")))?;
    if let Some(country) = &address.country {
        write_text_element(writer, "country", country)?;
    }
    if let Some(state) = &address.state {
        write_text_element(writer, "state", state)?;
    }
    if let Some(city) = &address.city {
        write_text_element(writer, "city", city)?;
    }
    if let Some(postal_code) = &address.postal_code {
        write_text_element(writer, "postalCode", postal_code)?;
    }
    for line in &address.street_lines {
        write_text_element(writer, "streetAddressLine", line)?;
    }
    writer.write_event(Event::End(BytesEnd::new("addr")))?;
    Ok(())
}

fn write_telecom(writer: &mut XmlWriter, telecom: &ContactPoint) -> Result<(), FormatError> {
    let mut elem = BytesStart::new("telecom");
    elem.push_attribute(("use", telecom.use_.as_str()));
    elem.push_attribute(("value", telecom.value.as_str()));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_person_name(writer: &mut XmlWriter, name: &PersonName) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new("name")))?;
    write_text_element(writer, "family", &name.family)?;
    write_text_element(writer, "given", &name.given)?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;
    Ok(())
}

fn write_timestamp(writer: &mut XmlWriter, name: &str, value: &str) -> Result<(), FormatError> {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("value", value));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
