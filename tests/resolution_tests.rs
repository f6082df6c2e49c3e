//! Multi-document schema sets: imports, includes, catalogs and search paths

mod common;

use std::fs;

use common::{convert_sources, fixtures_dir, plain_schema, schema, XS};
use pretty_assertions::assert_eq;
use serde_json::json;
use xsdtojson::catalog::XmlCatalog;
use xsdtojson::{
    convert, convert_file, ConversionOptions, Error, ErrorKind, FileReader, Location, OutputMode,
    ResolverOptions,
};

#[test]
fn test_purchase_order_fixture() {
    let path = fixtures_dir().join("purchase").join("order.xsd");
    let document = convert_file(&path, &ConversionOptions::default()).unwrap();

    assert_eq!(document.roots, vec!["order"]);
    assert_eq!(
        document.to_value(),
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "urn:example:order/order.json",
            "title": "Schema for order",
            "type": "object",
            "properties": {"order": {"$ref": "#/definitions/order"}},
            "required": ["order"],
            "definitions": {
                "order": {
                    "type": "object",
                    "description": "A purchase order.",
                    "properties": {
                        "shipTo": {"$ref": "#/definitions/address"},
                        "item": {
                            "type": "array",
                            "items": {"$ref": "#/definitions/item"},
                            "minItems": 1
                        },
                        "comment": {"type": "string"},
                        "orderDate": {"type": "string", "format": "date"}
                    },
                    "required": ["shipTo", "item", "orderDate"]
                },
                "address": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "street": {"type": "string"},
                        "zip": {"type": "string"},
                        "country": {"type": "string", "const": "US"}
                    },
                    "required": ["name", "street", "zip"]
                },
                "item": {
                    "type": "object",
                    "properties": {
                        "sku": {"$ref": "#/definitions/sku"},
                        "quantity": {"type": "integer", "minimum": 1}
                    },
                    "required": ["sku", "quantity"]
                },
                "sku": {"type": "string", "pattern": "\\d{3}-[A-Z]{2}"}
            }
        })
    );
}

#[test]
fn test_purchase_order_fixture_inline() {
    let path = fixtures_dir().join("purchase").join("order.xsd");
    let options = ConversionOptions::inline();
    let document = convert_file(&path, &options).unwrap().to_value();

    assert!(document.get("definitions").is_none());
    let item = &document["properties"]["order"]["properties"]["item"]["items"];
    assert_eq!(
        item["properties"]["sku"],
        json!({"type": "string", "pattern": "\\d{3}-[A-Z]{2}"})
    );
}

#[test]
fn test_unresolved_import() {
    let main = schema(r#"<xs:import namespace="urn:gone" schemaLocation="missing.xsd"/>"#);
    let err = convert_sources(&[("main.xsd", main)], OutputMode::Referenced).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnresolvedImport);
    match err {
        Error::UnresolvedImport {
            directive,
            target,
            ..
        } => {
            assert_eq!(directive, "import");
            assert_eq!(target, "missing.xsd");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_duplicate_symbol_across_included_files() {
    let main = schema(
        r#"<xs:include schemaLocation="one.xsd"/>
           <xs:include schemaLocation="two.xsd"/>"#,
    );
    let duplicate = schema(r#"<xs:complexType name="dup"/>"#);
    let err = convert_sources(
        &[
            ("main.xsd", main),
            ("one.xsd", duplicate.clone()),
            ("two.xsd", duplicate),
        ],
        OutputMode::Referenced,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateSymbol);
    assert_eq!(err.symbol().map(|key| key.local_name.as_str()), Some("dup"));
}

#[test]
fn test_xml_namespace_attribute_without_location() {
    let main = schema(
        r#"<xs:import namespace="http://www.w3.org/XML/1998/namespace"/>
           <xs:element name="title">
             <xs:complexType>
               <xs:simpleContent>
                 <xs:extension base="xs:string">
                   <xs:attribute ref="xml:lang"/>
                 </xs:extension>
               </xs:simpleContent>
             </xs:complexType>
           </xs:element>"#,
    );
    let document = convert_sources(&[("main.xsd", main)], OutputMode::Inline).unwrap();

    assert_eq!(
        document["properties"]["title"],
        json!({
            "type": "object",
            "properties": {
                "$": {"type": "string"},
                "lang": {
                    "oneOf": [{"type": "string"}, {"type": "string", "enum": [""]}],
                    "description": "Language of the element content, as a BCP 47 tag or the empty string."
                }
            },
            "required": ["$"]
        })
    );
}

#[test]
fn test_import_diamond_shares_one_definition() {
    let main = format!(
        r#"<xs:schema xmlns:xs="{}" xmlns:a="urn:a" xmlns:b="urn:b">
             <xs:import namespace="urn:a" schemaLocation="a.xsd"/>
             <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
             <xs:element name="pair">
               <xs:complexType>
                 <xs:sequence>
                   <xs:element name="left" type="a:left"/>
                   <xs:element name="right" type="b:right"/>
                 </xs:sequence>
               </xs:complexType>
             </xs:element>
           </xs:schema>"#,
        XS
    );
    let side = |namespace: &str, name: &str| {
        format!(
            r#"<xs:schema xmlns:xs="{}" xmlns:c="urn:c" targetNamespace="{}">
                 <xs:import namespace="urn:c" schemaLocation="c.xsd"/>
                 <xs:complexType name="{}">
                   <xs:sequence><xs:element name="code" type="c:code"/></xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
            XS, namespace, name
        )
    };
    let shared = format!(
        r#"<xs:schema xmlns:xs="{}" targetNamespace="urn:c">
             <xs:simpleType name="code">
               <xs:restriction base="xs:string"><xs:length value="2"/></xs:restriction>
             </xs:simpleType>
           </xs:schema>"#,
        XS
    );

    let document = convert_sources(
        &[
            ("main.xsd", main),
            ("a.xsd", side("urn:a", "left")),
            ("b.xsd", side("urn:b", "right")),
            ("c.xsd", shared),
        ],
        OutputMode::Referenced,
    )
    .unwrap();

    assert_eq!(
        document["definitions"]["code"],
        json!({"type": "string", "minLength": 2, "maxLength": 2})
    );
    assert_eq!(
        document["definitions"]["left"]["properties"]["code"],
        json!({"$ref": "#/definitions/code"})
    );
    assert_eq!(
        document["definitions"]["right"]["properties"]["code"],
        json!({"$ref": "#/definitions/code"})
    );
    assert_eq!(document["title"], json!("Schema for pair"));
    assert!(document.get("$id").is_none());
}

#[test]
fn test_catalog_maps_remote_location() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("local")).unwrap();
    fs::write(
        dir.path().join("catalog.xml"),
        r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
             <system systemId="http://example.com/xsd/types.xsd" uri="local/types.xsd"/>
           </catalog>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("local").join("types.xsd"),
        format!(
            r#"<xs:schema xmlns:xs="{}" targetNamespace="urn:types">
                 <xs:simpleType name="code">
                   <xs:restriction base="xs:token"><xs:maxLength value="4"/></xs:restriction>
                 </xs:simpleType>
               </xs:schema>"#,
            XS
        ),
    )
    .unwrap();
    let main = dir.path().join("main.xsd");
    fs::write(
        &main,
        format!(
            r#"<xs:schema xmlns:xs="{}" xmlns:ty="urn:types">
                 <xs:import namespace="urn:types" schemaLocation="http://example.com/xsd/types.xsd"/>
                 <xs:element name="code" type="ty:code"/>
               </xs:schema>"#,
            XS
        ),
    )
    .unwrap();

    let catalog =
        XmlCatalog::load(&Location::from(dir.path().join("catalog.xml")), &FileReader::new()).unwrap();
    let document = convert(
        &Location::from(main.as_path()),
        FileReader::new(),
        ResolverOptions::default().with_catalog(catalog),
        &ConversionOptions::inline(),
    )
    .unwrap();

    assert_eq!(
        document.to_value()["properties"]["code"],
        json!({"type": "string", "maxLength": 4})
    );
}

#[test]
fn test_search_path_finds_included_schema() {
    let schemas = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    fs::write(
        library.path().join("shared.xsd"),
        plain_schema(r#"<xs:simpleType name="flag"><xs:restriction base="xs:boolean"/></xs:simpleType>"#),
    )
    .unwrap();
    let main = schemas.path().join("main.xsd");
    fs::write(
        &main,
        plain_schema(
            r#"<xs:include schemaLocation="shared.xsd"/>
               <xs:element name="enabled" type="flag"/>"#,
        ),
    )
    .unwrap();

    let without = convert(
        &Location::from(main.as_path()),
        FileReader::new(),
        ResolverOptions::default(),
        &ConversionOptions::default(),
    )
    .unwrap_err();
    assert_eq!(without.kind(), ErrorKind::UnresolvedImport);

    let document = convert(
        &Location::from(main.as_path()),
        FileReader::new(),
        ResolverOptions::default().with_search_path(library.path()),
        &ConversionOptions::default(),
    )
    .unwrap();
    assert_eq!(document.to_value()["definitions"]["flag"], json!({"type": "boolean"}));
}

#[test]
fn test_chameleon_types_take_including_namespace() {
    let main = schema(
        r#"<xs:include schemaLocation="common.xsd"/>
           <xs:element name="size" type="t:size"/>"#,
    );
    let common = plain_schema(
        r#"<xs:simpleType name="size">
             <xs:restriction base="xs:int"><xs:minInclusive value="0"/></xs:restriction>
           </xs:simpleType>"#,
    );
    let document =
        convert_sources(&[("main.xsd", main), ("common.xsd", common)], OutputMode::Inline).unwrap();

    assert_eq!(
        document["properties"]["size"],
        json!({"type": "integer", "minimum": 0, "maximum": 2147483647})
    );
}
