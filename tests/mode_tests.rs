//! Referenced vs inline output
//!
//! Covers the properties that tie the two output modes together: structural
//! equivalence after dereferencing, the cycle policy, determinism and
//! occurrence cardinality.

mod common;

use common::{convert_body, convert_sources, definition, dereference, schema};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use xsdtojson::{Error, ErrorKind, OutputMode};

/// An acyclic schema touching most constructs
const CATALOG: &str = r#"
    <xs:simpleType name="sku">
      <xs:restriction base="xs:string">
        <xs:pattern value="[0-9]{3}-[A-Z]{2}"/>
      </xs:restriction>
    </xs:simpleType>
    <xs:simpleType name="shortSku">
      <xs:restriction base="t:sku"><xs:maxLength value="6"/></xs:restriction>
    </xs:simpleType>
    <xs:simpleType name="skus"><xs:list itemType="t:sku"/></xs:simpleType>
    <xs:simpleType name="idOrName">
      <xs:union memberTypes="xs:int t:shortSku"/>
    </xs:simpleType>
    <xs:complexType name="money">
      <xs:simpleContent>
        <xs:extension base="xs:decimal">
          <xs:attribute name="currency" type="xs:string" default="EUR"/>
        </xs:extension>
      </xs:simpleContent>
    </xs:complexType>
    <xs:group name="pricing">
      <xs:sequence>
        <xs:element name="price" type="t:money"/>
        <xs:element name="discount" type="t:money" minOccurs="0" nillable="true"/>
      </xs:sequence>
    </xs:group>
    <xs:attributeGroup name="tracking">
      <xs:attribute name="created" type="xs:dateTime"/>
    </xs:attributeGroup>
    <xs:complexType name="product">
      <xs:annotation><xs:documentation>A sellable product.</xs:documentation></xs:annotation>
      <xs:sequence>
        <xs:element name="sku" type="t:shortSku"/>
        <xs:element name="related" type="t:skus" minOccurs="0"/>
        <xs:group ref="t:pricing"/>
        <xs:choice>
          <xs:element name="weight" type="xs:double"/>
          <xs:element name="volume" type="xs:double"/>
        </xs:choice>
      </xs:sequence>
      <xs:attributeGroup ref="t:tracking"/>
    </xs:complexType>
    <xs:complexType name="bundle">
      <xs:complexContent>
        <xs:extension base="t:product">
          <xs:sequence>
            <xs:element ref="t:part" maxOccurs="unbounded"/>
          </xs:sequence>
        </xs:extension>
      </xs:complexContent>
    </xs:complexType>
    <xs:element name="part" type="t:idOrName"/>
    <xs:element name="catalog">
      <xs:complexType>
        <xs:sequence>
          <xs:element name="product" type="t:product" maxOccurs="unbounded"/>
          <xs:element name="bundle" type="t:bundle" minOccurs="0" maxOccurs="5"/>
        </xs:sequence>
      </xs:complexType>
    </xs:element>"#;

#[test]
fn test_referenced_output_dereferences_to_inline_output() {
    let referenced = convert_body(CATALOG, OutputMode::Referenced).unwrap();
    let inline = convert_body(CATALOG, OutputMode::Inline).unwrap();

    assert!(inline.get("definitions").is_none());
    assert!(!referenced["definitions"].as_object().unwrap().is_empty());
    assert_eq!(dereference(&referenced), inline);
}

#[test]
fn test_shared_types_become_single_definitions() {
    let referenced = convert_body(CATALOG, OutputMode::Referenced).unwrap();
    let definitions = referenced["definitions"].as_object().unwrap();

    // Groups and attribute groups are merged, never defined
    assert!(!definitions.contains_key("pricing"));
    assert!(!definitions.contains_key("tracking"));
    for name in ["sku", "shortSku", "skus", "idOrName", "money", "product", "bundle", "part", "catalog"] {
        assert!(definitions.contains_key(name), "missing definition {}", name);
    }
    assert_eq!(
        definition(&referenced, "shortSku"),
        &json!({"allOf": [{"$ref": "#/definitions/sku"}], "maxLength": 6})
    );
    assert_eq!(
        definition(&referenced, "product")["properties"]["discount"],
        json!({"oneOf": [{"$ref": "#/definitions/money"}, {"type": "null"}]})
    );
}

#[test]
fn test_self_referencing_type() {
    let body = r#"
        <xs:complexType name="node">
          <xs:sequence>
            <xs:element name="value" type="xs:string"/>
            <xs:element name="child" type="t:node" minOccurs="0" maxOccurs="unbounded"/>
          </xs:sequence>
        </xs:complexType>
        <xs:element name="tree" type="t:node"/>"#;

    let referenced = convert_body(body, OutputMode::Referenced).unwrap();
    assert_eq!(
        definition(&referenced, "node"),
        &json!({
            "type": "object",
            "properties": {
                "value": {"type": "string"},
                "child": {"type": "array", "items": {"$ref": "#/definitions/node"}, "minItems": 0}
            },
            "required": ["value"]
        })
    );

    let err = convert_body(body, OutputMode::Inline).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicType);
    assert_eq!(err.symbol().map(|key| key.local_name.as_str()), Some("node"));
}

#[test]
fn test_mutually_referencing_types() {
    let body = r#"
        <xs:complexType name="a">
          <xs:sequence><xs:element name="b" type="t:b" minOccurs="0"/></xs:sequence>
        </xs:complexType>
        <xs:complexType name="b">
          <xs:sequence><xs:element name="a" type="t:a" minOccurs="0"/></xs:sequence>
        </xs:complexType>
        <xs:element name="start" type="t:a"/>"#;

    let referenced = convert_body(body, OutputMode::Referenced).unwrap();
    assert_eq!(
        definition(&referenced, "a")["properties"]["b"],
        json!({"$ref": "#/definitions/b"})
    );
    assert_eq!(
        definition(&referenced, "b")["properties"]["a"],
        json!({"$ref": "#/definitions/a"})
    );

    match convert_body(body, OutputMode::Inline).unwrap_err() {
        Error::CyclicType { path, .. } => {
            assert!(path.contains("{urn:t}a"), "{}", path);
            assert!(path.contains("{urn:t}b"), "{}", path);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_recursive_element_reference() {
    let body = r#"
        <xs:element name="folder">
          <xs:complexType>
            <xs:sequence>
              <xs:element ref="t:folder" minOccurs="0" maxOccurs="unbounded"/>
            </xs:sequence>
            <xs:attribute name="name" type="xs:string" use="required"/>
          </xs:complexType>
        </xs:element>"#;

    let referenced = convert_body(body, OutputMode::Referenced).unwrap();
    assert_eq!(
        definition(&referenced, "folder")["properties"]["folder"],
        json!({"type": "array", "items": {"$ref": "#/definitions/folder"}, "minItems": 0})
    );

    let err = convert_body(body, OutputMode::Inline).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicType);
}

#[test]
fn test_recursive_group_fails_in_both_modes() {
    let body = r#"
        <xs:group name="loop">
          <xs:sequence>
            <xs:element name="x" type="xs:string"/>
            <xs:group ref="t:loop"/>
          </xs:sequence>
        </xs:group>
        <xs:element name="root">
          <xs:complexType><xs:group ref="t:loop"/></xs:complexType>
        </xs:element>"#;

    for mode in [OutputMode::Referenced, OutputMode::Inline] {
        let err = convert_body(body, mode).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicType);
    }
}

#[test]
fn test_type_recursing_through_group() {
    let body = r#"
        <xs:group name="links">
          <xs:sequence>
            <xs:element name="next" type="t:node" minOccurs="0"/>
          </xs:sequence>
        </xs:group>
        <xs:complexType name="node">
          <xs:sequence>
            <xs:element name="label" type="xs:string"/>
            <xs:group ref="t:links"/>
          </xs:sequence>
        </xs:complexType>
        <xs:element name="chain">
          <xs:complexType><xs:group ref="t:links"/></xs:complexType>
        </xs:element>"#;

    let referenced = convert_body(body, OutputMode::Referenced).unwrap();
    assert_eq!(
        definition(&referenced, "chain"),
        &json!({"type": "object", "properties": {"next": {"$ref": "#/definitions/node"}}})
    );
    assert_eq!(
        definition(&referenced, "node"),
        &json!({
            "type": "object",
            "properties": {
                "label": {"type": "string"},
                "next": {"$ref": "#/definitions/node"}
            },
            "required": ["label"]
        })
    );

    let err = convert_body(body, OutputMode::Inline).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicType);
    assert_eq!(err.symbol().map(|key| key.local_name.as_str()), Some("node"));
}

#[test]
fn test_output_is_deterministic() {
    for mode in [OutputMode::Referenced, OutputMode::Inline] {
        let first = serde_json::to_string(&convert_body(CATALOG, mode).unwrap()).unwrap();
        let second = serde_json::to_string(&convert_body(CATALOG, mode).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_definition_names_do_not_depend_on_use_order() {
    let types = r#"
        <xs:simpleType name="x"><xs:restriction base="xs:string"/></xs:simpleType>
        <xs:complexType name="y"><xs:sequence><xs:element name="v" type="xs:int"/></xs:sequence></xs:complexType>"#;
    let forward = format!(
        r#"{}<xs:element name="root"><xs:complexType><xs:sequence>
             <xs:element name="a" type="t:x"/><xs:element name="b" type="t:y"/>
           </xs:sequence></xs:complexType></xs:element>"#,
        types
    );
    let backward = format!(
        r#"{}<xs:element name="root"><xs:complexType><xs:sequence>
             <xs:element name="b" type="t:y"/><xs:element name="a" type="t:x"/>
           </xs:sequence></xs:complexType></xs:element>"#,
        types
    );

    let forward = convert_body(&forward, OutputMode::Referenced).unwrap();
    let backward = convert_body(&backward, OutputMode::Referenced).unwrap();
    assert_eq!(forward["definitions"]["x"], backward["definitions"]["x"]);
    assert_eq!(forward["definitions"]["y"], backward["definitions"]["y"]);
}

fn occurs_attribute(max: Option<u64>) -> String {
    match max {
        Some(n) => n.to_string(),
        None => "unbounded".to_string(),
    }
}

proptest! {
    #[test]
    fn prop_occurrence_cardinality(min in 0u64..6, extra in 0u64..6, unbounded in any::<bool>()) {
        let max = if unbounded { None } else { Some(min + extra) };
        prop_assume!(max != Some(0));

        let body = format!(
            r#"<xs:element name="root"><xs:complexType><xs:sequence>
                 <xs:element name="item" type="xs:string" minOccurs="{}" maxOccurs="{}"/>
               </xs:sequence></xs:complexType></xs:element>"#,
            min,
            occurs_attribute(max)
        );
        let document = convert_body(&body, OutputMode::Inline).unwrap();
        let root = &document["properties"]["root"];
        let item = &root["properties"]["item"];

        if max == Some(1) {
            prop_assert_eq!(item, &json!({"type": "string"}));
        } else {
            prop_assert_eq!(&item["type"], &json!("array"));
            prop_assert_eq!(&item["minItems"], &json!(min));
            match max {
                Some(n) => prop_assert_eq!(&item["maxItems"], &json!(n)),
                None => prop_assert!(item.get("maxItems").is_none()),
            }
        }

        let required = root.get("required").cloned().unwrap_or(json!([]));
        prop_assert_eq!(required.as_array().unwrap().contains(&json!("item")), min >= 1);
    }

    #[test]
    fn prop_conversion_is_repeatable(names in prop::collection::btree_set("[a-z]{1,8}", 1..6)) {
        let elements: String = names
            .iter()
            .map(|name| format!(r#"<xs:element name="{}" type="t:shared"/>"#, name))
            .collect();
        let body = format!(
            r#"<xs:complexType name="shared"><xs:sequence><xs:element name="v" type="xs:int"/></xs:sequence></xs:complexType>{}"#,
            elements
        );
        let sources = [("main.xsd", schema(&body))];

        let first = convert_sources(&sources, OutputMode::Referenced).unwrap();
        let second = convert_sources(&sources, OutputMode::Referenced).unwrap();
        prop_assert_eq!(
            serde_json::to_string_pretty(&first).unwrap(),
            serde_json::to_string_pretty(&second).unwrap()
        );
        prop_assert_eq!(dereference(&first), convert_sources(&sources, OutputMode::Inline).unwrap());
    }
}
