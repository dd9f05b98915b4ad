//! Integration tests for `xsi:type` extension dispatch
//!
//! Each extensible family (`BaseID`, `Condition`, `Statement`,
//! `RoleDescriptor`) is decoded with and without a registered handler.

mod extensions;

use extensions::*;
use pretty_assertions::assert_eq;
use samlobjects::loaders::Loader;
use samlobjects::{
    BaseId, Condition, Error, ExtensionRegistry, Family, Handler, IdQualifiers, QName,
    RoleDescriptor, SamlElement, Statement,
};

fn statement_xml(xsi_type: &str, prefix_declaration: &str) -> String {
    format!(
        r#"<saml:Statement xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            {} xsi:type="{}">
            <ssp:Tier xmlns:ssp="urn:custom:ssp">gold</ssp:Tier>
        </saml:Statement>"#,
        prefix_declaration, xsi_type
    )
}

// ============================================================================
// Known types
// ============================================================================

#[test]
fn test_known_statement_roundtrip() {
    let registry = registry();
    let root = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));

    let statement = Statement::decode(&root, &registry).unwrap();
    let loyalty = statement.downcast_ref::<LoyaltyStatement>().unwrap();
    assert_eq!(loyalty.tier(), "gold");
    assert_eq!(statement.xsi_type().as_deref(), Some("ssp:LoyaltyStatement"));

    let encoded = statement.to_xml().unwrap();
    let reparsed = parse(&encoded.to_xml_string().unwrap());
    let again = Statement::decode(&reparsed, &registry).unwrap();
    assert!(again.to_xml().unwrap().xml_eq(&encoded));
}

#[test]
fn test_known_types_roundtrip_for_every_family() {
    let registry = registry();

    let id = BaseId::extension(EmployeeId::new(
        "e-1001",
        IdQualifiers::new(Some("urn:corp".to_string()), None),
    ));
    let encoded = id.to_xml().unwrap();
    let decoded = BaseId::decode(&parse(&encoded.to_xml_string().unwrap()), &registry).unwrap();
    assert_eq!(decoded.downcast_ref::<EmployeeId>().unwrap().number(), "e-1001");
    assert_eq!(decoded.name_qualifier(), Some("urn:corp"));
    assert!(decoded.to_xml().unwrap().xml_eq(&encoded));

    let condition = Condition::extension(RegionRestriction::new(&["NL", "BE"]));
    let encoded = condition.to_xml().unwrap();
    let decoded = Condition::decode(&parse(&encoded.to_xml_string().unwrap()), &registry).unwrap();
    assert_eq!(
        decoded.downcast_ref::<RegionRestriction>().unwrap().countries(),
        &["NL".to_string(), "BE".to_string()]
    );
    assert!(decoded.to_xml().unwrap().xml_eq(&encoded));

    let statement = Statement::extension(LoyaltyStatement::new("silver"));
    let encoded = statement.to_xml().unwrap();
    let decoded = Statement::decode(&parse(&encoded.to_xml_string().unwrap()), &registry).unwrap();
    assert_eq!(decoded.downcast_ref::<LoyaltyStatement>().unwrap().tier(), "silver");
    assert!(decoded.to_xml().unwrap().xml_eq(&encoded));
}

#[test]
fn test_extension_declares_type_prefix_locally() {
    let xml = Statement::extension(LoyaltyStatement::new("gold"))
        .to_xml()
        .unwrap()
        .to_xml_string()
        .unwrap();

    let start_tag = &xml[..xml.find('>').unwrap()];
    assert!(start_tag.contains(r#"xmlns:ssp="urn:custom:ssp""#));
    assert!(start_tag.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
    assert!(start_tag.contains(r#"xsi:type="ssp:LoyaltyStatement""#));
}

// ============================================================================
// Unknown types
// ============================================================================

#[test]
fn test_unknown_types_roundtrip_verbatim() {
    let registry = ExtensionRegistry::new();

    let statement = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));
    let decoded = Statement::decode(&statement, &registry).unwrap();
    assert!(decoded.as_unknown().is_some());
    assert!(decoded.to_xml().unwrap().xml_eq(&statement));

    let base_id = parse(
        r#"<saml:BaseID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:corp="urn:example:corp" xsi:type="corp:EmployeeID"
            SPNameQualifier="https://sp.example.org">e-7</saml:BaseID>"#,
    );
    let decoded = BaseId::decode(&base_id, &registry).unwrap();
    assert_eq!(decoded.sp_name_qualifier(), Some("https://sp.example.org"));
    assert!(decoded.to_xml().unwrap().xml_eq(&base_id));

    // Re-decoding the re-emitted element gives the same result
    let reparsed = parse(&decoded.to_xml().unwrap().to_xml_string().unwrap());
    let again = BaseId::decode(&reparsed, &registry).unwrap();
    assert_eq!(again.type_name(), decoded.type_name());
    assert!(again.to_xml().unwrap().xml_eq(&base_id));
}

#[test]
fn test_unknown_mixed_content_reserializes_exactly() {
    let statement = concat!(
        r#"<saml:Statement xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:x="urn:x" "#,
        r#"xsi:type="x:T">Hello <x:b>w</x:b> world<!--keep--></saml:Statement>"#,
    );
    let decoded = Statement::from_xml(&parse(statement)).unwrap();
    assert!(decoded.as_unknown().is_some());
    assert_eq!(decoded.to_xml().unwrap().to_xml_string().unwrap(), statement);

    let condition = concat!(
        r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:x="urn:x" "#,
        r#"xsi:type="x:C">  <x:a>1</x:a>tail<![CDATA[<b>]]></saml:Condition>"#,
    );
    let decoded = Condition::from_xml(&parse(condition)).unwrap();
    assert!(decoded.as_unknown().is_some());
    assert_eq!(decoded.to_xml().unwrap().to_xml_string().unwrap(), condition);
}

#[test]
fn test_unknown_role_descriptor_from_metadata() {
    let doc = Loader::new()
        .load_file(fixture("role_descriptor.xml"))
        .unwrap();
    let entity = doc.root().unwrap();
    let element = entity.child(0).unwrap();

    let descriptor = RoleDescriptor::decode(element, ExtensionRegistry::empty()).unwrap();
    let unknown = descriptor.as_unknown().unwrap();
    assert_eq!(unknown.xsi_type(), "fed:SecurityTokenServiceType");
    assert_eq!(
        unknown.type_name(),
        &QName::namespaced(FED_NAMESPACE, "SecurityTokenServiceType")
    );
    assert_eq!(unknown.attributes().id(), Some("_sts"));

    // The fed prefix is declared on the parent; the raw copy must stand alone
    let standalone = unknown.raw().to_xml_string().unwrap();
    assert!(standalone.contains(FED_NAMESPACE));
    let reparsed = parse(&standalone);
    assert!(reparsed.xml_eq(element));

    let again = RoleDescriptor::decode(&reparsed, ExtensionRegistry::empty()).unwrap();
    assert_eq!(again.type_name(), descriptor.type_name());
}

#[test]
fn test_known_role_descriptor_from_metadata() {
    let doc = Loader::new()
        .load_file(fixture("role_descriptor.xml"))
        .unwrap();
    let element = doc.root().unwrap().child(0).unwrap();

    let descriptor = RoleDescriptor::decode(element, &registry()).unwrap();
    let sts = descriptor.downcast_ref::<SecurityTokenService>().unwrap();
    assert_eq!(sts.endpoints(), &["https://sts.example.org/wsfed".to_string()]);
    assert_eq!(descriptor.attributes().cache_duration(), Some("PT6H"));
    assert!(descriptor.to_xml().unwrap().xml_eq(element));
}

// ============================================================================
// Namespace resolution
// ============================================================================

#[test]
fn test_resolution_on_element_and_ancestor_is_identical() {
    let local = parse(
        r#"<saml:Statement xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:ns1="urn:example:one" xsi:type="ns1:Foo"/>"#,
    );
    let wrapper = parse(
        r#"<outer xmlns:ns1="urn:example:one">
            <middle>
                <saml:Statement xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="ns1:Foo"/>
            </middle>
        </outer>"#,
    );
    let nested = wrapper.child(0).unwrap().child(0).unwrap();

    let expected = QName::namespaced("urn:example:one", "Foo");
    let from_local = Statement::from_xml(&local).unwrap();
    let from_ancestor = Statement::from_xml(nested).unwrap();
    assert_eq!(from_local.as_unknown().unwrap().type_name(), &expected);
    assert_eq!(from_ancestor.as_unknown().unwrap().type_name(), &expected);

    // The raw copy carries the inherited binding
    let standalone = from_ancestor.to_xml().unwrap().to_xml_string().unwrap();
    assert!(standalone.contains(r#"xmlns:ns1="urn:example:one""#));
}

#[test]
fn test_unresolvable_prefix_degrades_to_local_name() {
    let root = parse(
        r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="ns2:Foo"/>"#,
    );
    let condition = Condition::decode(&root, &registry()).unwrap();
    let unknown = condition.as_unknown().unwrap();
    assert_eq!(unknown.type_name(), &QName::local("Foo"));
    assert_eq!(unknown.xsi_type(), "ns2:Foo");
    assert!(condition.to_xml().unwrap().xml_eq(&root));
}

#[test]
fn test_same_type_under_different_prefixes() {
    let registry = registry();
    for (prefix, declaration) in [
        ("ssp", r#"xmlns:ssp="urn:custom:ssp""#),
        ("loyalty", r#"xmlns:loyalty="urn:custom:ssp""#),
    ] {
        let root = parse(&statement_xml(
            &format!("{}:LoyaltyStatement", prefix),
            declaration,
        ));
        let statement = Statement::decode(&root, &registry).unwrap();
        assert!(statement.downcast_ref::<LoyaltyStatement>().is_some());
    }
}

// ============================================================================
// Registry key shapes
// ============================================================================

#[test]
fn test_statement_lookup_falls_back_to_raw_type() {
    let registry = ExtensionRegistry::new().with_type(
        "ssp:LoyaltyStatement",
        Handler::statement(LoyaltyStatement::decode),
    );

    let matching = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));
    let statement = Statement::decode(&matching, &registry).unwrap();
    assert!(statement.downcast_ref::<LoyaltyStatement>().is_some());

    // Same resolved type, different lexical form: the raw key no longer matches
    let other_prefix = parse(&statement_xml(
        "loyalty:LoyaltyStatement",
        r#"xmlns:loyalty="urn:custom:ssp""#,
    ));
    let statement = Statement::decode(&other_prefix, &registry).unwrap();
    assert!(statement.as_unknown().is_some());
}

#[test]
fn test_base_id_lookup_falls_back_to_raw_type() {
    let registry =
        ExtensionRegistry::new().with_type("corp:EmployeeID", Handler::base_id(EmployeeId::decode));
    let root = parse(
        r#"<saml:BaseID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:corp="urn:example:corp" xsi:type="corp:EmployeeID">e-9</saml:BaseID>"#,
    );
    let id = BaseId::decode(&root, &registry).unwrap();
    assert_eq!(id.downcast_ref::<EmployeeId>().unwrap().number(), "e-9");
}

#[test]
fn test_condition_uses_pair_keys_only() {
    let root = parse(
        r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:geo="urn:example:geo" xsi:type="geo:RegionRestriction">
            <geo:Country>NL</geo:Country>
        </saml:Condition>"#,
    );

    let by_pair = ExtensionRegistry::new().with_element(
        Some(GEO_NAMESPACE),
        "RegionRestriction",
        Handler::condition(RegionRestriction::decode),
    );
    let condition = Condition::decode(&root, &by_pair).unwrap();
    assert!(condition.downcast_ref::<RegionRestriction>().is_some());

    let by_string = ExtensionRegistry::new().with_type(
        "urn:example:geo:RegionRestriction",
        Handler::condition(RegionRestriction::decode),
    );
    let condition = Condition::decode(&root, &by_string).unwrap();
    assert!(condition.as_unknown().is_some());
}

#[test]
fn test_statement_ignores_pair_keys() {
    let registry = ExtensionRegistry::new().with_element(
        Some(SSP_NAMESPACE),
        "LoyaltyStatement",
        Handler::statement(LoyaltyStatement::decode),
    );
    let root = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));
    assert!(Statement::decode(&root, &registry).unwrap().as_unknown().is_some());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_xsi_type_is_a_schema_violation() {
    let cases = [
        r#"<saml:BaseID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">x</saml:BaseID>"#,
        r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"/>"#,
        r#"<saml:Statement xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"/>"#,
        r#"<md:RoleDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" protocolSupportEnumeration="urn:x"/>"#,
    ];
    let registry = registry();

    let errors = [
        BaseId::decode(&parse(cases[0]), &registry).unwrap_err(),
        Condition::decode(&parse(cases[1]), &registry).unwrap_err(),
        Statement::decode(&parse(cases[2]), &registry).unwrap_err(),
        RoleDescriptor::decode(&parse(cases[3]), &registry).unwrap_err(),
    ];
    for error in errors {
        match error {
            Error::SchemaViolation(v) => assert!(v.message.contains("xsi:type")),
            other => panic!("expected a schema violation, got {:?}", other),
        }
    }
}

#[test]
fn test_wrong_element_is_rejected() {
    let assertion = parse(
        r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="saml:Foo"/>"#,
    );
    assert!(matches!(
        Condition::from_xml(&assertion),
        Err(Error::InvalidElement { .. })
    ));

    let wrong_namespace = parse(
        r#"<x:Condition xmlns:x="urn:not-saml"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="x:Foo"/>"#,
    );
    match Condition::from_xml(&wrong_namespace) {
        Err(Error::InvalidElement { expected, actual }) => {
            assert_eq!(expected, "{urn:oasis:names:tc:SAML:2.0:assertion}Condition");
            assert_eq!(actual, "{urn:not-saml}Condition");
        }
        other => panic!("expected an invalid element error, got {:?}", other),
    }

    let metadata = parse(
        r#"<md:RoleDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="md:Foo"
            protocolSupportEnumeration="urn:x"/>"#,
    );
    assert!(matches!(
        BaseId::from_xml(&metadata),
        Err(Error::InvalidElement { .. })
    ));
}

#[test]
fn test_handler_of_wrong_family_is_a_classification_error() {
    let registry = ExtensionRegistry::new().with_element(
        Some(GEO_NAMESPACE),
        "RegionRestriction",
        Handler::statement(LoyaltyStatement::decode),
    );
    let root = parse(
        r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:geo="urn:example:geo" xsi:type="geo:RegionRestriction"/>"#,
    );

    match Condition::decode(&root, &registry) {
        Err(Error::Classification {
            type_name,
            expected,
            actual,
        }) => {
            assert_eq!(type_name, "urn:example:geo:RegionRestriction");
            assert_eq!(expected, Family::Condition);
            assert_eq!(actual, Family::Statement);
        }
        other => panic!("expected a classification error, got {:?}", other),
    }

    let registry = ExtensionRegistry::new().with_type(
        "urn:example:corp:EmployeeID",
        Handler::condition(RegionRestriction::decode),
    );
    let root = parse(
        r#"<saml:BaseID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:corp="urn:example:corp" xsi:type="corp:EmployeeID">e-1</saml:BaseID>"#,
    );
    assert!(matches!(
        BaseId::decode(&root, &registry),
        Err(Error::Classification { .. })
    ));
}

#[test]
fn test_handler_errors_propagate() {
    let root = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));
    let mut empty_tier = root.clone();
    empty_tier.clear_children();

    assert!(matches!(
        Statement::decode(&empty_tier, &registry()),
        Err(Error::MissingElement(_))
    ));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_registry_is_shared_across_threads() {
    let registry = registry();
    let root = parse(&statement_xml(
        "ssp:LoyaltyStatement",
        r#"xmlns:ssp="urn:custom:ssp""#,
    ));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| Statement::decode(&root, &registry).map(|s| s.is_builtin())))
            .collect();
        for handle in handles {
            assert!(!handle.join().unwrap().unwrap());
        }
    });
}
