//! Command-line interface for samlobjects

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use samlobjects::limits::Limits;
#[cfg(feature = "cli")]
use samlobjects::loaders::Loader;
#[cfg(feature = "cli")]
use samlobjects::{
    Assertion, BaseId, Condition, Conditions, Element, ExtensionRegistry, Identifier,
    RoleDescriptor, SamlElement, Statement, SAML_ASSERTION_NAMESPACE, SAML_METADATA_NAMESPACE,
};
#[cfg(feature = "cli")]
use serde_json::{json, Value};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "samlobjects")]
#[command(author, version, about = "Decode and re-encode SAML 2.0 documents", long_about = None)]
struct Cli {
    /// Use strict parser limits
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a document and print a JSON summary
    Decode {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Decode a document and print it re-encoded
    Roundtrip {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// A decoded root element
#[cfg(feature = "cli")]
enum Decoded {
    Assertion(Assertion),
    Conditions(Conditions),
    Condition(Condition),
    Statement(Statement),
    BaseId(BaseId),
    RoleDescriptor(RoleDescriptor),
}

#[cfg(feature = "cli")]
impl Decoded {
    fn decode(root: &Element, registry: &ExtensionRegistry) -> samlobjects::Result<Self> {
        let decoded = match (root.namespace(), root.local_name()) {
            (Some(SAML_ASSERTION_NAMESPACE), "Assertion") => {
                Decoded::Assertion(Assertion::decode(root, registry)?)
            }
            (Some(SAML_ASSERTION_NAMESPACE), "Conditions") => {
                Decoded::Conditions(Conditions::decode(root, registry)?)
            }
            (Some(SAML_ASSERTION_NAMESPACE), "BaseID") => {
                Decoded::BaseId(BaseId::decode(root, registry)?)
            }
            (Some(SAML_ASSERTION_NAMESPACE), name) if name.ends_with("Statement") => {
                Decoded::Statement(Statement::decode(root, registry)?)
            }
            (Some(SAML_ASSERTION_NAMESPACE), _) => {
                Decoded::Condition(Condition::decode(root, registry)?)
            }
            (Some(SAML_METADATA_NAMESPACE), _) => {
                Decoded::RoleDescriptor(RoleDescriptor::decode(root, registry)?)
            }
            _ => {
                return Err(samlobjects::Error::invalid_element(
                    "a SAML assertion or metadata element",
                    root.qname.to_string(),
                ))
            }
        };
        Ok(decoded)
    }

    fn to_xml(&self) -> samlobjects::Result<Element> {
        match self {
            Decoded::Assertion(v) => v.to_xml(),
            Decoded::Conditions(v) => v.to_xml(),
            Decoded::Condition(v) => v.to_xml(),
            Decoded::Statement(v) => v.to_xml(),
            Decoded::BaseId(v) => v.to_xml(),
            Decoded::RoleDescriptor(v) => v.to_xml(),
        }
    }

    fn summary(&self) -> Value {
        match self {
            Decoded::Assertion(a) => json!({
                "element": "Assertion",
                "id": a.id(),
                "issueInstant": a.issue_instant().to_rfc3339(),
                "issuer": a.issuer().value(),
                "signed": a.signature().is_some(),
                "subject": a.subject().and_then(|s| s.identifier()).map(identifier_summary),
                "conditions": a.conditions().map(conditions_summary),
                "statements": a.statements().iter().map(statement_summary).collect::<Vec<_>>(),
            }),
            Decoded::Conditions(c) => conditions_summary(c),
            Decoded::Condition(c) => condition_summary(c),
            Decoded::Statement(s) => statement_summary(s),
            Decoded::BaseId(id) => base_id_summary(id),
            Decoded::RoleDescriptor(rd) => json!({
                "element": "RoleDescriptor",
                "xsiType": rd.xsi_type(),
                "typeName": rd.type_name().to_string(),
                "known": rd.as_unknown().is_none(),
                "id": rd.attributes().id(),
                "protocols": rd.attributes().protocol_support_enumeration(),
            }),
        }
    }
}

#[cfg(feature = "cli")]
fn base_id_summary(id: &BaseId) -> Value {
    json!({
        "element": "BaseID",
        "xsiType": id.xsi_type(),
        "typeName": id.type_name().to_string(),
        "known": id.as_unknown().is_none(),
        "nameQualifier": id.name_qualifier(),
    })
}

#[cfg(feature = "cli")]
fn identifier_summary(identifier: &Identifier) -> Value {
    match identifier {
        Identifier::NameId(id) => json!({
            "element": "NameID",
            "value": id.value(),
            "format": id.format(),
        }),
        Identifier::BaseId(id) => base_id_summary(id),
        Identifier::EncryptedId(_) => json!({ "element": "EncryptedID" }),
    }
}

#[cfg(feature = "cli")]
fn conditions_summary(conditions: &Conditions) -> Value {
    json!({
        "element": "Conditions",
        "notBefore": conditions.not_before().map(|t| t.to_rfc3339()),
        "notOnOrAfter": conditions.not_on_or_after().map(|t| t.to_rfc3339()),
        "conditions": conditions.conditions().iter().map(condition_summary).collect::<Vec<_>>(),
    })
}

#[cfg(feature = "cli")]
fn condition_summary(condition: &Condition) -> Value {
    match condition {
        Condition::AudienceRestriction(r) => json!({
            "element": "AudienceRestriction",
            "audiences": r.audiences(),
        }),
        Condition::OneTimeUse(_) => json!({ "element": "OneTimeUse" }),
        Condition::ProxyRestriction(r) => json!({
            "element": "ProxyRestriction",
            "count": r.count(),
            "audiences": r.audiences(),
        }),
        Condition::Extension(c) => json!({
            "element": "Condition",
            "xsiType": c.xsi_type().attribute_value(),
            "known": true,
        }),
        Condition::Unknown(c) => json!({
            "element": "Condition",
            "xsiType": c.xsi_type(),
            "typeName": c.type_name().to_string(),
            "known": false,
        }),
    }
}

#[cfg(feature = "cli")]
fn statement_summary(statement: &Statement) -> Value {
    match statement {
        Statement::Authn(s) => json!({
            "element": "AuthnStatement",
            "authnInstant": s.authn_instant().to_rfc3339(),
            "sessionIndex": s.session_index(),
            "classRef": s.authn_context().class_ref(),
        }),
        Statement::Attribute(s) => json!({
            "element": "AttributeStatement",
            "attributes": s
                .attributes()
                .map(|a| json!({ "name": a.name(), "values": a.string_values().collect::<Vec<_>>() }))
                .collect::<Vec<_>>(),
            "encrypted": s.encrypted_attributes().count(),
        }),
        Statement::AuthzDecision(s) => json!({
            "element": "AuthzDecisionStatement",
            "resource": s.resource(),
            "decision": s.decision(),
            "actions": s.actions().iter().map(|a| a.value()).collect::<Vec<_>>(),
        }),
        Statement::Extension(s) => json!({
            "element": "Statement",
            "xsiType": s.xsi_type().attribute_value(),
            "known": true,
        }),
        Statement::Unknown(s) => json!({
            "element": "Statement",
            "xsiType": s.xsi_type(),
            "typeName": s.type_name().to_string(),
            "known": false,
        }),
    }
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let limits = if cli.strict {
        Limits::strict()
    } else {
        Limits::default()
    };
    let loader = Loader::new().with_limits(limits);

    let result = match cli.command {
        Commands::Decode { file, pretty } => cmd_decode(&loader, file, pretty),
        Commands::Roundtrip { file } => cmd_roundtrip(&loader, file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load(loader: &Loader, file: &PathBuf) -> Result<Decoded, Box<dyn std::error::Error>> {
    let root = loader.load_file(file)?.into_root()?;
    tracing::debug!(file = %file.display(), root = %root.qname, "loaded document");
    Ok(Decoded::decode(&root, ExtensionRegistry::empty())?)
}

#[cfg(feature = "cli")]
fn cmd_decode(loader: &Loader, file: PathBuf, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = load(loader, &file)?.summary();
    let json_str = if pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", json_str);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_roundtrip(loader: &Loader, file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let decoded = load(loader, &file)?;
    println!("{}", decoded.to_xml()?.to_xml_string()?);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
