use crate::authz::errors::AuthzError;
use crate::authz::types::*;
use kdl::{KdlDocument, KdlNode};

/// Parse a KDL schema document into raw permission definitions.
///
/// `origin` names the document in error messages (usually its path).
pub fn parse_kdl_document(origin: &str, source: &str) -> Result<ParsedSchema, AuthzError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| AuthzError::KdlParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

    let mut schema = ParsedSchema {
        origin: origin.to_string(),
        ..Default::default()
    };

    for node in doc.nodes() {
        match node.name().value() {
            "permission" => schema.permissions.push(parse_permission(node)?),
            other => {
                tracing::warn!(origin, "ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(schema)
}

fn parse_permission(node: &KdlNode) -> Result<RawPermission, AuthzError> {
    let name = first_string_arg(node).ok_or_else(|| {
        AuthzError::InvalidSchema(
            "permission node requires a string argument (e.g. permission \"parts\")".into(),
        )
    })?;

    let mut operations = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "operation" => operations.push(parse_operation(&name, child)?),
                other => {
                    return Err(AuthzError::InvalidSchema(format!(
                        "unexpected child `{other}` in permission `{name}` (expected `operation`)"
                    )));
                }
            }
        }
    }

    if operations.is_empty() {
        let message = format!("permission `{name}` defines no operations");
        return Err(AuthzError::InvalidSchema(message));
    }

    Ok(RawPermission {
        label: string_prop(node, "label"),
        name,
        operations,
    })
}

fn parse_operation(permission: &str, node: &KdlNode) -> Result<RawOperation, AuthzError> {
    let name = first_string_arg(node).ok_or_else(|| {
        AuthzError::InvalidSchema(format!(
            "operation in `{permission}` requires a string argument (e.g. operation \"read\")"
        ))
    })?;

    let bit = node
        .get("bit")
        .ok_or_else(|| {
            AuthzError::InvalidSchema(format!(
                "operation `{permission}.{name}` missing `bit` property (e.g. bit=0)"
            ))
        })?
        .as_integer()
        .ok_or_else(|| {
            AuthzError::InvalidSchema(format!(
                "`bit` of operation `{permission}.{name}` must be an integer"
            ))
        })?;

    Ok(RawOperation {
        label: string_prop(node, "label"),
        name,
        bit,
    })
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn string_prop(node: &KdlNode, key: &str) -> Option<String> {
    node.get(key)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}
