use std::collections::HashMap;

use crate::authz::document::parse_kdl_document;
use crate::authz::errors::AuthzError;
use crate::authz::source::SchemaSource;
use crate::authz::types::*;
use crate::authz::PermissionSchema;

/// Highest bit index whose two-bit slot still fits in a `u64` word.
pub const MAX_BIT_INDEX: u8 = 62;

/// Read every document from `source` and compile them into a single
/// immutable `PermissionSchema`.
pub fn load_schema(source: &dyn SchemaSource) -> Result<PermissionSchema, AuthzError> {
    let documents = source.documents()?;
    let document_count = documents.len();

    let mut parsed = Vec::with_capacity(document_count);
    for doc in &documents {
        parsed.push(parse_kdl_document(&doc.origin, &doc.text)?);
    }

    let schema = compile_schema(parsed)?;

    tracing::info!(
        documents = document_count,
        permissions = schema.len(),
        operations = schema.operation_count(),
        "Loaded permission schema"
    );

    Ok(schema)
}

/// Merge and validate parsed documents into a `PermissionSchema`.
pub fn compile_schema(parsed: Vec<ParsedSchema>) -> Result<PermissionSchema, AuthzError> {
    let mut permissions: HashMap<String, PermissionDef> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for doc in parsed {
        for raw in doc.permissions {
            if permissions.contains_key(&raw.name) {
                return Err(AuthzError::DuplicatePermission(raw.name));
            }
            let def = compile_permission(raw)?;
            order.push(def.name.clone());
            permissions.insert(def.name.clone(), def);
        }
    }

    Ok(PermissionSchema { permissions, order })
}

fn compile_permission(raw: RawPermission) -> Result<PermissionDef, AuthzError> {
    let mut operations: Vec<OperationDef> = Vec::with_capacity(raw.operations.len());

    for op in raw.operations {
        let bit = u8::try_from(op.bit)
            .ok()
            .filter(|b| *b <= MAX_BIT_INDEX)
            .ok_or_else(|| AuthzError::BitOutOfRange {
                permission: raw.name.clone(),
                operation: op.name.clone(),
                bit: op.bit,
            })?;

        for existing in &operations {
            if existing.name == op.name {
                return Err(AuthzError::DuplicateOperation {
                    permission: raw.name.clone(),
                    operation: op.name,
                });
            }
            if existing.bit == bit {
                return Err(AuthzError::DuplicateBit {
                    permission: raw.name.clone(),
                    bit,
                    first: existing.name.clone(),
                    second: op.name,
                });
            }
            if existing.bit.abs_diff(bit) < 2 {
                return Err(AuthzError::OverlappingBits {
                    permission: raw.name.clone(),
                    first: existing.name.clone(),
                    second: op.name,
                });
            }
        }

        operations.push(OperationDef {
            name: op.name,
            bit,
            label: op.label,
        });
    }

    Ok(PermissionDef {
        name: raw.name,
        label: raw.label,
        operations,
    })
}
