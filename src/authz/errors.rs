use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to load permission schema `{path}`")]
    #[diagnostic(
        code(permtree::authz::schema_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    SchemaLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("KDL parse error in `{origin}`: {message}")]
    #[diagnostic(
        code(permtree::authz::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev")
    )]
    KdlParse { origin: String, message: String },

    #[error("Invalid permission schema: {0}")]
    #[diagnostic(
        code(permtree::authz::invalid_schema),
        help("Schema syntax: permission \"name\" {{ operation \"op\" bit=0 }}")
    )]
    InvalidSchema(String),

    #[error("Permission `{0}` is defined more than once")]
    #[diagnostic(
        code(permtree::authz::duplicate_permission),
        help("Permission names must be unique across all schema files")
    )]
    DuplicatePermission(String),

    #[error("Operation `{operation}` is defined more than once in permission `{permission}`")]
    #[diagnostic(code(permtree::authz::duplicate_operation))]
    DuplicateOperation {
        permission: String,
        operation: String,
    },

    #[error("Bit {bit} is used by both `{first}` and `{second}` in permission `{permission}`")]
    #[diagnostic(
        code(permtree::authz::duplicate_bit),
        help("Bit indices index persisted storage; give every operation its own bit")
    )]
    DuplicateBit {
        permission: String,
        bit: u8,
        first: String,
        second: String,
    },

    #[error("Operations `{first}` and `{second}` of `{permission}` share a storage slot")]
    #[diagnostic(
        code(permtree::authz::overlapping_bits),
        help("Each operation occupies two bits from its index; space indices 2 apart")
    )]
    OverlappingBits {
        permission: String,
        first: String,
        second: String,
    },

    #[error("Bit {bit} of `{permission}.{operation}` does not fit in a 64-bit permission word")]
    #[diagnostic(
        code(permtree::authz::bit_out_of_range),
        help("Bit indices must be between 0 and 62")
    )]
    BitOutOfRange {
        permission: String,
        operation: String,
        bit: i128,
    },

    #[error("Unknown permission `{0}`")]
    #[diagnostic(code(permtree::authz::unknown_permission))]
    UnknownPermission(String),

    #[error("Unknown operation `{operation}` for permission `{permission}`")]
    #[diagnostic(code(permtree::authz::unknown_operation))]
    UnknownOperation {
        permission: String,
        operation: String,
    },

    #[error("Cyclic group hierarchy detected: {0}")]
    #[diagnostic(
        code(permtree::authz::hierarchy_cycle),
        help("Check the parent links of the listed groups for circular references")
    )]
    HierarchyCycle(String),

    #[error("Group hierarchy deeper than the configured limit of {limit}")]
    #[diagnostic(
        code(permtree::authz::hierarchy_too_deep),
        help("Raise `permissions.max_depth` or flatten the group hierarchy")
    )]
    HierarchyTooDeep { limit: usize },

    #[error("Group `{0}` is referenced but does not exist")]
    #[diagnostic(code(permtree::authz::unknown_group))]
    UnknownGroup(String),

    #[error("Stored value for bit {bit} of permission `{permission}` is invalid")]
    #[diagnostic(code(permtree::authz::corrupt_value))]
    CorruptPermissionValue { permission: String, bit: u8 },
}

impl AuthzError {
    /// Errors raised while loading the schema. A process must not start
    /// serving queries after one of these.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            AuthzError::SchemaLoad { .. }
                | AuthzError::KdlParse { .. }
                | AuthzError::InvalidSchema(_)
                | AuthzError::DuplicatePermission(_)
                | AuthzError::DuplicateOperation { .. }
                | AuthzError::DuplicateBit { .. }
                | AuthzError::OverlappingBits { .. }
                | AuthzError::BitOutOfRange { .. }
        )
    }
}
