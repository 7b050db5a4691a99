//! Catalog: the column contract shared by ingestion and search.
//!
//! The catalog is built once per process and never mutated. Both the
//! line layout (field resolution) and the query builder (allow-list and
//! value types) read from the same instance so the two can't drift.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Every column of a flow record, in persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Serialno,
    Version,
    AccountId,
    InstanceId,
    Srcaddr,
    Dstaddr,
    Srcport,
    Dstport,
    Protocol,
    Packets,
    Bytes,
    Starttime,
    Endtime,
    Action,
    LogStatus,
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer (account ids, epoch seconds)
    BigInteger,
    /// Bounded text column
    Text { max_len: usize },
    /// IPv4 or IPv6 address, stored in textual form
    Address,
}

impl FieldKind {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::BigInteger)
    }
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Serialno,
        Field::Version,
        Field::AccountId,
        Field::InstanceId,
        Field::Srcaddr,
        Field::Dstaddr,
        Field::Srcport,
        Field::Dstport,
        Field::Protocol,
        Field::Packets,
        Field::Bytes,
        Field::Starttime,
        Field::Endtime,
        Field::Action,
        Field::LogStatus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Serialno => "serialno",
            Field::Version => "version",
            Field::AccountId => "account_id",
            Field::InstanceId => "instance_id",
            Field::Srcaddr => "srcaddr",
            Field::Dstaddr => "dstaddr",
            Field::Srcport => "srcport",
            Field::Dstport => "dstport",
            Field::Protocol => "protocol",
            Field::Packets => "packets",
            Field::Bytes => "bytes",
            Field::Starttime => "starttime",
            Field::Endtime => "endtime",
            Field::Action => "action",
            Field::LogStatus => "log_status",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Serialno
            | Field::Version
            | Field::Srcport
            | Field::Dstport
            | Field::Protocol
            | Field::Packets
            | Field::Bytes => FieldKind::Integer,
            Field::AccountId | Field::Starttime | Field::Endtime => FieldKind::BigInteger,
            Field::InstanceId => FieldKind::Text { max_len: 255 },
            Field::Action | Field::LogStatus => FieldKind::Text { max_len: 50 },
            Field::Srcaddr | Field::Dstaddr => FieldKind::Address,
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns a search may filter on by equality.
const QUERYABLE: [Field; 9] = [
    Field::AccountId,
    Field::Srcaddr,
    Field::Dstaddr,
    Field::InstanceId,
    Field::Srcport,
    Field::Dstport,
    Field::Protocol,
    Field::Packets,
    Field::Bytes,
];

static CATALOG: Lazy<FieldCatalog> = Lazy::new(FieldCatalog::standard);

#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    queryable: Vec<Field>,
}

impl FieldCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static FieldCatalog {
        &CATALOG
    }

    fn standard() -> Self {
        Self {
            fields: Field::ALL.to_vec(),
            queryable: QUERYABLE.to_vec(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Resolve a search column by name, only if it is on the allow-list.
    pub fn lookup_queryable(&self, name: &str) -> Option<Field> {
        self.queryable.iter().copied().find(|f| f.name() == name)
    }

    pub fn queryable_names(&self) -> Vec<&'static str> {
        self.queryable.iter().map(Field::name).collect()
    }
}
