use std::net::IpAddr;

use serde::Serialize;

use super::catalog::Field;

/// A column value in comparable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// Typed field values read from one log line, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowCandidate {
    pub serialno: i32,
    pub version: i32,
    pub account_id: i64,
    pub instance_id: String,
    pub srcaddr: String,
    pub dstaddr: String,
    pub srcport: i32,
    pub dstport: i32,
    pub protocol: i32,
    pub packets: i32,
    pub bytes: i32,
    pub starttime: i64,
    pub endtime: i64,
    pub action: String,
    pub log_status: String,
}

/// A validated flow record.
///
/// Only [`crate::validate::validate`] constructs one, so every instance
/// that reaches a store has passed all field and cross-field checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRecord {
    serialno: i32,
    version: i32,
    account_id: i64,
    instance_id: String,
    srcaddr: IpAddr,
    dstaddr: IpAddr,
    srcport: i32,
    dstport: i32,
    protocol: i32,
    packets: i32,
    bytes: i32,
    starttime: i64,
    endtime: i64,
    action: String,
    log_status: String,
}

impl FlowRecord {
    pub(crate) fn from_checked(candidate: FlowCandidate, srcaddr: IpAddr, dstaddr: IpAddr) -> Self {
        Self {
            serialno: candidate.serialno,
            version: candidate.version,
            account_id: candidate.account_id,
            instance_id: candidate.instance_id,
            srcaddr,
            dstaddr,
            srcport: candidate.srcport,
            dstport: candidate.dstport,
            protocol: candidate.protocol,
            packets: candidate.packets,
            bytes: candidate.bytes,
            starttime: candidate.starttime,
            endtime: candidate.endtime,
            action: candidate.action,
            log_status: candidate.log_status,
        }
    }

    pub fn serialno(&self) -> i32 {
        self.serialno
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn srcaddr(&self) -> IpAddr {
        self.srcaddr
    }

    pub fn dstaddr(&self) -> IpAddr {
        self.dstaddr
    }

    pub fn srcport(&self) -> i32 {
        self.srcport
    }

    pub fn dstport(&self) -> i32 {
        self.dstport
    }

    pub fn protocol(&self) -> i32 {
        self.protocol
    }

    pub fn packets(&self) -> i32 {
        self.packets
    }

    pub fn bytes(&self) -> i32 {
        self.bytes
    }

    pub fn starttime(&self) -> i64 {
        self.starttime
    }

    pub fn endtime(&self) -> i64 {
        self.endtime
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn log_status(&self) -> &str {
        &self.log_status
    }

    /// Column value by field, used for generic predicate evaluation.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Serialno => FieldValue::Int(self.serialno.into()),
            Field::Version => FieldValue::Int(self.version.into()),
            Field::AccountId => FieldValue::Int(self.account_id),
            Field::InstanceId => FieldValue::Text(self.instance_id.clone()),
            Field::Srcaddr => FieldValue::Text(self.srcaddr.to_string()),
            Field::Dstaddr => FieldValue::Text(self.dstaddr.to_string()),
            Field::Srcport => FieldValue::Int(self.srcport.into()),
            Field::Dstport => FieldValue::Int(self.dstport.into()),
            Field::Protocol => FieldValue::Int(self.protocol.into()),
            Field::Packets => FieldValue::Int(self.packets.into()),
            Field::Bytes => FieldValue::Int(self.bytes.into()),
            Field::Starttime => FieldValue::Int(self.starttime),
            Field::Endtime => FieldValue::Int(self.endtime),
            Field::Action => FieldValue::Text(self.action.clone()),
            Field::LogStatus => FieldValue::Text(self.log_status.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_candidate() -> FlowCandidate {
    FlowCandidate {
        serialno: 2,
        version: 1,
        account_id: 123456789010,
        instance_id: "eni-1235b8ca123456789".to_string(),
        srcaddr: "172.31.16.139".to_string(),
        dstaddr: "172.31.16.21".to_string(),
        srcport: 20641,
        dstport: 22,
        protocol: 6,
        packets: 20,
        bytes: 20,
        starttime: 1418530010,
        endtime: 1418530070,
        action: "ACCEPT".to_string(),
        log_status: "OK".to_string(),
    }
}
