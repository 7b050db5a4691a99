use crate::record::{Field, FieldValue, FlowRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Column equals value
    Equals(Field, FieldValue),
    /// `starttime >= bound`
    StartsAtOrAfter(i64),
    /// `endtime <= bound`
    EndsAtOrBefore(i64),
}

impl Predicate {
    pub fn matches(&self, record: &FlowRecord) -> bool {
        match self {
            Predicate::Equals(field, value) => record.value(*field) == *value,
            Predicate::StartsAtOrAfter(bound) => record.starttime() >= *bound,
            Predicate::EndsAtOrBefore(bound) => record.endtime() <= *bound,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Equals(field, FieldValue::Int(v)) => write!(f, "{} == {}", field, v),
            Predicate::Equals(field, FieldValue::Text(v)) => write!(f, "{} == {:?}", field, v),
            Predicate::StartsAtOrAfter(bound) => write!(f, "starttime >= {}", bound),
            Predicate::EndsAtOrBefore(bound) => write!(f, "endtime <= {}", bound),
        }
    }
}

/// Logical AND of predicates. The empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    predicates: Vec<Predicate>,
}

impl QueryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub(crate) fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &FlowRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

impl std::fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.predicates.is_empty() {
            return f.write_str("*");
        }
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}
