//! Block operands and standard numerical attributes (SNAs).
//!
//! Operands are resolved when a transaction enters a block, against that
//! transaction and the live simulation state. The live state is reached
//! through [`AttributeSource`], which the kernel implements; this keeps the
//! operand language independent of how the kernel stores things.
//!
//! The [`Display`](std::fmt::Display) impls print the same syntax the model
//! parser reads, so a printed operand parses back to itself.

use crate::id::{EntityName, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperandError {
    #[error("{0} is not a numeric operand")]
    NotNumeric(String),
    #[error("{0} does not name an entity")]
    NotAnEntity(String),
    #[error("entity number must be positive, got {0}")]
    InvalidEntityNumber(i64),
    #[error("{0} needs a transaction, but none is acting")]
    NoTransaction(String),
    #[error("block label {0} is not defined")]
    UnknownLabel(String),
    #[error("function {0} is not declared")]
    UnknownFunction(EntityName),
    #[error("function evaluation nested deeper than {0} levels")]
    RecursionLimit(usize),
}

/// A standard numerical attribute: a named reference to a live value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sna {
    /// `C1`: relative clock.
    Clock,
    /// `AC1`: absolute clock.
    AbsoluteClock,
    /// `XN1`: number of the acting transaction.
    TransactionNumber,
    /// `PR`: priority of the acting transaction.
    Priority,
    /// `M1`: transit time of the acting transaction.
    TransitTime,
    /// `TG1`: remaining termination count.
    TerminationCount,
    /// `RNj`: random draw in thousandths from family `j`.
    Random(u32),
    /// `N$label`: entry count of a block.
    BlockEntries(String),
    /// `W$label`: transactions currently in a block.
    BlockCurrent(String),
    /// `F$fac`: 1 while the facility is owned.
    FacilityBusy(EntityName),
    /// `FC$fac`: facility entries.
    FacilityEntries(EntityName),
    /// `FR$fac`: facility utilization in parts per thousand.
    FacilityUtilization(EntityName),
    /// `S$st`: units in use.
    StorageInUse(EntityName),
    /// `R$st`: units free.
    StorageRemaining(EntityName),
    /// `SC$st`: units admitted.
    StorageEntries(EntityName),
    /// `SM$st`: peak units in use.
    StorageMax(EntityName),
    /// `Q$q`: current content.
    QueueContent(EntityName),
    /// `QM$q`: peak content.
    QueueMax(EntityName),
    /// `QC$q`: total entries.
    QueueEntries(EntityName),
    /// `FN$fn`: value of a function.
    Function(EntityName),
}

impl fmt::Display for Sna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sna::Clock => f.write_str("C1"),
            Sna::AbsoluteClock => f.write_str("AC1"),
            Sna::TransactionNumber => f.write_str("XN1"),
            Sna::Priority => f.write_str("PR"),
            Sna::TransitTime => f.write_str("M1"),
            Sna::TerminationCount => f.write_str("TG1"),
            Sna::Random(family) => write!(f, "RN{family}"),
            Sna::BlockEntries(label) => write!(f, "N${label}"),
            Sna::BlockCurrent(label) => write!(f, "W${label}"),
            Sna::FacilityBusy(e) => write!(f, "F${e}"),
            Sna::FacilityEntries(e) => write!(f, "FC${e}"),
            Sna::FacilityUtilization(e) => write!(f, "FR${e}"),
            Sna::StorageInUse(e) => write!(f, "S${e}"),
            Sna::StorageRemaining(e) => write!(f, "R${e}"),
            Sna::StorageEntries(e) => write!(f, "SC${e}"),
            Sna::StorageMax(e) => write!(f, "SM${e}"),
            Sna::QueueContent(e) => write!(f, "Q${e}"),
            Sna::QueueMax(e) => write!(f, "QM${e}"),
            Sna::QueueEntries(e) => write!(f, "QC${e}"),
            Sna::Function(e) => write!(f, "FN${e}"),
        }
    }
}

/// A resolved block operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Integer literal.
    Literal(i64),
    /// Symbolic name, late-bound to an entity.
    Name(String),
    /// Indirect reference through a parameter of the acting transaction
    /// (`*NAME` / `P$NAME`).
    Parameter(String),
    /// Standard numerical attribute.
    Attribute(Sna),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(n) => write!(f, "{n}"),
            Operand::Name(name) => f.write_str(name),
            Operand::Parameter(name) => write!(f, "P${name}"),
            Operand::Attribute(sna) => write!(f, "{sna}"),
        }
    }
}

/// Live values an operand can read.
pub trait AttributeSource {
    /// A parameter of a live transaction, or `None` if the transaction is
    /// gone.
    fn parameter(&self, tx: TransactionId, name: &str) -> Option<i64>;

    /// Evaluate a standard numerical attribute.
    fn attribute(&mut self, sna: &Sna, tx: Option<TransactionId>) -> Result<i64, OperandError>;
}

impl Operand {
    /// Integer value of the operand for `tx`.
    pub fn value<S>(&self, tx: Option<TransactionId>, source: &mut S) -> Result<i64, OperandError>
    where
        S: AttributeSource + ?Sized,
    {
        match self {
            Operand::Literal(n) => Ok(*n),
            Operand::Name(name) => Err(OperandError::NotNumeric(name.clone())),
            Operand::Parameter(name) => tx
                .and_then(|id| source.parameter(id, name))
                .ok_or_else(|| OperandError::NoTransaction(format!("P${name}"))),
            Operand::Attribute(sna) => source.attribute(sna, tx),
        }
    }

    /// Value of an optional operand, or `default` when it was omitted.
    pub fn value_or<S>(
        operand: Option<&Operand>,
        default: i64,
        tx: Option<TransactionId>,
        source: &mut S,
    ) -> Result<i64, OperandError>
    where
        S: AttributeSource + ?Sized,
    {
        match operand {
            Some(op) => op.value(tx, source),
            None => Ok(default),
        }
    }

    /// The entity the operand designates for `tx`.
    pub fn entity<S>(&self, tx: Option<TransactionId>, source: &S) -> Result<EntityName, OperandError>
    where
        S: AttributeSource + ?Sized,
    {
        let number = match self {
            Operand::Name(name) => return Ok(EntityName::Named(name.clone())),
            Operand::Literal(n) => *n,
            Operand::Parameter(name) => tx
                .and_then(|id| source.parameter(id, name))
                .ok_or_else(|| OperandError::NoTransaction(format!("*{name}")))?,
            Operand::Attribute(sna) => return Err(OperandError::NotAnEntity(sna.to_string())),
        };
        if number <= 0 || number > u32::MAX as i64 {
            return Err(OperandError::InvalidEntityNumber(number));
        }
        Ok(EntityName::Numbered(number as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::collections::HashMap;

    /// A source with one transaction and a fixed clock.
    struct FakeSource {
        tx: TransactionId,
        params: HashMap<String, i64>,
        clock: i64,
    }

    impl AttributeSource for FakeSource {
        fn parameter(&self, tx: TransactionId, name: &str) -> Option<i64> {
            (tx == self.tx).then(|| self.params.get(name).copied().unwrap_or(0))
        }

        fn attribute(&mut self, sna: &Sna, _tx: Option<TransactionId>) -> Result<i64, OperandError> {
            match sna {
                Sna::Clock => Ok(self.clock),
                other => Err(OperandError::NotNumeric(other.to_string())),
            }
        }
    }

    fn source() -> FakeSource {
        let mut map: SlotMap<TransactionId, ()> = SlotMap::with_key();
        let tx = map.insert(());
        let mut params = HashMap::new();
        params.insert("CAJA".to_string(), 3);
        params.insert("ZERO".to_string(), 0);
        FakeSource {
            tx,
            params,
            clock: 120,
        }
    }

    #[test]
    fn literal_and_attribute_values() {
        let mut src = source();
        let tx = Some(src.tx);
        assert_eq!(Operand::Literal(30).value(tx, &mut src), Ok(30));
        assert_eq!(Operand::Attribute(Sna::Clock).value(tx, &mut src), Ok(120));
    }

    #[test]
    fn parameter_value_and_missing_transaction() {
        let mut src = source();
        let tx = Some(src.tx);
        let op = Operand::Parameter("CAJA".into());
        assert_eq!(op.value(tx, &mut src), Ok(3));
        assert!(matches!(op.value(None, &mut src), Err(OperandError::NoTransaction(_))));
    }

    #[test]
    fn names_are_not_numbers() {
        let mut src = source();
        assert_eq!(
            Operand::Name("CAJA".into()).value(None, &mut src),
            Err(OperandError::NotNumeric("CAJA".into()))
        );
    }

    #[test]
    fn value_or_default() {
        let mut src = source();
        assert_eq!(Operand::value_or(None, 1, None, &mut src), Ok(1));
        assert_eq!(
            Operand::value_or(Some(&Operand::Literal(4)), 1, None, &mut src),
            Ok(4)
        );
    }

    #[test]
    fn entity_resolution() {
        let src = source();
        let tx = Some(src.tx);
        assert_eq!(
            Operand::Name("CAJA".into()).entity(tx, &src),
            Ok(EntityName::Named("CAJA".into()))
        );
        assert_eq!(Operand::Literal(2).entity(tx, &src), Ok(EntityName::Numbered(2)));
        assert_eq!(
            Operand::Parameter("CAJA".into()).entity(tx, &src),
            Ok(EntityName::Numbered(3))
        );
    }

    #[test]
    fn entity_numbers_must_be_positive() {
        let src = source();
        let tx = Some(src.tx);
        assert_eq!(
            Operand::Parameter("ZERO".into()).entity(tx, &src),
            Err(OperandError::InvalidEntityNumber(0))
        );
        assert_eq!(
            Operand::Literal(-1).entity(tx, &src),
            Err(OperandError::InvalidEntityNumber(-1))
        );
        assert!(matches!(
            Operand::Attribute(Sna::Clock).entity(tx, &src),
            Err(OperandError::NotAnEntity(_))
        ));
    }

    #[test]
    fn display_uses_model_syntax() {
        assert_eq!(Operand::Literal(-5).to_string(), "-5");
        assert_eq!(Operand::Name("SALON".into()).to_string(), "SALON");
        assert_eq!(Operand::Parameter("TIPO".into()).to_string(), "P$TIPO");
        assert_eq!(Operand::Attribute(Sna::Random(2)).to_string(), "RN2");
        assert_eq!(
            Operand::Attribute(Sna::StorageRemaining(EntityName::Numbered(4))).to_string(),
            "R$4"
        );
        assert_eq!(
            Operand::Attribute(Sna::BlockEntries("FIN".into())).to_string(),
            "N$FIN"
        );
    }
}
