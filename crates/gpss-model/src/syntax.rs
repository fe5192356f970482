//! Operand syntax: literals, names, parameter references and SNAs.
//!
//! Input is expected upper-cased. Every form here is printed back by the
//! `Display` impls in `gpss_core::operand`.

use gpss_core::block::{AssignMode, AssignTarget};
use gpss_core::id::EntityName;
use gpss_core::operand::{Operand, Sna};

/// Why an operand field could not be read. The parser attaches the line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("malformed operand '{0}'")]
    Malformed(String),
    #[error("integer '{0}' is out of range")]
    OutOfRange(String),
    #[error("'{0}' cannot name an entity")]
    NotAnEntity(String),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
}

/// Parse an operand in a numeric position.
pub fn parse_operand(text: &str) -> Result<Operand, SyntaxError> {
    if let Some(n) = parse_integer(text)? {
        return Ok(Operand::Literal(n));
    }
    if let Some(param) = parse_parameter(text)? {
        return Ok(Operand::Parameter(param));
    }
    if let Some(sna) = parse_sna(text)? {
        return Ok(Operand::Attribute(sna));
    }
    if is_name(text) {
        return Ok(Operand::Name(text.to_string()));
    }
    Err(SyntaxError::Malformed(text.to_string()))
}

/// Parse an operand in an entity position: a name, a positive number or an
/// indirect number taken from a parameter. SNAs are not accepted.
pub fn parse_entity(text: &str) -> Result<Operand, SyntaxError> {
    if let Some(n) = parse_integer(text)? {
        if n <= 0 {
            return Err(SyntaxError::NotAnEntity(text.to_string()));
        }
        return Ok(Operand::Literal(n));
    }
    if let Some(param) = parse_parameter(text)? {
        return Ok(Operand::Parameter(param));
    }
    if is_name(text) {
        return Ok(Operand::Name(text.to_string()));
    }
    Err(SyntaxError::NotAnEntity(text.to_string()))
}

/// Parse an ASSIGN target: `NAME`, `NAME+` or `NAME-`.
pub fn parse_assign_target(text: &str) -> Result<AssignTarget, SyntaxError> {
    let (name, mode) = match text.as_bytes().last() {
        Some(b'+') => (&text[..text.len() - 1], AssignMode::Add),
        Some(b'-') => (&text[..text.len() - 1], AssignMode::Subtract),
        _ => (text, AssignMode::Replace),
    };
    if !is_parameter_name(name) {
        return Err(SyntaxError::Malformed(text.to_string()));
    }
    Ok(AssignTarget {
        name: name.to_string(),
        mode,
    })
}

/// Parse an integer literal with an optional sign. `Ok(None)` if the text
/// is not shaped like one.
pub fn parse_integer(text: &str) -> Result<Option<i64>, SyntaxError> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| SyntaxError::OutOfRange(text.to_string()))
}

/// `*NAME` or `P$NAME`.
fn parse_parameter(text: &str) -> Result<Option<String>, SyntaxError> {
    let Some(name) = text.strip_prefix('*').or_else(|| text.strip_prefix("P$")) else {
        return Ok(None);
    };
    if is_parameter_name(name) {
        Ok(Some(name.to_string()))
    } else {
        Err(SyntaxError::Malformed(text.to_string()))
    }
}

fn parse_sna(text: &str) -> Result<Option<Sna>, SyntaxError> {
    let sna = match text {
        "C1" => Sna::Clock,
        "AC1" => Sna::AbsoluteClock,
        "XN1" => Sna::TransactionNumber,
        "PR" => Sna::Priority,
        "M1" => Sna::TransitTime,
        "TG1" => Sna::TerminationCount,
        _ => {
            if let Some(family) = text.strip_prefix("RN")
                && !family.is_empty()
                && family.bytes().all(|b| b.is_ascii_digit())
            {
                let family = family
                    .parse::<u32>()
                    .map_err(|_| SyntaxError::OutOfRange(text.to_string()))?;
                return Ok(Some(Sna::Random(family)));
            }
            let Some((prefix, argument)) = text.split_once('$') else {
                return Ok(None);
            };
            return family_sna(text, prefix, argument).map(Some);
        }
    };
    Ok(Some(sna))
}

/// SNAs of the form `PREFIX$argument`.
fn family_sna(text: &str, prefix: &str, argument: &str) -> Result<Sna, SyntaxError> {
    match prefix {
        "N" | "W" => {
            if !is_parameter_name(argument) {
                return Err(SyntaxError::Malformed(text.to_string()));
            }
            let label = argument.to_string();
            Ok(if prefix == "N" {
                Sna::BlockEntries(label)
            } else {
                Sna::BlockCurrent(label)
            })
        }
        _ => {
            let entity = entity_name(text, argument)?;
            match prefix {
                "F" => Ok(Sna::FacilityBusy(entity)),
                "FC" => Ok(Sna::FacilityEntries(entity)),
                "FR" => Ok(Sna::FacilityUtilization(entity)),
                "S" => Ok(Sna::StorageInUse(entity)),
                "R" => Ok(Sna::StorageRemaining(entity)),
                "SC" => Ok(Sna::StorageEntries(entity)),
                "SM" => Ok(Sna::StorageMax(entity)),
                "Q" => Ok(Sna::QueueContent(entity)),
                "QM" => Ok(Sna::QueueMax(entity)),
                "QC" => Ok(Sna::QueueEntries(entity)),
                "FN" => Ok(Sna::Function(entity)),
                _ => Err(SyntaxError::UnknownAttribute(text.to_string())),
            }
        }
    }
}

/// The entity after `$`: digits are a number, anything else a name.
fn entity_name(text: &str, argument: &str) -> Result<EntityName, SyntaxError> {
    if !argument.is_empty() && argument.bytes().all(|b| b.is_ascii_digit()) {
        return match argument.parse::<u32>() {
            Ok(n) if n > 0 => Ok(EntityName::Numbered(n)),
            Ok(_) => Err(SyntaxError::NotAnEntity(text.to_string())),
            Err(_) => Err(SyntaxError::OutOfRange(text.to_string())),
        };
    }
    if is_name(argument) {
        Ok(EntityName::Named(argument.to_string()))
    } else {
        Err(SyntaxError::Malformed(text.to_string()))
    }
}

/// A symbolic name: a letter, then letters, digits or underscores.
pub fn is_name(text: &str) -> bool {
    let mut bytes = text.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parameter names may also be plain numbers (`P$1`).
fn is_parameter_name(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(parse_operand("30").unwrap(), Operand::Literal(30));
        assert_eq!(parse_operand("-5").unwrap(), Operand::Literal(-5));
        assert_eq!(parse_operand("+7").unwrap(), Operand::Literal(7));
        assert!(matches!(
            parse_operand("99999999999999999999"),
            Err(SyntaxError::OutOfRange(_))
        ));
    }

    #[test]
    fn parameters_in_both_spellings() {
        assert_eq!(
            parse_operand("*TIEMPO").unwrap(),
            Operand::Parameter("TIEMPO".into())
        );
        assert_eq!(
            parse_operand("P$TIEMPO").unwrap(),
            Operand::Parameter("TIEMPO".into())
        );
        assert_eq!(parse_operand("*1").unwrap(), Operand::Parameter("1".into()));
        assert!(parse_operand("*").is_err());
    }

    #[test]
    fn fixed_snas() {
        assert_eq!(parse_operand("C1").unwrap(), Operand::Attribute(Sna::Clock));
        assert_eq!(parse_operand("AC1").unwrap(), Operand::Attribute(Sna::AbsoluteClock));
        assert_eq!(parse_operand("PR").unwrap(), Operand::Attribute(Sna::Priority));
        assert_eq!(parse_operand("RN3").unwrap(), Operand::Attribute(Sna::Random(3)));
        // `RN` alone is just a name.
        assert_eq!(parse_operand("RN").unwrap(), Operand::Name("RN".into()));
    }

    #[test]
    fn entity_snas() {
        assert_eq!(
            parse_operand("FR$CAJA").unwrap(),
            Operand::Attribute(Sna::FacilityUtilization("CAJA".into()))
        );
        assert_eq!(
            parse_operand("S$2").unwrap(),
            Operand::Attribute(Sna::StorageInUse(EntityName::Numbered(2)))
        );
        assert_eq!(
            parse_operand("N$SALIDA").unwrap(),
            Operand::Attribute(Sna::BlockEntries("SALIDA".into()))
        );
        assert!(matches!(
            parse_operand("ZZ$CAJA"),
            Err(SyntaxError::UnknownAttribute(_))
        ));
        assert!(matches!(
            parse_operand("Q$0"),
            Err(SyntaxError::NotAnEntity(_))
        ));
    }

    #[test]
    fn entity_positions_reject_snas() {
        assert_eq!(parse_entity("CAJA").unwrap(), Operand::Name("CAJA".into()));
        assert_eq!(parse_entity("3").unwrap(), Operand::Literal(3));
        assert_eq!(parse_entity("*K").unwrap(), Operand::Parameter("K".into()));
        assert!(parse_entity("0").is_err());
        assert!(parse_entity("Q$COLA").is_err());
    }

    #[test]
    fn assign_targets() {
        let t = parse_assign_target("COSTO+").unwrap();
        assert_eq!(t.name, "COSTO");
        assert_eq!(t.mode, AssignMode::Add);
        assert_eq!(parse_assign_target("2-").unwrap().mode, AssignMode::Subtract);
        assert_eq!(parse_assign_target("X").unwrap().mode, AssignMode::Replace);
        assert!(parse_assign_target("+").is_err());
    }

    #[test]
    fn malformed_text() {
        assert!(parse_operand("3X").is_err());
        assert!(parse_operand("A-B").is_err());
        assert!(parse_operand("").is_err());
    }
}
