//! Model text parser.
//!
//! One statement per line: `[LABEL] OPERATION [A,B,C,...] [; comment]`.
//! A line whose first non-blank character is `*` is a comment. Keywords are
//! case-insensitive and names are upper-cased. A FUNCTION statement is
//! followed by one data line of `x,y` pairs separated by `/`.
//!
//! Errors are collected per line; a deck with several mistakes reports all
//! of them.

use crate::syntax::{self, SyntaxError};
use gpss_core::block::BlockKind;
use gpss_core::function::FunctionKind;
use gpss_core::model::{Model, ModelBuilder, ModelError, Statement};
use gpss_core::operand::Operand;
use std::fmt;
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: unknown operation {operation}")]
    UnknownOperation { line: usize, operation: String },

    #[error("line {line}: {operation} is not supported")]
    Unsupported { line: usize, operation: String },

    #[error("line {line}: {operation} operand {position}: {source}")]
    Operand {
        line: usize,
        operation: &'static str,
        position: char,
        #[source]
        source: SyntaxError,
    },

    #[error("line {line}: {operation} needs operand {position}")]
    MissingOperand {
        line: usize,
        operation: &'static str,
        position: char,
    },

    #[error("line {line}: {operation} takes at most {max} operand(s), got {found}")]
    TooManyOperands {
        line: usize,
        operation: &'static str,
        max: usize,
        found: usize,
    },

    #[error("line {line}: {operation} operand {position} must be an integer literal")]
    NotLiteral {
        line: usize,
        operation: &'static str,
        position: char,
    },

    #[error("line {line}: function kind '{text}' is not Dn or Cn")]
    FunctionKind { line: usize, text: String },

    #[error("line {line}: FUNCTION {name} has no data line")]
    MissingFunctionData { line: usize, name: String },

    #[error("line {line}: malformed function point '{text}'")]
    FunctionPoint { line: usize, text: String },

    #[error("line {line}: function declares {declared} points but lists {found}")]
    FunctionPointCount {
        line: usize,
        declared: usize,
        found: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ParseError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnknownOperation { line, .. }
            | ParseError::Unsupported { line, .. }
            | ParseError::Operand { line, .. }
            | ParseError::MissingOperand { line, .. }
            | ParseError::TooManyOperands { line, .. }
            | ParseError::NotLiteral { line, .. }
            | ParseError::FunctionKind { line, .. }
            | ParseError::MissingFunctionData { line, .. }
            | ParseError::FunctionPoint { line, .. }
            | ParseError::FunctionPointCount { line, .. } => Some(*line),
            ParseError::Model(err) => err.line(),
        }
    }
}

/// Every error found in a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl std::error::Error for ParseErrors {}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model text rejected with {} error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ===========================================================================
// Operations
// ===========================================================================

/// Statements that describe features this engine does not model.
const UNSUPPORTED: &[&str] = &[
    "PREEMPT", "RETURN", "SPLIT", "ASSEMBLE", "GATHER", "MATCH", "MATRIX", "MSAVEVALUE", "TABLE",
    "QTABLE", "TABULATE", "VARIABLE", "FVARIABLE", "BVARIABLE", "SAVEVALUE", "TRANSFER", "TEST",
    "GATE", "LOGIC", "LINK", "UNLINK", "LOOP", "MARK", "SELECT", "COUNT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Generate,
    Advance,
    Terminate,
    Seize,
    Release,
    Enter,
    Leave,
    Queue,
    Depart,
    Priority,
    Assign,
    Trace,
    Untrace,
    Storage,
    Function,
    Simulate,
    Start,
    End,
}

impl Operation {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "GENERATE" => Operation::Generate,
            "ADVANCE" => Operation::Advance,
            "TERMINATE" => Operation::Terminate,
            "SEIZE" => Operation::Seize,
            "RELEASE" => Operation::Release,
            "ENTER" => Operation::Enter,
            "LEAVE" => Operation::Leave,
            "QUEUE" => Operation::Queue,
            "DEPART" => Operation::Depart,
            "PRIORITY" => Operation::Priority,
            "ASSIGN" => Operation::Assign,
            "TRACE" => Operation::Trace,
            "UNTRACE" => Operation::Untrace,
            "STORAGE" => Operation::Storage,
            "FUNCTION" => Operation::Function,
            "SIMULATE" => Operation::Simulate,
            "START" => Operation::Start,
            "END" => Operation::End,
            _ => return None,
        })
    }

    fn keyword(self) -> &'static str {
        match self {
            Operation::Generate => "GENERATE",
            Operation::Advance => "ADVANCE",
            Operation::Terminate => "TERMINATE",
            Operation::Seize => "SEIZE",
            Operation::Release => "RELEASE",
            Operation::Enter => "ENTER",
            Operation::Leave => "LEAVE",
            Operation::Queue => "QUEUE",
            Operation::Depart => "DEPART",
            Operation::Priority => "PRIORITY",
            Operation::Assign => "ASSIGN",
            Operation::Trace => "TRACE",
            Operation::Untrace => "UNTRACE",
            Operation::Storage => "STORAGE",
            Operation::Function => "FUNCTION",
            Operation::Simulate => "SIMULATE",
            Operation::Start => "START",
            Operation::End => "END",
        }
    }

    fn max_operands(self) -> usize {
        match self {
            Operation::Generate => 5,
            Operation::Assign => 3,
            Operation::Advance
            | Operation::Enter
            | Operation::Leave
            | Operation::Queue
            | Operation::Depart
            | Operation::Function => 2,
            Operation::Terminate
            | Operation::Seize
            | Operation::Release
            | Operation::Priority
            | Operation::Storage
            | Operation::Start => 1,
            Operation::Trace | Operation::Untrace | Operation::Simulate | Operation::End => 0,
        }
    }
}

fn is_keyword(word: &str) -> bool {
    Operation::from_keyword(word).is_some() || UNSUPPORTED.contains(&word)
}

// ===========================================================================
// Deck
// ===========================================================================

/// A parsed model deck.
#[derive(Debug, Clone)]
pub struct Deck {
    pub model: Model,
    /// Termination count from a `START` statement, if the deck has one.
    pub start: Option<i64>,
}

/// Parse model text into a checked model.
pub fn parse_model(text: &str) -> Result<Model, ParseErrors> {
    parse_deck(text).map(|deck| deck.model)
}

/// Parse model text, keeping the control statements.
pub fn parse_deck(text: &str) -> Result<Deck, ParseErrors> {
    let mut errors = Vec::new();
    let mut builder = ModelBuilder::new();
    let mut start = None;

    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    while let Some((line, raw)) = lines.next() {
        let Some(source) = strip_comment(raw) else {
            continue;
        };
        let fields = match split_fields(line, source) {
            Ok(fields) => fields,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };

        // FUNCTION consumes the next non-comment line as its data.
        let data = if fields.operation == Operation::Function {
            loop {
                match lines.next() {
                    Some((data_line, raw)) => {
                        if let Some(text) = strip_comment(raw) {
                            break Some((data_line, text.to_ascii_uppercase()));
                        }
                    }
                    None => break None,
                }
            }
        } else {
            None
        };

        match fields.operation {
            Operation::Simulate | Operation::End => {
                check_count(line, &fields, &mut errors);
            }
            Operation::Start => {
                let ops = Operands::new(line, &fields);
                if let Some(n) = ops.literal(0, &mut errors).flatten() {
                    start = Some(n);
                } else if ops.get(0).is_none() {
                    errors.push(ops.missing(0));
                }
                ops.finish(&mut errors);
            }
            _ => {
                if let Some(kind) = build_kind(line, &fields, data, &mut errors) {
                    builder.statement(Statement {
                        line,
                        label: fields.label.clone(),
                        text: source.trim().to_string(),
                        kind,
                    });
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(ParseErrors(errors));
    }
    debug!(statements = builder.len(), "model text parsed");
    builder
        .build()
        .map(|model| Deck { model, start })
        .map_err(|errs| ParseErrors(errs.0.into_iter().map(ParseError::Model).collect()))
}

/// Drop a trailing `;` comment. `None` for blank and comment lines.
fn strip_comment(raw: &str) -> Option<&str> {
    let source = match raw.find(';') {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let trimmed = source.trim();
    if trimmed.is_empty() || trimmed.starts_with('*') {
        None
    } else {
        Some(source)
    }
}

// ===========================================================================
// Fields
// ===========================================================================

struct Fields {
    label: Option<String>,
    operation: Operation,
    operands: Vec<String>,
}

/// Split a statement into label, operation and operands. A first word that
/// is not a keyword but precedes one is the label. The operand field is the
/// first word after the operation; anything after it is commentary.
fn split_fields(line: usize, source: &str) -> Result<Fields, ParseError> {
    let upper = source.to_ascii_uppercase();
    let words: Vec<&str> = upper.split_whitespace().collect();

    let (label, keyword, operands) = match words.as_slice() {
        [first, second, rest @ ..] if !is_keyword(first) && is_keyword(second) => {
            (Some(first.to_string()), *second, rest.first().copied())
        }
        [first, rest @ ..] => (None, *first, rest.first().copied()),
        [] => {
            return Err(ParseError::UnknownOperation {
                line,
                operation: String::new(),
            });
        }
    };

    let operation = match Operation::from_keyword(keyword) {
        Some(op) => op,
        None if UNSUPPORTED.contains(&keyword) => {
            return Err(ParseError::Unsupported {
                line,
                operation: keyword.to_string(),
            });
        }
        None => {
            return Err(ParseError::UnknownOperation {
                line,
                operation: keyword.to_string(),
            });
        }
    };

    let operands = operands
        .map(|field| field.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    Ok(Fields {
        label,
        operation,
        operands,
    })
}

fn check_count(line: usize, fields: &Fields, errors: &mut Vec<ParseError>) {
    let max = fields.operation.max_operands();
    if fields.operands.len() > max {
        errors.push(ParseError::TooManyOperands {
            line,
            operation: fields.operation.keyword(),
            max,
            found: fields.operands.len(),
        });
    }
}

/// Operand accessor for one statement. Positions are 0-based and reported
/// as `A`, `B`, `C`...
struct Operands<'a> {
    line: usize,
    operation: Operation,
    fields: &'a Fields,
}

impl<'a> Operands<'a> {
    fn new(line: usize, fields: &'a Fields) -> Self {
        Self {
            line,
            operation: fields.operation,
            fields,
        }
    }

    /// The raw field, or `None` if omitted or empty.
    fn get(&self, index: usize) -> Option<&'a str> {
        self.fields
            .operands
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    fn position(index: usize) -> char {
        (b'A' + index as u8) as char
    }

    fn missing(&self, index: usize) -> ParseError {
        ParseError::MissingOperand {
            line: self.line,
            operation: self.operation.keyword(),
            position: Self::position(index),
        }
    }

    fn syntax(&self, index: usize, source: SyntaxError) -> ParseError {
        ParseError::Operand {
            line: self.line,
            operation: self.operation.keyword(),
            position: Self::position(index),
            source,
        }
    }

    /// A numeric operand, or `default` when omitted. `None` after an error.
    fn numeric(&self, index: usize, default: i64, errors: &mut Vec<ParseError>) -> Option<Operand> {
        match self.get(index) {
            None => Some(Operand::Literal(default)),
            Some(text) => syntax::parse_operand(text)
                .map_err(|e| errors.push(self.syntax(index, e)))
                .ok(),
        }
    }

    fn required_numeric(&self, index: usize, errors: &mut Vec<ParseError>) -> Option<Operand> {
        match self.get(index) {
            None => {
                errors.push(self.missing(index));
                None
            }
            Some(_) => self.numeric(index, 0, errors),
        }
    }

    fn entity(&self, index: usize, errors: &mut Vec<ParseError>) -> Option<Operand> {
        match self.get(index) {
            None => {
                errors.push(self.missing(index));
                None
            }
            Some(text) => syntax::parse_entity(text)
                .map_err(|e| errors.push(self.syntax(index, e)))
                .ok(),
        }
    }

    /// An integer literal. `Some(None)` when omitted, `None` after an error.
    fn literal(&self, index: usize, errors: &mut Vec<ParseError>) -> Option<Option<i64>> {
        let Some(text) = self.get(index) else {
            return Some(None);
        };
        match syntax::parse_integer(text) {
            Ok(Some(n)) => Some(Some(n)),
            Ok(None) => {
                errors.push(ParseError::NotLiteral {
                    line: self.line,
                    operation: self.operation.keyword(),
                    position: Self::position(index),
                });
                None
            }
            Err(e) => {
                errors.push(self.syntax(index, e));
                None
            }
        }
    }

    fn finish(&self, errors: &mut Vec<ParseError>) {
        check_count(self.line, self.fields, errors);
    }
}

// ===========================================================================
// Statements
// ===========================================================================

fn build_kind(
    line: usize,
    fields: &Fields,
    data: Option<(usize, String)>,
    errors: &mut Vec<ParseError>,
) -> Option<BlockKind> {
    let ops = Operands::new(line, fields);
    let before = errors.len();
    ops.finish(errors);

    let kind = match fields.operation {
        Operation::Generate => {
            let mean = ops.numeric(0, 0, errors);
            let spread = ops.numeric(1, 0, errors);
            let offset = ops.numeric(2, 0, errors);
            let limit = ops.numeric(3, 0, errors);
            let priority = ops.numeric(4, 0, errors);
            BlockKind::Generate {
                mean: mean?,
                spread: spread?,
                offset: offset?,
                limit: limit?,
                priority: priority?,
            }
        }
        Operation::Advance => {
            let mean = ops.numeric(0, 0, errors);
            let spread = ops.numeric(1, 0, errors);
            BlockKind::Advance {
                mean: mean?,
                spread: spread?,
            }
        }
        Operation::Terminate => BlockKind::Terminate {
            amount: ops.numeric(0, 0, errors)?,
        },
        Operation::Seize => BlockKind::Seize {
            facility: ops.entity(0, errors)?,
        },
        Operation::Release => BlockKind::Release {
            facility: ops.entity(0, errors)?,
        },
        Operation::Enter | Operation::Leave | Operation::Queue | Operation::Depart => {
            let entity = ops.entity(0, errors);
            let units = ops.numeric(1, 1, errors);
            let (entity, units) = (entity?, units?);
            match fields.operation {
                Operation::Enter => BlockKind::Enter {
                    storage: entity,
                    units,
                },
                Operation::Leave => BlockKind::Leave {
                    storage: entity,
                    units,
                },
                Operation::Queue => BlockKind::Queue {
                    queue: entity,
                    units,
                },
                _ => BlockKind::Depart {
                    queue: entity,
                    units,
                },
            }
        }
        Operation::Priority => BlockKind::Priority {
            value: ops.required_numeric(0, errors)?,
        },
        Operation::Assign => {
            let target = match ops.get(0) {
                None => {
                    errors.push(ops.missing(0));
                    None
                }
                Some(text) => syntax::parse_assign_target(text)
                    .map_err(|e| errors.push(ops.syntax(0, e)))
                    .ok(),
            };
            let value = ops.required_numeric(1, errors);
            let function = match ops.get(2) {
                None => Some(None),
                Some(_) => ops.entity(2, errors).map(Some),
            };
            BlockKind::Assign {
                target: target?,
                value: value?,
                function: function?,
            }
        }
        Operation::Trace => BlockKind::Trace,
        Operation::Untrace => BlockKind::Untrace,
        Operation::Storage => match ops.literal(0, errors)? {
            Some(capacity) => BlockKind::Storage { capacity },
            None => {
                errors.push(ops.missing(0));
                return None;
            }
        },
        Operation::Function => function_kind(line, fields, &ops, data, errors)?,
        Operation::Simulate | Operation::Start | Operation::End => return None,
    };

    (errors.len() == before).then_some(kind)
}

/// `NAME FUNCTION arg,Dn|Cn` and its data line.
fn function_kind(
    line: usize,
    fields: &Fields,
    ops: &Operands<'_>,
    data: Option<(usize, String)>,
    errors: &mut Vec<ParseError>,
) -> Option<BlockKind> {
    let argument = ops.required_numeric(0, errors);
    let kind = match ops.get(1) {
        None => {
            errors.push(ops.missing(1));
            None
        }
        Some(text) => {
            let parsed = match text.split_at_checked(1) {
                Some(("D", n)) => n.parse::<usize>().ok().map(|n| (FunctionKind::Discrete, n)),
                Some(("C", n)) => n.parse::<usize>().ok().map(|n| (FunctionKind::Continuous, n)),
                _ => None,
            };
            if parsed.is_none() {
                errors.push(ParseError::FunctionKind {
                    line,
                    text: text.to_string(),
                });
            }
            parsed
        }
    };

    let Some((data_line, data)) = data else {
        errors.push(ParseError::MissingFunctionData {
            line,
            name: fields.label.clone().unwrap_or_default(),
        });
        return None;
    };
    let points = parse_points(data_line, &data, errors);

    let (argument, (kind, declared), points) = (argument?, kind?, points?);
    if declared != points.len() {
        errors.push(ParseError::FunctionPointCount {
            line: data_line,
            declared,
            found: points.len(),
        });
        return None;
    }
    Some(BlockKind::Function {
        argument,
        kind,
        points,
    })
}

fn parse_points(line: usize, data: &str, errors: &mut Vec<ParseError>) -> Option<Vec<(i64, i64)>> {
    let mut points = Vec::new();
    let mut ok = true;
    for pair in data.split('/').map(str::trim).filter(|p| !p.is_empty()) {
        let point = pair.split_once(',').and_then(|(x, y)| {
            let x = syntax::parse_integer(x.trim()).ok().flatten()?;
            let y = syntax::parse_integer(y.trim()).ok().flatten()?;
            Some((x, y))
        });
        match point {
            Some(p) => points.push(p),
            None => {
                errors.push(ParseError::FunctionPoint {
                    line,
                    text: pair.to_string(),
                });
                ok = false;
            }
        }
    }
    ok.then_some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpss_core::block::AssignMode;
    use gpss_core::id::EntityName;
    use gpss_core::operand::Sna;

    fn kinds(model: &Model) -> Vec<&BlockKind> {
        model.blocks().iter().map(|b| &b.kind).collect()
    }

    #[test]
    fn minimal_deck() {
        let model = parse_model("       GENERATE 30,5\n       ADVANCE 75,25\n       TERMINATE 1\n").unwrap();
        let k = kinds(&model);
        assert_eq!(k.len(), 3);
        assert_eq!(
            k[0],
            &BlockKind::Generate {
                mean: Operand::Literal(30),
                spread: Operand::Literal(5),
                offset: Operand::Literal(0),
                limit: Operand::Literal(0),
                priority: Operand::Literal(0),
            }
        );
        assert_eq!(
            k[2],
            &BlockKind::Terminate {
                amount: Operand::Literal(1)
            }
        );
    }

    #[test]
    fn labels_comments_and_case() {
        let text = "\
* barber shop
SALON   storage 10      ; ten chairs
        generate 30,5
        enter salon
        advance 75,25   service time
        leave salon
SALIDA  terminate 1
";
        let model = parse_model(text).unwrap();
        assert_eq!(model.blocks().len(), 6);
        assert_eq!(model.blocks()[0].line, 2);
        assert_eq!(model.blocks()[0].text, "SALON   storage 10");
        assert!(model.block_id("SALIDA").is_some());
        assert_eq!(model.registry().storage(&"SALON".into()).unwrap().capacity(), 10);
        assert_eq!(
            model.blocks()[2].kind,
            BlockKind::Enter {
                storage: Operand::Name("SALON".into()),
                units: Operand::Literal(1),
            }
        );
    }

    #[test]
    fn omitted_operands_take_defaults() {
        let model = parse_model("GENERATE 10,,100,,3\nTERMINATE\n").unwrap();
        let k = kinds(&model);
        assert_eq!(
            k[0],
            &BlockKind::Generate {
                mean: Operand::Literal(10),
                spread: Operand::Literal(0),
                offset: Operand::Literal(100),
                limit: Operand::Literal(0),
                priority: Operand::Literal(3),
            }
        );
        assert_eq!(
            k[1],
            &BlockKind::Terminate {
                amount: Operand::Literal(0)
            }
        );
    }

    #[test]
    fn assign_with_function() {
        let text = "\
TARIFA FUNCTION C1,C2
0,0/100,50
 GENERATE 10
 ASSIGN COSTO+,2,TARIFA
 ADVANCE P$COSTO
 TERMINATE 1
";
        let model = parse_model(text).unwrap();
        let k = kinds(&model);
        assert_eq!(
            k[0],
            &BlockKind::Function {
                argument: Operand::Attribute(Sna::Clock),
                kind: FunctionKind::Continuous,
                points: vec![(0, 0), (100, 50)],
            }
        );
        let BlockKind::Assign {
            target,
            value,
            function,
        } = k[2]
        else {
            panic!("expected ASSIGN, got {:?}", k[2]);
        };
        assert_eq!(target.name, "COSTO");
        assert_eq!(target.mode, AssignMode::Add);
        assert_eq!(value, &Operand::Literal(2));
        assert_eq!(function, &Some(Operand::Name("TARIFA".into())));
        assert!(model.registry().function(&"TARIFA".into()).is_some());
    }

    #[test]
    fn numbered_entities() {
        let model = parse_model("1 STORAGE 3\n GENERATE 5\n ENTER 1,2\n LEAVE 1,2\n TERMINATE 1\n")
            .unwrap();
        assert!(
            model
                .registry()
                .storage(&EntityName::Numbered(1))
                .is_some()
        );
    }

    #[test]
    fn start_statement_is_kept() {
        let deck = parse_deck(" SIMULATE\n GENERATE 5\n TERMINATE 1\n START 30\n END\n").unwrap();
        assert_eq!(deck.start, Some(30));
        assert_eq!(deck.model.blocks().len(), 2);
    }

    #[test]
    fn errors_are_collected_with_lines() {
        let text = "\
 GENERATE 3X
 FROB 1
 SEIZE
 PRIORITY
 ADVANCE 1,2,3
 TERMINATE 1
";
        let errs = parse_model(text).unwrap_err();
        let lines: Vec<_> = errs.iter().filter_map(ParseError::line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 5]);
        assert!(matches!(errs.0[1], ParseError::UnknownOperation { .. }));
        assert!(matches!(
            errs.0[2],
            ParseError::MissingOperand { position: 'A', .. }
        ));
        assert!(matches!(errs.0[4], ParseError::TooManyOperands { max: 2, .. }));
    }

    #[test]
    fn unsupported_statements_are_rejected() {
        for op in ["PREEMPT CAJA", "SPLIT 1,OTRO", "T1 TABLE M1,0,10,5", "V VARIABLE 3"] {
            let text = format!(" GENERATE 1\n {op}\n TERMINATE 1\n");
            let errs = parse_model(&text).unwrap_err();
            assert!(
                matches!(errs.0[0], ParseError::Unsupported { line: 2, .. }),
                "{op}: {errs}"
            );
        }
    }

    #[test]
    fn function_data_problems() {
        let errs = parse_model("F FUNCTION C1,D3\n1,1/2,2\n GENERATE 1\n TERMINATE 1\n").unwrap_err();
        assert!(matches!(
            errs.0[0],
            ParseError::FunctionPointCount {
                declared: 3,
                found: 2,
                ..
            }
        ));

        let errs = parse_model(" GENERATE 1\n TERMINATE 1\nF FUNCTION C1,D1\n").unwrap_err();
        assert!(matches!(errs.0[0], ParseError::MissingFunctionData { .. }));

        let errs = parse_model("F FUNCTION C1,X1\n1,1\n GENERATE 1\n TERMINATE 1\n").unwrap_err();
        assert!(matches!(errs.0[0], ParseError::FunctionKind { .. }));

        let errs = parse_model("F FUNCTION C1,D2\n1,1/2\n GENERATE 1\n TERMINATE 1\n").unwrap_err();
        assert!(matches!(errs.0[0], ParseError::FunctionPoint { .. }));
    }

    #[test]
    fn model_errors_are_wrapped() {
        let errs = parse_model("A GENERATE 1\nA TERMINATE 1\n").unwrap_err();
        assert!(matches!(
            errs.0[0],
            ParseError::Model(ModelError::DuplicateLabel { line: 2, .. })
        ));
        assert_eq!(errs.0[0].line(), Some(2));
    }

    #[test]
    fn storage_needs_literal_capacity() {
        let errs = parse_model("S STORAGE X\n GENERATE 1\n TERMINATE 1\n").unwrap_err();
        assert!(matches!(errs.0[0], ParseError::NotLiteral { .. }));
    }
}
