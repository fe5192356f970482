//! Model construction: statements in source order in, a linked block chain
//! and a populated entity registry out.
//!
//! All integrity problems are collected before giving up, so a model with
//! several mistakes reports all of them at once.

use crate::block::{Block, BlockKind};
use crate::function::{Function, FunctionError};
use crate::id::{BlockId, EntityName};
use crate::registry::{Registry, RegistryError};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("line {line}: label {label} already defined on line {first_line}")]
    DuplicateLabel {
        label: String,
        line: usize,
        first_line: usize,
    },
    #[error("line {line}: {operation} needs a name in the label field")]
    MissingName { line: usize, operation: &'static str },
    #[error("line {line}: {source}")]
    Entity {
        line: usize,
        #[source]
        source: RegistryError,
    },
    #[error("line {line}: {source}")]
    Function {
        line: usize,
        #[source]
        source: FunctionError,
    },
    #[error("line {line}: {operation} declaration splits the block chain")]
    DeclarationInChain { line: usize, operation: &'static str },
    #[error("model has no transactional blocks")]
    NoBlocks,
}

impl ModelError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ModelError::DuplicateLabel { line, .. }
            | ModelError::MissingName { line, .. }
            | ModelError::Entity { line, .. }
            | ModelError::Function { line, .. }
            | ModelError::DeclarationInChain { line, .. } => Some(*line),
            ModelError::NoBlocks => None,
        }
    }
}

/// Every error found while building a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelErrors(pub Vec<ModelError>);

impl std::error::Error for ModelErrors {}

impl fmt::Display for ModelErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model rejected with {} error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl ModelErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ModelError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A statement before linking.
#[derive(Debug, Clone)]
pub struct Statement {
    pub line: usize,
    pub label: Option<String>,
    pub text: String,
    pub kind: BlockKind,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects statements in source order.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    statements: Vec<Statement>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement with explicit source information.
    pub fn statement(&mut self, statement: Statement) -> &mut Self {
        self.statements.push(statement);
        self
    }

    /// Add a block with no source text. The line is its position in the
    /// model.
    pub fn block(&mut self, label: Option<&str>, kind: BlockKind) -> &mut Self {
        let line = self.statements.len() + 1;
        self.statements.push(Statement {
            line,
            label: label.map(str::to_string),
            text: kind.operation().to_string(),
            kind,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Link the transactional blocks, declare entities and check the model.
    pub fn build(self) -> Result<Model, ModelErrors> {
        let mut errors = Vec::new();
        let mut registry = Registry::new();
        let mut labels: HashMap<String, BlockId> = HashMap::new();
        let mut blocks: Vec<Block> = Vec::with_capacity(self.statements.len());

        // Line of a declaration seen after the chain started, if any.
        let mut pending_declaration: Option<(usize, &'static str)> = None;
        let mut last_executable: Option<BlockId> = None;

        for (index, stmt) in self.statements.into_iter().enumerate() {
            let id = BlockId(index as u32);

            if let Some(label) = &stmt.label {
                match labels.get(label) {
                    Some(first) => errors.push(ModelError::DuplicateLabel {
                        label: label.clone(),
                        line: stmt.line,
                        first_line: blocks[first.index()].line,
                    }),
                    None => {
                        labels.insert(label.clone(), id);
                    }
                }
            }

            let mut previous = None;
            if stmt.kind.is_executable() {
                if let Some((line, operation)) = pending_declaration.take() {
                    errors.push(ModelError::DeclarationInChain { line, operation });
                }
                if let Some(prev) = last_executable {
                    blocks[prev.index()].next = Some(id);
                    previous = Some(prev);
                }
                last_executable = Some(id);
            } else {
                if last_executable.is_some() && pending_declaration.is_none() {
                    pending_declaration = Some((stmt.line, stmt.kind.operation()));
                }
                declare(&mut registry, &stmt, &mut errors);
            }

            blocks.push(Block {
                id,
                line: stmt.line,
                label: stmt.label,
                number: index as u32 + 1,
                text: stmt.text,
                kind: stmt.kind,
                previous,
                next: None,
            });
        }

        if last_executable.is_none() {
            errors.push(ModelError::NoBlocks);
        }

        if errors.is_empty() {
            Ok(Model {
                blocks,
                labels,
                registry,
            })
        } else {
            Err(ModelErrors(errors))
        }
    }
}

fn declare(registry: &mut Registry, stmt: &Statement, errors: &mut Vec<ModelError>) {
    let operation = stmt.kind.operation();
    let Some(label) = &stmt.label else {
        errors.push(ModelError::MissingName {
            line: stmt.line,
            operation,
        });
        return;
    };
    let name = entity_name(label);
    let result = match &stmt.kind {
        BlockKind::Storage { capacity } => registry.declare_storage(name, *capacity).map(drop),
        BlockKind::Function {
            argument,
            kind,
            points,
        } => match Function::new(name, argument.clone(), *kind, points.clone()) {
            Ok(function) => registry.declare_function(function).map(drop),
            Err(source) => {
                errors.push(ModelError::Function {
                    line: stmt.line,
                    source,
                });
                return;
            }
        },
        _ => Ok(()),
    };
    if let Err(source) = result {
        errors.push(ModelError::Entity {
            line: stmt.line,
            source,
        });
    }
}

/// A declaration label that is all digits names a numbered entity.
fn entity_name(label: &str) -> EntityName {
    match label.parse::<u32>() {
        Ok(n) if n > 0 => EntityName::Numbered(n),
        _ => EntityName::Named(label.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A checked model, ready to simulate.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) blocks: Vec<Block>,
    pub(crate) labels: HashMap<String, BlockId>,
    pub(crate) registry: Registry,
}

impl Model {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_id(&self, label: &str) -> Option<BlockId> {
        self.labels.get(label).copied()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The first transactional block.
    pub fn first_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.executable())
    }
}
