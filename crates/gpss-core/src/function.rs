//! FUNCTION entities: piecewise functions of an operand, used to scale
//! ASSIGN values.
//!
//! Arguments drawn from `RNj` are in thousandths (`0..=999`), so a point
//! list for a random argument is written on that scale.

use crate::id::EntityName;
use crate::operand::Operand;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    #[error("function {0} has no points")]
    Empty(EntityName),
    #[error("function {name}: x values must be strictly increasing (point {index})")]
    NotIncreasing { name: EntityName, index: usize },
}

/// How values between points are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FunctionKind {
    /// Step function: the y of the first point whose x is not below the
    /// argument.
    Discrete,
    /// Linear interpolation between neighbouring points.
    Continuous,
}

#[derive(Debug, Clone)]
pub struct Function {
    name: EntityName,
    argument: Operand,
    kind: FunctionKind,
    points: Vec<(i64, i64)>,
}

impl Function {
    pub fn new(
        name: EntityName,
        argument: Operand,
        kind: FunctionKind,
        points: Vec<(i64, i64)>,
    ) -> Result<Self, FunctionError> {
        if points.is_empty() {
            return Err(FunctionError::Empty(name));
        }
        if let Some(index) = points.windows(2).position(|w| w[1].0 <= w[0].0) {
            return Err(FunctionError::NotIncreasing {
                name,
                index: index + 1,
            });
        }
        Ok(Self {
            name,
            argument,
            kind,
            points,
        })
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn argument(&self) -> &Operand {
        &self.argument
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn points(&self) -> &[(i64, i64)] {
        &self.points
    }

    /// Value of the function at `x`. Arguments beyond the last point take
    /// its value.
    pub fn evaluate(&self, x: i64) -> i64 {
        let (first_x, first_y) = self.points[0];
        let (_, last_y) = self.points[self.points.len() - 1];
        match self.kind {
            FunctionKind::Discrete => self
                .points
                .iter()
                .find(|(px, _)| x <= *px)
                .map_or(last_y, |(_, y)| *y),
            FunctionKind::Continuous => {
                if x <= first_x {
                    return first_y;
                }
                for w in self.points.windows(2) {
                    let (x0, y0) = w[0];
                    let (x1, y1) = w[1];
                    if x <= x1 {
                        let num = (y1 - y0) as i128 * (x - x0) as i128;
                        return y0 + (num / (x1 - x0) as i128) as i64;
                    }
                }
                last_y
            }
        }
    }
}
