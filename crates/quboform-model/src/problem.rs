use std::collections::HashMap;
use std::fmt;

use crate::error::ModelError;
use crate::expression::{LinearExpression, QuadraticExpression};
use crate::variable::{Domain, Variable};
use crate::violation::ConstraintViolation;

/// Whether the objective is to be minimized or maximized
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    /// `1.0` for minimization, `-1.0` for maximization
    pub fn sign(self) -> f64 {
        match self {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        }
    }

    pub fn flipped(self) -> Sense {
        match self {
            Sense::Minimize => Sense::Maximize,
            Sense::Maximize => Sense::Minimize,
        }
    }
}

/// `constant + linear + quadratic`, minimized or maximized
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constant: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub linear: LinearExpression,
    #[cfg_attr(feature = "serde", serde(default))]
    pub quadratic: QuadraticExpression,
}

impl Objective {
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant + self.linear.evaluate(values) + self.quadratic.evaluate(values)
    }

    /// The same objective with every coefficient negated and the sense flipped
    pub fn negated(&self) -> Objective {
        Objective {
            sense: self.sense.flipped(),
            constant: -self.constant,
            linear: self.linear.scaled(-1.0),
            quadratic: self.quadratic.scaled(-1.0),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (==)
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Eq,
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSense::Le => write!(f, "<="),
            ConstraintSense::Ge => write!(f, ">="),
            ConstraintSense::Eq => write!(f, "=="),
        }
    }
}

/// `linear + quadratic  (<= | >= | ==)  rhs`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub linear: LinearExpression,
    /// Empty for linear constraints
    #[cfg_attr(feature = "serde", serde(default))]
    pub quadratic: QuadraticExpression,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl Constraint {
    pub fn linear(
        name: impl Into<String>,
        linear: LinearExpression,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            linear,
            quadratic: QuadraticExpression::new(),
            sense,
            rhs,
        }
    }

    pub fn is_linear(&self) -> bool {
        self.quadratic.is_empty()
    }

    /// Value of the left-hand side
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.linear.evaluate(values) + self.quadratic.evaluate(values)
    }

    /// How far the left-hand side is from satisfying the constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.evaluate(values);
        match self.sense {
            ConstraintSense::Le => (lhs - self.rhs).max(0.0),
            ConstraintSense::Ge => (self.rhs - lhs).max(0.0),
            ConstraintSense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) <= tolerance
    }

    fn max_index(&self) -> Option<usize> {
        self.linear.max_index().max(self.quadratic.max_index())
    }
}

/// An optimization problem over binary and bounded integer variables
///
/// Variables are addressed by index; their order is the order of every
/// coefficient and solution vector. Names are unique.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ProblemData", into = "ProblemData"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    name: String,
    variables: Vec<Variable>,
    objective: Objective,
    constraints: Vec<Constraint>,
    names: HashMap<String, usize>,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            objective: Objective::default(),
            constraints: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_variable(&mut self, name: impl Into<String>, domain: Domain) -> Result<usize, ModelError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(ModelError::DuplicateVariable(name));
        }
        if let Domain::Integer { lower, upper } = domain {
            if lower > upper {
                return Err(ModelError::InvalidBounds { name, lower, upper });
            }
        }
        let index = self.variables.len();
        self.names.insert(name.clone(), index);
        self.variables.push(Variable { name, domain, index });
        Ok(index)
    }

    pub fn binary_var(&mut self, name: impl Into<String>) -> Result<usize, ModelError> {
        self.add_variable(name, Domain::Binary)
    }

    pub fn integer_var(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> Result<usize, ModelError> {
        self.add_variable(name, Domain::Integer { lower, upper })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<(), ModelError> {
        let max = objective.linear.max_index().max(objective.quadratic.max_index());
        self.check_index(max)?;
        self.objective = objective;
        Ok(())
    }

    pub fn minimize(
        &mut self,
        constant: f64,
        linear: LinearExpression,
        quadratic: QuadraticExpression,
    ) -> Result<(), ModelError> {
        self.set_objective(Objective {
            sense: Sense::Minimize,
            constant,
            linear,
            quadratic,
        })
    }

    pub fn maximize(
        &mut self,
        constant: f64,
        linear: LinearExpression,
        quadratic: QuadraticExpression,
    ) -> Result<(), ModelError> {
        self.set_objective(Objective {
            sense: Sense::Maximize,
            constant,
            linear,
            quadratic,
        })
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Add a constraint; an empty name is replaced by `c{n}`
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<(), ModelError> {
        self.check_index(constraint.max_index())?;
        if constraint.name.is_empty() {
            constraint.name = format!("c{}", self.constraints.len());
        }
        if self.constraint(&constraint.name).is_some() {
            return Err(ModelError::DuplicateConstraint(constraint.name));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn linear_constraint(
        &mut self,
        name: impl Into<String>,
        linear: LinearExpression,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Result<(), ModelError> {
        self.add_constraint(Constraint::linear(name, linear, sense, rhs))
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> Result<f64, ModelError> {
        self.check_len(values)?;
        Ok(self.objective.evaluate(values))
    }

    /// Find which constraints and domains are violated by `values`, worst first
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Result<Vec<ConstraintViolation>, ModelError> {
        self.check_len(values)?;
        let mut violations = Vec::new();

        for var in &self.variables {
            let value = values[var.index];
            if !var.domain.contains(value, tolerance) {
                violations.push(ConstraintViolation::domain(var, value));
            }
        }

        for c in &self.constraints {
            let amount = c.violation(values);
            if amount > tolerance {
                violations.push(ConstraintViolation::constraint(c, c.evaluate(values), amount));
            }
        }

        violations.sort_by(|a, b| {
            b.violation_amount
                .partial_cmp(&a.violation_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(violations)
    }

    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> Result<bool, ModelError> {
        Ok(self.violations(values, tolerance)?.is_empty())
    }

    /// No constraints and only binary variables
    pub fn is_qubo(&self) -> bool {
        self.constraints.is_empty() && self.variables.iter().all(Variable::is_binary)
    }

    fn check_index(&self, max: Option<usize>) -> Result<(), ModelError> {
        match max {
            Some(index) if index >= self.variables.len() => Err(ModelError::UnknownVariable {
                index,
                count: self.variables.len(),
            }),
            _ => Ok(()),
        }
    }

    fn check_len(&self, values: &[f64]) -> Result<(), ModelError> {
        if values.len() != self.variables.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.variables.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }
}

/// Wire form of [`Problem`]; deserialized problems are rebuilt through the
/// validating builder.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct ProblemData {
    #[serde(default)]
    name: String,
    variables: Vec<VariableData>,
    #[serde(default)]
    objective: Objective,
    #[serde(default)]
    constraints: Vec<Constraint>,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct VariableData {
    name: String,
    domain: Domain,
}

#[cfg(feature = "serde")]
impl TryFrom<ProblemData> for Problem {
    type Error = ModelError;

    fn try_from(data: ProblemData) -> Result<Self, Self::Error> {
        let mut problem = Problem::new(data.name);
        for var in data.variables {
            problem.add_variable(var.name, var.domain)?;
        }
        problem.set_objective(data.objective)?;
        for c in data.constraints {
            problem.add_constraint(c)?;
        }
        Ok(problem)
    }
}

#[cfg(feature = "serde")]
impl From<Problem> for ProblemData {
    fn from(problem: Problem) -> Self {
        Self {
            name: problem.name,
            variables: problem
                .variables
                .into_iter()
                .map(|v| VariableData {
                    name: v.name,
                    domain: v.domain,
                })
                .collect(),
            objective: problem.objective,
            constraints: problem.constraints,
        }
    }
}
