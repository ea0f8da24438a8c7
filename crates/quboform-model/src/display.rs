use std::fmt;

use crate::expression::{LinearExpression, QuadraticExpression};
use crate::problem::{Problem, Sense};
use crate::variable::Domain;

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

fn term(coef: f64, name: &str, is_head: bool) -> String {
    if is_head {
        if is_close(coef, 1.0) {
            name.to_string()
        } else if is_close(coef, -1.0) {
            format!("-{}", name)
        } else {
            format!("{}{}", coef, name)
        }
    } else {
        let sign = if coef < 0.0 { "-" } else { "+" };
        let abs = coef.abs();
        if is_close(abs, 1.0) {
            format!("{} {}", sign, name)
        } else {
            format!("{} {}{}", sign, abs, name)
        }
    }
}

/// Render `constant + quadratic + linear` using the problem's variable names
fn expression(
    problem: &Problem,
    constant: f64,
    linear: &LinearExpression,
    quadratic: &QuadraticExpression,
) -> String {
    let name = |index: usize| {
        problem
            .variable(index)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| format!("x{}", index))
    };

    let mut parts = Vec::new();
    if constant.abs() > 1e-10 {
        parts.push(format!("{}", constant));
    } else if linear.is_empty() && quadratic.is_empty() {
        parts.push("0".to_string());
    }

    for (i, j, coef) in quadratic.iter() {
        let label = if i == j {
            format!("{}^2", name(i))
        } else {
            format!("{} * {}", name(i), name(j))
        };
        parts.push(term(coef, &label, parts.is_empty()));
    }

    for (i, coef) in linear.iter() {
        parts.push(term(coef, &name(i), parts.is_empty()));
    }

    parts.join(" ")
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem name: {}", self.name())?;
        writeln!(f)?;
        match self.objective().sense {
            Sense::Minimize => writeln!(f, "Minimize")?,
            Sense::Maximize => writeln!(f, "Maximize")?,
        }
        let objective = self.objective();
        writeln!(
            f,
            "  {}",
            expression(self, objective.constant, &objective.linear, &objective.quadratic)
        )?;

        writeln!(f)?;
        writeln!(f, "Subject to")?;
        if self.constraints().is_empty() {
            writeln!(f, "  No constraints")?;
        }
        for c in self.constraints() {
            writeln!(
                f,
                "  {}: {} {} {}",
                c.name,
                expression(self, 0.0, &c.linear, &c.quadratic),
                c.sense,
                c.rhs
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Variables")?;
        if self.variables().is_empty() {
            writeln!(f, "  No variables")?;
        }
        for var in self.variables() {
            let label = format!("{}:", var.domain);
            match var.domain {
                Domain::Binary => writeln!(f, "  {:<12}{}", label, var.name)?,
                Domain::Integer { lower, upper } => {
                    writeln!(f, "  {:<12}{} <= {} <= {}", label, lower, var.name, upper)?
                }
            }
        }
        Ok(())
    }
}
