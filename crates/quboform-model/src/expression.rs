use std::collections::BTreeMap;

/// Sparse linear form `Σ aᵢ·xᵢ` keyed by variable index
///
/// Absent indices have coefficient zero; terms that cancel out are removed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<(usize, f64)>", into = "Vec<(usize, f64)>"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    coefficients: BTreeMap<usize, f64>,
}

impl LinearExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an expression from `(index, coefficient)` pairs, summing repeats
    pub fn from_terms(terms: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut expr = Self::new();
        for (index, coef) in terms {
            expr.add_term(index, coef);
        }
        expr
    }

    pub fn add_term(&mut self, index: usize, coef: f64) {
        let entry = self.coefficients.entry(index).or_insert(0.0);
        *entry += coef;
        if *entry == 0.0 {
            self.coefficients.remove(&index);
        }
    }

    pub fn add(&mut self, other: &LinearExpression) {
        for (index, coef) in other.iter() {
            self.add_term(index, coef);
        }
    }

    pub fn coefficient(&self, index: usize) -> f64 {
        self.coefficients.get(&index).copied().unwrap_or(0.0)
    }

    /// Terms in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients.iter().map(|(&index, &coef)| (index, coef))
    }

    pub fn variables(&self) -> impl Iterator<Item = usize> + '_ {
        self.coefficients.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.iter()
            .map(|(index, coef)| coef * values.get(index).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_terms(self.iter().map(|(index, coef)| (index, coef * factor)))
    }

    pub fn abs_sum(&self) -> f64 {
        self.coefficients.values().map(|c| c.abs()).sum()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.coefficients.keys().next_back().copied()
    }
}

impl From<Vec<(usize, f64)>> for LinearExpression {
    fn from(terms: Vec<(usize, f64)>) -> Self {
        Self::from_terms(terms)
    }
}

impl From<LinearExpression> for Vec<(usize, f64)> {
    fn from(expr: LinearExpression) -> Self {
        expr.coefficients.into_iter().collect()
    }
}

/// Sparse quadratic form `Σ qᵢⱼ·xᵢ·xⱼ` over unordered index pairs
///
/// Pairs are stored as `(min, max)`, so `(i, j)` and `(j, i)` address the same
/// term. Diagonal pairs `(i, i)` hold squared contributions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<(usize, usize, f64)>", into = "Vec<(usize, usize, f64)>")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadraticExpression {
    coefficients: BTreeMap<(usize, usize), f64>,
}

impl QuadraticExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms(terms: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let mut expr = Self::new();
        for (i, j, coef) in terms {
            expr.add_term(i, j, coef);
        }
        expr
    }

    pub fn add_term(&mut self, i: usize, j: usize, coef: f64) {
        let key = (i.min(j), i.max(j));
        let entry = self.coefficients.entry(key).or_insert(0.0);
        *entry += coef;
        if *entry == 0.0 {
            self.coefficients.remove(&key);
        }
    }

    pub fn add(&mut self, other: &QuadraticExpression) {
        for (i, j, coef) in other.iter() {
            self.add_term(i, j, coef);
        }
    }

    pub fn coefficient(&self, i: usize, j: usize) -> f64 {
        self.coefficients
            .get(&(i.min(j), i.max(j)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Terms as `(i, j, coef)` with `i <= j`, in ascending pair order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.coefficients.iter().map(|(&(i, j), &coef)| (i, j, coef))
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let value = |index: usize| values.get(index).copied().unwrap_or(0.0);
        self.iter().map(|(i, j, coef)| coef * value(i) * value(j)).sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_terms(self.iter().map(|(i, j, coef)| (i, j, coef * factor)))
    }

    pub fn abs_sum(&self) -> f64 {
        self.coefficients.values().map(|c| c.abs()).sum()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.coefficients.keys().map(|&(_, j)| j).max()
    }
}

impl From<Vec<(usize, usize, f64)>> for QuadraticExpression {
    fn from(terms: Vec<(usize, usize, f64)>) -> Self {
        Self::from_terms(terms)
    }
}

impl From<QuadraticExpression> for Vec<(usize, usize, f64)> {
    fn from(expr: QuadraticExpression) -> Self {
        expr.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_terms_accumulate_and_cancel() {
        let mut expr = LinearExpression::from_terms([(0, 3.0), (1, 2.0), (0, 1.0)]);
        assert_eq!(expr.coefficient(0), 4.0);
        assert_eq!(expr.len(), 2);

        expr.add_term(1, -2.0);
        assert_eq!(expr.coefficient(1), 0.0);
        assert_eq!(expr.len(), 1);
    }

    #[test]
    fn test_linear_evaluate() {
        let expr = LinearExpression::from_terms([(0, 3.0), (2, -1.5)]);
        assert_eq!(expr.evaluate(&[1.0, 5.0, 2.0]), 0.0);
        assert_eq!(expr.evaluate(&[2.0, 0.0, 0.0]), 6.0);
    }

    #[test]
    fn test_quadratic_pairs_are_unordered() {
        let mut expr = QuadraticExpression::new();
        expr.add_term(2, 0, 1.0);
        expr.add_term(0, 2, 2.0);
        assert_eq!(expr.len(), 1);
        assert_eq!(expr.coefficient(2, 0), 3.0);
        assert_eq!(expr.iter().collect::<Vec<_>>(), vec![(0, 2, 3.0)]);
    }

    #[test]
    fn test_quadratic_evaluate_with_diagonal() {
        let expr = QuadraticExpression::from_terms([(0, 0, 2.0), (0, 1, -1.0)]);
        // 2·3² − 3·4
        assert_eq!(expr.evaluate(&[3.0, 4.0]), 6.0);
    }

    #[test]
    fn test_scaled_and_abs_sum() {
        let lin = LinearExpression::from_terms([(0, 3.0), (1, -2.0)]).scaled(-1.0);
        assert_eq!(lin.coefficient(0), -3.0);
        assert_eq!(lin.abs_sum(), 5.0);

        let quad = QuadraticExpression::from_terms([(0, 1, 4.0)]).scaled(0.5);
        assert_eq!(quad.coefficient(1, 0), 2.0);
        assert_eq!(quad.max_index(), Some(1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_expression_json_shape() {
        let quad = QuadraticExpression::from_terms([(1, 0, 2.5)]);
        let json = serde_json::to_string(&quad).unwrap();
        assert_eq!(json, "[[0,1,2.5]]");

        let lin: LinearExpression = serde_json::from_str("[[3, 1.0], [3, 1.0]]").unwrap();
        assert_eq!(lin.coefficient(3), 2.0);
    }
}
