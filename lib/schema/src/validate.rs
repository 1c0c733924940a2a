use elastic_dql_core::{Error, Expr, Result};

/// Whole-tree check run by a schema before compilation.
///
/// The validator also identifies the schema flavour: the registry rebuilds a
/// cached schema when it is asked for one with a different validator kind.
pub trait ExprValidator: Send + Sync {
    fn validate(&self, expr: &Expr) -> Result<()>;

    /// Identity of the validator, parameters included
    fn kind(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Accepts every tree
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl ExprValidator for NoopValidator {
    fn validate(&self, _expr: &Expr) -> Result<()> {
        Ok(())
    }
}

/// Rejects trees nested deeper than `max_depth`
#[derive(Debug, Clone, Copy)]
pub struct DepthLimitValidator {
    max_depth: usize,
}

impl DepthLimitValidator {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for DepthLimitValidator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH)
    }
}

impl ExprValidator for DepthLimitValidator {
    fn kind(&self) -> String {
        format!("{}({})", std::any::type_name::<Self>(), self.max_depth)
    }

    fn validate(&self, expr: &Expr) -> Result<()> {
        let depth = expr.depth();
        if depth > self.max_depth {
            return Err(Error::InvalidExpression(format!(
                "expression depth {} exceeds maximum of {}",
                depth, self.max_depth
            )));
        }
        Ok(())
    }
}
