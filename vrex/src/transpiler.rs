//! Compilation with debug output
//!
//! Runs the same pipeline as [`compile`](crate::compile) but keeps the
//! intermediate stages around for inspection.

use crate::compiler::Builder;
use crate::error::Result;
use crate::template::Template;

/// Compile with the default flags, keeping the intermediate stages
///
/// # Example
/// ```
/// use vrex::compile_debug;
///
/// let result = compile_debug("name: \"abc\"").unwrap();
/// assert_eq!(result.output, "(?<name>abc)");
/// assert_eq!(result.flags, "sgmu");
/// ```
pub fn compile_debug(template: impl Into<Template>) -> Result<TranspileResult> {
    Builder::new().compile_debug(template)
}

impl Builder {
    /// Compile a template, keeping the intermediate stages
    pub fn compile_debug(&self, template: impl Into<Template>) -> Result<TranspileResult> {
        let template = template.into();
        let compilation = self.run(&template)?;

        let tokens = compilation
            .tokens
            .iter()
            .map(|token| token.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let ast = format!("{:?}", compilation.parsed.root);
        let input = compilation.source.prettify(compilation.source.text());
        let pattern = compilation.into_pattern();

        Ok(TranspileResult {
            input,
            tokens,
            ast,
            output: pattern.as_str().to_string(),
            flags: pattern.flags().to_string(),
        })
    }
}

/// Result of a compilation with debug information
#[derive(Debug, Clone)]
pub struct TranspileResult {
    /// The template text, interpolations shown as `${...}`
    pub input: String,
    /// The token stream, interpolations resolved
    pub tokens: String,
    /// The syntax tree (debug format)
    pub ast: String,
    /// The generated pattern
    pub output: String,
    /// The native flag string
    pub flags: String,
}

impl TranspileResult {
    /// Print a formatted report of the compilation
    pub fn report(&self) {
        println!("Compilation Report");
        println!("==================");
        println!("Input:  {}", self.input);
        println!("Tokens: {}", self.tokens);
        println!("AST:    {}", self.ast);
        println!("Output: /{}/{}", self.output, self.flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;

    #[test]
    fn test_compile_debug_simple_named_group() {
        let result = compile_debug("name: \"abc\"").unwrap();
        assert_eq!(result.input, "name: \"abc\"");
        assert_eq!(result.output, "(?<name>abc)");
        assert_eq!(result.tokens, "name: \"abc\"");
        assert!(result.ast.starts_with("Group"));
    }

    #[test]
    fn test_compile_debug_flags() {
        let result = builder().first().compile_debug("<ignore-case> digit").unwrap();
        assert_eq!(result.output, r"\d");
        assert_eq!(result.flags, "simu");
        assert_eq!(result.tokens, "<ignore-case> digit");
    }

    #[test]
    fn test_compile_debug_interpolation() {
        let result = compile_debug(Template::new("any ").interpolate("digit")).unwrap();
        assert_eq!(result.input, "any ${...}");
        assert_eq!(result.tokens, "any ${ digit }");
        assert_eq!(result.output, r".\d");
    }

    #[test]
    fn test_compile_debug_empty() {
        let result = compile_debug("").unwrap();
        assert_eq!(result.output, "");
        assert_eq!(result.tokens, "");
    }

    #[test]
    fn test_compile_debug_error() {
        assert!(compile_debug("(digit").is_err());
    }
}
