//! Python: `def` and `async def`, at any depth.

use crate::parser::treesitter::Grammar;

const FUNCTIONS: &str = r#"
(function_definition name: (identifier) @name) @function
"#;

/// Conditionals, loops, exception handling, context managers and
/// short-circuit operators. Comprehension clauses are not branches.
const BRANCHES: &str = r#"
[
  (if_statement) (elif_clause) (conditional_expression)
  (for_statement) (while_statement)
  (try_statement) (except_clause) (with_statement)
  (boolean_operator)
] @branch
"#;

pub fn grammar() -> Grammar {
    Grammar {
        name: "python",
        language: tree_sitter_python::LANGUAGE.into(),
        functions: FUNCTIONS,
        branches: BRANCHES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::treesitter::QueryParser;
    use crate::parser::{FunctionMetrics, Parser};

    fn parse(source: &str) -> Vec<FunctionMetrics> {
        QueryParser::compile(grammar())
            .unwrap()
            .functions(source.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_straight_line_function() {
        let functions = parse("def area(w, h):\n    return w * h\n");
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name.as_deref(), Some("area"));
        assert_eq!(functions[0].complexity, 1);
    }

    #[test]
    fn test_elif_chain() {
        let src = "def sign(n):\n    if n > 0:\n        return 1\n    elif n < 0:\n        return -1\n    return 0\n";
        // if + elif
        assert_eq!(parse(src)[0].complexity, 3);
    }

    #[test]
    fn test_exceptions_and_short_circuit() {
        let src = "\
async def fetch(client, url, retries):
    try:
        if client and url:
            return await client.get(url)
    except TimeoutError:
        pass
    return retries or None
";
        // try + except + if + and + or
        assert_eq!(parse(src)[0].complexity, 6);
    }

    #[test]
    fn test_methods_and_spans() {
        let src = "\
class Cart:
    def total(self):
        return sum(i.price for i in self.items)

    def empty(self):
        return not self.items
";
        let functions = parse(src);
        let spans: Vec<(Option<&str>, usize, usize, u32)> = functions
            .iter()
            .map(|f| (f.name.as_deref(), f.line, f.end_line, f.complexity))
            .collect();
        assert_eq!(
            spans,
            vec![(Some("total"), 2, 3, 1), (Some("empty"), 5, 6, 1)]
        );
    }

    #[test]
    fn test_comprehension_filter_is_not_a_branch() {
        let src = "def f(xs):\n    return [x for x in xs if x]\n";
        assert_eq!(parse(src)[0].complexity, 1);

        let src = "def g(xs):\n    return {x: (1 if x else 0) for x in xs}\n";
        // the conditional expression only
        assert_eq!(parse(src)[0].complexity, 2);
    }
}
