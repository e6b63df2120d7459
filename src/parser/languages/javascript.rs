//! JavaScript (JSX included). The TypeScript grammars reuse these queries.

use crate::parser::treesitter::Grammar;

/// Declarations, methods and arrow functions; arrows are anonymous.
pub(super) const FUNCTIONS: &str = r#"
(function_declaration name: (identifier) @name) @function
(method_definition name: (property_identifier) @name) @function
(arrow_function) @function
"#;

/// Conditionals, loops, switch cases, catch clauses and short-circuit
/// operators, nullish coalescing included.
pub(super) const BRANCHES: &str = r#"
[
  (if_statement) (ternary_expression)
  (for_statement) (for_in_statement) (while_statement) (do_statement)
  (switch_statement) (switch_case)
  (catch_clause)
] @branch
(binary_expression operator: ["&&" "||" "??"]) @branch
"#;

pub fn grammar() -> Grammar {
    Grammar {
        name: "javascript",
        language: tree_sitter_javascript::LANGUAGE.into(),
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
    fn test_declarations_methods_and_arrows() {
        let src = "\
export function route(req) {
  return req.path;
}

class Store {
  get(key) {
    return this.map[key];
  }
}

const double = (n) => n * 2;
";
        let functions = parse(src);
        let found: Vec<(Option<&str>, usize)> = functions
            .iter()
            .map(|f| (f.name.as_deref(), f.line))
            .collect();
        assert_eq!(found, vec![(Some("route"), 1), (Some("get"), 6), (None, 11)]);
    }

    #[test]
    fn test_logical_operators_and_loops() {
        let src = "\
function pickUser(users, fallback) {
  const base = fallback ?? {};
  for (const u of users) {
    if (u.active && !u.banned) {
      return u;
    }
  }
  return base || null;
}
";
        // ?? + for-of + if + && + ||
        assert_eq!(parse(src)[0].complexity, 6);
    }

    #[test]
    fn test_switch_counts_cases_not_default() {
        let src = "\
function label(code) {
  switch (code) {
    case 200: return 'ok';
    case 404: return 'missing';
    default: return 'error';
  }
}
";
        // switch + two cases
        assert_eq!(parse(src)[0].complexity, 4);
    }
}
