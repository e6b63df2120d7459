//! Go: functions and methods with receivers. Function literals are part of
//! their enclosing function.

use crate::parser::treesitter::Grammar;

const FUNCTIONS: &str = r#"
(function_declaration name: (identifier) @name) @function
(method_declaration name: (field_identifier) @name) @function
"#;

/// Conditionals, loops, every switch/select form and its cases, and
/// short-circuit operators.
const BRANCHES: &str = r#"
[
  (if_statement) (for_statement)
  (expression_switch_statement) (type_switch_statement) (select_statement)
  (expression_case) (type_case) (communication_case)
] @branch
(binary_expression operator: ["&&" "||"]) @branch
"#;

pub fn grammar() -> Grammar {
    Grammar {
        name: "go",
        language: tree_sitter_go::LANGUAGE.into(),
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
    fn test_methods_and_functions() {
        let src = "\
package store

type Bucket struct{ Limit int }

func (b *Bucket) Allow(n int) bool {
	return n > 0 && n <= b.Limit
}

func New() *Bucket { return &Bucket{Limit: 10} }
";
        let found: Vec<(Option<String>, u32)> = parse(src)
            .into_iter()
            .map(|f| (f.name, f.complexity))
            .collect();
        assert_eq!(
            found,
            vec![(Some("Allow".to_string()), 2), (Some("New".to_string()), 1)]
        );
    }

    #[test]
    fn test_select_cases() {
        let src = "\
package worker

func wait(done, tick chan struct{}) string {
	select {
	case <-done:
		return \"done\"
	case <-tick:
		return \"tick\"
	}
}
";
        // select + two communication cases
        assert_eq!(parse(src)[0].complexity, 4);
    }
}
