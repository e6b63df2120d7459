//! Query-driven function metrics over a tree-sitter syntax tree.
//!
//! A [`Grammar`] names two queries: one capturing function nodes (`@function`,
//! with an optional `@name`), one capturing branch points (`@branch`). Both
//! are compiled once into a [`QueryParser`]. Complexity is counted in a single
//! pass over the branch captures, each branch crediting every function whose
//! byte range contains it.

use anyhow::Context;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser as TsParser, Query, QueryCursor};

use super::{FunctionMetrics, Parser};

const FUNCTION_CAPTURE: &str = "function";
const NAME_CAPTURE: &str = "name";

/// Grammar plus the two query sources for one language.
pub struct Grammar {
    pub name: &'static str,
    pub language: Language,
    /// Captures `@function`, and `@name` where the function has one.
    pub functions: &'static str,
    /// Every capture counts as one branch point.
    pub branches: &'static str,
}

/// A grammar with its queries compiled.
pub struct QueryParser {
    name: &'static str,
    language: Language,
    functions: Query,
    branches: Query,
    function_index: u32,
    name_index: Option<u32>,
}

impl QueryParser {
    pub fn compile(grammar: Grammar) -> anyhow::Result<Self> {
        let functions = Query::new(&grammar.language, grammar.functions)
            .with_context(|| format!("{} function query", grammar.name))?;
        let branches = Query::new(&grammar.language, grammar.branches)
            .with_context(|| format!("{} branch query", grammar.name))?;
        let function_index = functions
            .capture_index_for_name(FUNCTION_CAPTURE)
            .with_context(|| format!("{} function query has no @{}", grammar.name, FUNCTION_CAPTURE))?;
        let name_index = functions.capture_index_for_name(NAME_CAPTURE);

        Ok(Self {
            name: grammar.name,
            language: grammar.language,
            functions,
            branches,
            function_index,
            name_index,
        })
    }

    fn branch_offsets(&self, root: Node, source: &[u8]) -> Vec<usize> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.branches, root, source);
        let mut offsets = Vec::new();
        while let Some(m) = matches.next() {
            offsets.extend(m.captures.iter().map(|c| c.node.start_byte()));
        }
        offsets.sort_unstable();
        offsets
    }
}

impl Parser for QueryParser {
    fn functions(&self, source: &[u8]) -> anyhow::Result<Vec<FunctionMetrics>> {
        let mut ts = TsParser::new();
        ts.set_language(&self.language)?;
        let tree = ts
            .parse(source, None)
            .with_context(|| format!("{} parse was cancelled", self.name))?;
        let root = tree.root_node();
        let branches = self.branch_offsets(root, source);

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.functions, root, source);
        let mut out = Vec::new();
        while let Some(m) = matches.next() {
            let node = m
                .captures
                .iter()
                .find(|c| c.index == self.function_index)
                .map(|c| c.node);
            let Some(node) = node else { continue };
            let name = self.name_index.and_then(|idx| {
                m.captures
                    .iter()
                    .find(|c| c.index == idx)
                    .and_then(|c| c.node.utf8_text(source).ok())
                    .map(str::to_string)
            });

            let lo = branches.partition_point(|&b| b < node.start_byte());
            let hi = branches.partition_point(|&b| b < node.end_byte());
            out.push(FunctionMetrics {
                name,
                line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                complexity: 1 + (hi - lo) as u32,
            });
        }

        out.sort_by_key(|f| (f.line, f.end_line));
        out.dedup();
        Ok(out)
    }

    fn language(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::languages::go;

    #[test]
    fn test_missing_function_capture_is_rejected() {
        let grammar = Grammar {
            name: "go",
            language: tree_sitter_go::LANGUAGE.into(),
            functions: "(function_declaration) @func",
            branches: "(if_statement) @branch",
        };
        assert!(QueryParser::compile(grammar).is_err());
    }

    #[test]
    fn test_bad_query_is_rejected() {
        let grammar = Grammar {
            name: "go",
            language: tree_sitter_go::LANGUAGE.into(),
            functions: "(no_such_node) @function",
            branches: "(if_statement) @branch",
        };
        assert!(QueryParser::compile(grammar).is_err());
    }

    #[test]
    fn test_closure_branches_credit_enclosing_function() {
        let parser = QueryParser::compile(go::grammar()).unwrap();
        let source = br#"package jobs

func drain(ch chan int) int {
	total := 0
	each := func(v int) {
		if v > 0 {
			total += v
		}
	}
	for v := range ch {
		each(v)
	}
	return total
}
"#;
        let functions = parser.functions(source).unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name.as_deref(), Some("drain"));
        assert_eq!((functions[0].line, functions[0].end_line), (3, 14));
        // 1 + if (inside the closure) + for
        assert_eq!(functions[0].complexity, 3);
    }
}
