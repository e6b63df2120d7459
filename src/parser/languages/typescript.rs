//! TypeScript and TSX. Both grammars keep the JavaScript node kinds the
//! queries use, so the queries are shared.

use super::javascript::{BRANCHES, FUNCTIONS};
use crate::parser::treesitter::Grammar;

pub fn typescript_grammar() -> Grammar {
    Grammar {
        name: "typescript",
        language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        functions: FUNCTIONS,
        branches: BRANCHES,
    }
}

pub fn tsx_grammar() -> Grammar {
    Grammar {
        name: "tsx",
        language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        functions: FUNCTIONS,
        branches: BRANCHES,
    }
}
