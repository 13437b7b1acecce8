//! Python source parsing via tree-sitter.
//!
//! Two services for the checks:
//! - syntax validation with the line of the first error
//! - a code-only view of a file with comments and string contents blanked,
//!   so pattern checks can tell real invocations from prose

use std::cell::RefCell;
use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        if let Err(e) = p.set_language(&tree_sitter_python::LANGUAGE.into()) {
            log::error!("tree-sitter-python grammar rejected: {}", e);
        }
        p
    });
}

/// First syntax error found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

fn parse(source: &str) -> Option<Tree> {
    PYTHON_PARSER.with(|p| p.borrow_mut().parse(source, None))
}

/// Validate Python syntax, returning the first error on failure
pub fn check_python(source: &str) -> Result<(), SyntaxIssue> {
    let Some(tree) = parse(source) else {
        return Err(SyntaxIssue {
            line: 1,
            message: "source could not be parsed".to_string(),
        });
    };
    let root = tree.root_node();
    if !root.has_error() {
        return match first_legacy_construct(root, source) {
            Some((node, message)) => Err(SyntaxIssue {
                line: node.start_position().row + 1,
                message: message.to_string(),
            }),
            None => Ok(()),
        };
    }

    match first_error(root) {
        Some(node) => {
            let message = if node.is_missing() {
                format!("missing '{}'", node.kind())
            } else {
                "invalid syntax".to_string()
            };
            Err(SyntaxIssue {
                line: node.start_position().row + 1,
                message,
            })
        }
        None => Err(SyntaxIssue {
            line: root.start_position().row + 1,
            message: "invalid syntax".to_string(),
        }),
    }
}

/// Pre-order search for the first ERROR or MISSING node
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }

        // Only descend into subtrees that contain an error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// The grammar still accepts some Python 2 forms that CPython 3 refuses to
/// compile. Returns the first one with the interpreter's wording.
fn first_legacy_construct<'t>(root: Node<'t>, source: &str) -> Option<(Node<'t>, &'static str)> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let refused = match node.kind() {
            "print_statement" => Some("Missing parentheses in call to 'print'"),
            "exec_statement" => Some("Missing parentheses in call to 'exec'"),
            "integer" => source
                .get(node.start_byte()..node.end_byte())
                .and_then(legacy_integer),
            _ => None,
        };
        if let Some(message) = refused {
            return Some((node, message));
        }

        if cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// `0777` style octals and `10L` longs
fn legacy_integer(literal: &str) -> Option<&'static str> {
    if literal.ends_with(['l', 'L']) {
        return Some("invalid decimal literal");
    }
    let digits = literal.as_bytes();
    let leading_zero = digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit();
    // `00` is still legal, and `07j` is an imaginary literal
    let has_nonzero = digits.iter().any(|b| (b'1'..=b'9').contains(b));
    if leading_zero && has_nonzero && !literal.ends_with(['j', 'J']) {
        return Some(
            "leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers",
        );
    }
    None
}

/// Copy of `source` with comments and string literal contents replaced by
/// spaces. Line structure and byte offsets are preserved; f-string
/// interpolations stay visible as code.
pub fn code_only(source: &str) -> String {
    let Some(tree) = parse(source) else {
        return source.to_string();
    };

    let mut bytes = source.as_bytes().to_vec();
    let mut cursor = tree.root_node().walk();
    loop {
        let node = cursor.node();
        match node.kind() {
            "comment" | "string_content" => {
                for b in &mut bytes[node.start_byte()..node.end_byte()] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
            }
            _ => {}
        }

        if cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                // Node ranges sit on char boundaries, so blanking keeps UTF-8 valid
                return String::from_utf8(bytes)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_python() {
        let src = "import streamlit as st\n\ndef main():\n    st.title('Hi')\n\nmain()\n";
        assert!(check_python(src).is_ok());
    }

    #[test]
    fn test_syntax_error_line() {
        let src = "import streamlit as st\n\ndef main(:\n    pass\n";
        let issue = check_python(src).unwrap_err();
        assert_eq!(issue.line, 3);
        assert_eq!(issue.message, "missing ')'");
    }

    #[test]
    fn test_python2_statements_rejected() {
        let issue = check_python("import os
print 'hi'
").unwrap_err();
        assert_eq!(issue.line, 2);
        assert_eq!(issue.message, "Missing parentheses in call to 'print'");

        let issue = check_python("exec 'x = 1'
").unwrap_err();
        assert_eq!(issue.line, 1);
        assert_eq!(issue.message, "Missing parentheses in call to 'exec'");
    }

    #[test]
    fn test_legacy_octal_rejected() {
        let issue = check_python("x = 1
y = 0777
").unwrap_err();
        assert_eq!(issue.line, 2);
        assert!(issue.message.starts_with("leading zeros in decimal integer literals"));
    }

    #[test]
    fn test_python3_forms_still_valid() {
        assert!(check_python("print('hi')
exec('x = 1')
").is_ok());
        assert!(check_python("a = 0
b = 00
c = 0o777
d = 0x1F
e = 10
").is_ok());
    }

    #[test]
    fn test_legacy_integer_literals() {
        assert!(legacy_integer("0777").is_some());
        assert!(legacy_integer("10L").is_some());
        assert!(legacy_integer("07j").is_none());
        assert!(legacy_integer("000").is_none());
        assert!(legacy_integer("0").is_none());
        assert!(legacy_integer("1000").is_none());
    }

    #[test]
    fn test_code_only_blanks_comments_and_strings() {
        let src = "# st.column_config is banned\nx = \"st.column_config\"\ny = st.metric('a', 1)\n";
        let code = code_only(src);
        assert!(!code.contains("column_config"));
        assert!(code.contains("st.metric("));
        assert_eq!(code.len(), src.len());
        assert_eq!(code.lines().count(), src.lines().count());
    }

    #[test]
    fn test_code_only_keeps_fstring_interpolation() {
        let src = "label = f\"total {st.session_state.total}\"\n";
        let code = code_only(src);
        assert!(code.contains("st.session_state.total"));
        assert!(!code.contains("total {"));
    }

    #[test]
    fn test_code_only_docstring() {
        let src = "def f():\n    \"\"\"Avoid st.bar_chart here.\"\"\"\n    return 1\n";
        assert!(!code_only(src).contains("bar_chart"));
    }
}
