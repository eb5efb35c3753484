//! Code block language resolution and syntax highlighting.
//!
//! Highlighting is class based (`<span class="source rust">…`) so the
//! stylesheet decides colours, the same way highlight.js themes work.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::Result;

/// Loaded once; building the default set parses every bundled grammar.
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

pub const PLAIN_TEXT: &str = "plaintext";

/// A resolved code block language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Normalised token, e.g. `rust`, `plaintext`.
    pub token: String,
    /// Human readable label shown in the code header.
    pub display_name: String,
    /// True when the info string was missing or unknown.
    pub detected: bool,
}

/// Resolves the fence info string, falling back to detection from the code.
pub fn resolve_language(info: &str, code: &str) -> Language {
    let requested = info
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if !requested.is_empty() && find_syntax(&requested).is_some() {
        return Language {
            display_name: display_name(&requested),
            token: requested,
            detected: false,
        };
    }

    let token = infer_language(code).unwrap_or(PLAIN_TEXT).to_string();
    Language {
        display_name: display_name(&token),
        token,
        detected: true,
    }
}

fn find_syntax(token: &str) -> Option<&'static SyntaxReference> {
    let token = match token {
        "plaintext" | "text" | "txt" => return Some(SYNTAX_SET.find_syntax_plain_text()),
        "ts" | "tsx" | "typescript" => "js",
        "jsx" | "javascript" => "js",
        "shell" | "zsh" | "console" => "bash",
        "csharp" | "c#" => "cs",
        "c++" => "cpp",
        "golang" => "go",
        "yml" => "yaml",
        "py" => "python",
        "rs" => "rust",
        "rb" => "ruby",
        "md" => "markdown",
        other => other,
    };
    SYNTAX_SET
        .find_syntax_by_token(token)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(token))
}

/// Label for the code header.
pub fn display_name(token: &str) -> String {
    let known = match token {
        "js" | "javascript" => "JavaScript",
        "ts" | "typescript" => "TypeScript",
        "jsx" => "React JSX",
        "tsx" => "React TSX",
        "html" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "python" | "py" => "Python",
        "ruby" | "rb" => "Ruby",
        "go" | "golang" => "Go",
        "rust" | "rs" => "Rust",
        "java" => "Java",
        "csharp" | "cs" | "c#" => "C#",
        "cpp" | "c++" => "C++",
        "c" => "C",
        "php" => "PHP",
        "bash" | "sh" | "shell" | "zsh" => "Shell",
        "sql" => "SQL",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "markdown" | "md" => "Markdown",
        "plaintext" | "text" | "txt" => "Text",
        _ => "",
    };
    if !known.is_empty() {
        return known.to_string();
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Text".to_string(),
    }
}

/// Best-effort guess from the code itself: shebang / first-line grammars
/// first, then keyword heuristics for the languages models emit most.
pub fn infer_language(code: &str) -> Option<&'static str> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    let first_line = code.lines().next().unwrap_or("");
    if first_line.starts_with("#!") {
        if first_line.contains("python") {
            return Some("python");
        }
        if first_line.contains("node") {
            return Some("js");
        }
        if first_line.contains("sh") {
            return Some("bash");
        }
    }
    if first_line.starts_with("<?php") {
        return Some("php");
    }

    if ((code.starts_with('{') && code.ends_with('}'))
        || (code.starts_with('[') && code.ends_with(']')))
        && code.contains("\":")
    {
        return Some("json");
    }
    if ["<!DOCTYPE", "<html", "<div"].iter().any(|tag| code.starts_with(tag)) {
        return Some("html");
    }
    if code.contains("fn ") && (code.contains("let ") || code.contains("->") || code.contains("::")) {
        return Some("rust");
    }
    if (code.contains("def ") && code.contains(':'))
        || (code.contains("import ") && !code.contains(';') && code.contains("print("))
    {
        return Some("python");
    }
    if code.contains("package main") || (code.contains("func ") && code.contains(":=")) {
        return Some("go");
    }
    if code.contains("public class ") || code.contains("public static void main") {
        return Some("java");
    }
    if code.contains("#include") {
        return Some("cpp");
    }
    if (code.contains("interface ") && code.contains(": "))
        || code.contains(": string")
        || code.contains(": number")
    {
        return Some("ts");
    }
    if code.contains("function ")
        || (code.contains("const ") && code.contains("=>"))
        || code.contains("console.log")
    {
        return Some("js");
    }
    let lower = code.to_ascii_lowercase();
    if ["select ", "insert into", "create table", "update "]
        .iter()
        .any(|kw| lower.starts_with(kw))
    {
        return Some("sql");
    }
    if (code.contains("[package]") || code.contains("[dependencies]")) && code.contains(" = ") {
        return Some("toml");
    }
    let command_starts = [
        "$ ", "cargo ", "npm ", "npx ", "yarn ", "pnpm ", "git ", "cd ", "sudo ", "pip ", "curl ", "docker ",
    ];
    if command_starts.iter().any(|cmd| first_line.starts_with(cmd)) {
        return Some("bash");
    }
    None
}

/// Highlights `code` as `language`, producing span markup for the inside of
/// `<pre><code>`.
pub fn highlight(code: &str, language: &Language) -> Result<String> {
    let syntax = find_syntax(&language.token).unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}
