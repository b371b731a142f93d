//! Heuristic, line-local declaration extraction.
//!
//! Works on scrubbed text (see [`crate::scrub`]). Each physical line is fed
//! to [`DeclScanner::step`], which tries the rules below in order and stops
//! at the first one that claims the line:
//!
//! 1. grouped-declaration mode (`const (`, `var (`, `type (` ... `)`)
//! 2. `type Name ...`
//! 3. `const`/`var` with one or more comma-separated names before `=`
//! 4. `func (recv) Name(`
//! 5. `func Name(`
//!
//! While a group is open, rules 2-5 are not tried at all. Only names whose
//! first character is an ASCII upper-case letter are emitted.

use crate::scrub::scrub;
use crate::types::SymbolKind;

/// `const` or `var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKeyword {
    Const,
    Var,
}

impl ValueKeyword {
    fn as_str(self) -> &'static str {
        match self {
            ValueKeyword::Const => "const",
            ValueKeyword::Var => "var",
        }
    }

    fn kind(self) -> SymbolKind {
        match self {
            ValueKeyword::Const => SymbolKind::Const,
            ValueKeyword::Var => SymbolKind::Var,
        }
    }
}

/// One recognized declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Type { name: String },
    Value { keyword: ValueKeyword, name: String },
    Method { receiver_text: String, receiver: String, name: String },
    Func { name: String },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type { name }
            | Declaration::Value { name, .. }
            | Declaration::Method { name, .. }
            | Declaration::Func { name } => name,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Declaration::Type { .. } => SymbolKind::Type,
            Declaration::Value { keyword, .. } => keyword.kind(),
            Declaration::Method { .. } => SymbolKind::Method,
            Declaration::Func { .. } => SymbolKind::Func,
        }
    }

    /// Bare receiver type for methods, empty otherwise.
    pub fn receiver(&self) -> &str {
        match self {
            Declaration::Method { receiver, .. } => receiver,
            _ => "",
        }
    }

    /// Short reconstructed signature, not a re-rendering of the source.
    pub fn signature(&self) -> String {
        match self {
            Declaration::Type { name } => format!("type {name}"),
            Declaration::Value { keyword, name } => format!("{} {name}", keyword.as_str()),
            Declaration::Method { receiver_text, name, .. } => {
                format!("func ({receiver_text}) {name}")
            }
            Declaration::Func { name } => format!("func {name}"),
        }
    }
}

/// A declaration and the 1-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedDeclaration {
    pub line: u32,
    pub decl: Declaration,
}

/// Result of scanning one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// First `package` clause found, empty if none.
    pub package: String,
    pub declarations: Vec<LocatedDeclaration>,
}

/// Scanner mode between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    #[default]
    TopLevel,
    TypeGroup,
    ValueGroup(ValueKeyword),
}

/// Line-by-line declaration state machine.
#[derive(Debug, Default)]
pub struct DeclScanner {
    mode: BlockMode,
}

impl DeclScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    /// Consumes one scrubbed line and returns the declarations it carries.
    pub fn step(&mut self, line: &str) -> Vec<Declaration> {
        match self.mode {
            BlockMode::TypeGroup => {
                if closes_group(line) {
                    self.mode = BlockMode::TopLevel;
                    return Vec::new();
                }
                leading_exported_ident(line.trim_start())
                    .map(|name| vec![Declaration::Type { name: name.to_owned() }])
                    .unwrap_or_default()
            }
            BlockMode::ValueGroup(keyword) => {
                if closes_group(line) {
                    self.mode = BlockMode::TopLevel;
                    return Vec::new();
                }
                value_names(keyword, line)
            }
            BlockMode::TopLevel => self.step_top_level(line),
        }
    }

    fn step_top_level(&mut self, line: &str) -> Vec<Declaration> {
        let trimmed = line.trim_start();

        if let Some(mode) = opens_group(trimmed) {
            self.mode = mode;
            return Vec::new();
        }

        if let Some(rest) = after_keyword(trimmed, "type") {
            if let Some(name) = leading_exported_ident(rest) {
                return vec![Declaration::Type { name: name.to_owned() }];
            }
        }

        for keyword in [ValueKeyword::Const, ValueKeyword::Var] {
            if let Some(rest) = after_keyword(trimmed, keyword.as_str()) {
                // The keyword claims the line even when no name qualifies.
                if !rest.is_empty() {
                    return value_names(keyword, rest);
                }
            }
        }

        if let Some(rest) = after_keyword(trimmed, "func") {
            if let Some(decl) = method_decl(rest).or_else(|| func_decl(rest)) {
                return vec![decl];
            }
        }

        Vec::new()
    }
}

/// Scans scrubbed text.
pub fn scan(scrubbed: &str) -> Extraction {
    let mut scanner = DeclScanner::new();
    let mut declarations = Vec::new();
    for (idx, line) in scrubbed.lines().enumerate() {
        let line_no = idx as u32 + 1;
        declarations.extend(
            scanner
                .step(line)
                .into_iter()
                .map(|decl| LocatedDeclaration { line: line_no, decl }),
        );
    }
    Extraction { package: package_name(scrubbed), declarations }
}

/// Scrubs `src` and scans the result.
pub fn extract(src: &str) -> Extraction {
    scan(&scrub(src))
}

/// First `package <ident>` clause at the start of a line.
pub fn package_name(scrubbed: &str) -> String {
    scrubbed
        .lines()
        .find_map(|line| {
            let rest = after_keyword(line.trim_start(), "package")?;
            let ident = take_while_ident(rest);
            (!ident.is_empty()).then(|| ident.to_owned())
        })
        .unwrap_or_default()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_while_ident(s: &str) -> &str {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    &s[..end]
}

/// Name made only of identifier characters with an upper-case first letter.
fn is_exported_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) && name.chars().all(is_ident_char)
}

/// Exported identifier at the very start of `s`, ending at a word boundary.
fn leading_exported_ident(s: &str) -> Option<&str> {
    if !s.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let ident = take_while_ident(s);
    match s[ident.len()..].chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(ident),
    }
}

/// Text after `keyword` when the keyword is followed by whitespace; the
/// returned slice has that whitespace removed.
fn after_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

/// `const (`, `var (` or `type (` with nothing but blanks after the paren.
fn opens_group(trimmed: &str) -> Option<BlockMode> {
    let (mode, rest) = if let Some(rest) = trimmed.strip_prefix("const") {
        (BlockMode::ValueGroup(ValueKeyword::Const), rest)
    } else if let Some(rest) = trimmed.strip_prefix("var") {
        (BlockMode::ValueGroup(ValueKeyword::Var), rest)
    } else if let Some(rest) = trimmed.strip_prefix("type") {
        (BlockMode::TypeGroup, rest)
    } else {
        return None;
    };
    let rest = rest.trim_start().strip_prefix('(')?;
    rest.trim().is_empty().then_some(mode)
}

fn closes_group(line: &str) -> bool {
    line.trim_start().starts_with(')')
}

/// Names declared by a `const`/`var` spec: the comma-separated list before
/// the first `=`, keeping only exported names.
fn value_names(keyword: ValueKeyword, spec: &str) -> Vec<Declaration> {
    let before_eq = spec.split('=').next().unwrap_or_default();
    before_eq
        .split(',')
        .map(str::trim)
        .filter(|name| is_exported_name(name))
        .map(|name| Declaration::Value { keyword, name: name.to_owned() })
        .collect()
}

/// `(recv) Name(` following `func`.
fn method_decl(rest: &str) -> Option<Declaration> {
    let inner = rest.strip_prefix('(')?;
    let close = inner.find(')')?;
    let receiver_text = inner[..close].trim();
    let after = &inner[close + 1..];
    if !after.starts_with(char::is_whitespace) {
        return None;
    }
    let name = called_exported_ident(after.trim_start())?;
    let receiver = receiver_text
        .split_whitespace()
        .last()
        .map(|token| token.trim_start_matches('*'))
        .unwrap_or_default();
    Some(Declaration::Method {
        receiver_text: receiver_text.to_owned(),
        receiver: receiver.to_owned(),
        name: name.to_owned(),
    })
}

/// `Name(` following `func`.
fn func_decl(rest: &str) -> Option<Declaration> {
    called_exported_ident(rest).map(|name| Declaration::Func { name: name.to_owned() })
}

/// Exported identifier followed (after optional blanks) by `(`.
fn called_exported_ident(s: &str) -> Option<&str> {
    if !s.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let ident = take_while_ident(s);
    s[ident.len()..].trim_start().starts_with('(').then_some(ident)
}
