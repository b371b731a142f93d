//! Set difference of base and head symbol tables.

use std::collections::BTreeSet;

use crate::types::{ChangeType, Symbol, SymbolChange, SymbolKey, Version};

/// Added and removed identities, each sorted by [`SymbolKey`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolDiff {
    pub added: Vec<SymbolKey>,
    pub removed: Vec<SymbolKey>,
}

impl SymbolDiff {
    /// Flattens into change rows: every addition, then every removal.
    pub fn into_changes(self) -> Vec<SymbolChange> {
        let added = self
            .added
            .into_iter()
            .map(|key| SymbolChange { change_type: ChangeType::Added, key });
        let removed = self
            .removed
            .into_iter()
            .map(|key| SymbolChange { change_type: ChangeType::Removed, key });
        added.chain(removed).collect()
    }
}

/// Compares two identity collections: `added = head \ base`,
/// `removed = base \ head`. Duplicate identities collapse.
pub fn diff_keys<B, H>(base: B, head: H) -> SymbolDiff
where
    B: IntoIterator<Item = SymbolKey>,
    H: IntoIterator<Item = SymbolKey>,
{
    let base: BTreeSet<SymbolKey> = base.into_iter().collect();
    let head: BTreeSet<SymbolKey> = head.into_iter().collect();
    SymbolDiff {
        added: head.difference(&base).cloned().collect(),
        removed: base.difference(&head).cloned().collect(),
    }
}

/// Splits `symbols` by version tag and diffs them.
pub fn diff_symbols(symbols: &[Symbol]) -> SymbolDiff {
    let keys_for = |version: Version| {
        symbols
            .iter()
            .filter(move |s| s.version == version)
            .map(Symbol::key)
    };
    diff_keys(keys_for(Version::Base), keys_for(Version::Head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolKind;

    fn key(path: &str, name: &str) -> SymbolKey {
        SymbolKey {
            path: path.to_owned(),
            package: "pkg".to_owned(),
            kind: SymbolKind::Func,
            receiver: String::new(),
            name: name.to_owned(),
        }
    }

    fn sym(version: Version, name: &str, line: u32, signature: &str) -> Symbol {
        Symbol {
            version,
            path: "a.go".to_owned(),
            package: "pkg".to_owned(),
            name: name.to_owned(),
            kind: SymbolKind::Func,
            receiver: String::new(),
            line,
            signature: signature.to_owned(),
        }
    }

    #[test]
    fn added_and_removed_are_set_differences() {
        let d = diff_keys(
            vec![key("a.go", "A"), key("a.go", "B")],
            vec![key("a.go", "B"), key("a.go", "C")],
        );
        assert_eq!(d.added, vec![key("a.go", "C")]);
        assert_eq!(d.removed, vec![key("a.go", "A")]);
    }

    #[test]
    fn output_is_sorted_and_stable() {
        let head = vec![key("z.go", "Z"), key("a.go", "Y"), key("a.go", "X"), key("a.go", "X")];
        let first = diff_keys(Vec::new(), head.clone());
        let second = diff_keys(Vec::new(), head.into_iter().rev());
        assert_eq!(first, second);
        assert_eq!(first.added, vec![key("a.go", "X"), key("a.go", "Y"), key("z.go", "Z")]);
    }

    #[test]
    fn line_and_signature_do_not_count() {
        let symbols = vec![
            sym(Version::Base, "Run", 10, "func Run"),
            sym(Version::Head, "Run", 42, "func  Run"),
        ];
        assert_eq!(diff_symbols(&symbols), SymbolDiff::default());
    }

    #[test]
    fn path_is_part_of_identity() {
        let d = diff_keys(vec![key("old.go", "F")], vec![key("new.go", "F")]);
        assert_eq!(d.added, vec![key("new.go", "F")]);
        assert_eq!(d.removed, vec![key("old.go", "F")]);
    }

    #[test]
    fn receiver_distinguishes_methods() {
        let mut on_a = key("a.go", "Close");
        on_a.kind = SymbolKind::Method;
        on_a.receiver = "A".to_owned();
        let mut on_b = on_a.clone();
        on_b.receiver = "B".to_owned();
        let d = diff_keys(vec![on_a.clone()], vec![on_b.clone()]);
        assert_eq!(d.added, vec![on_b]);
        assert_eq!(d.removed, vec![on_a]);
    }

    #[test]
    fn changes_list_additions_first() {
        let changes = diff_keys(vec![key("a.go", "A")], vec![key("a.go", "C")]).into_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, ChangeType::Added);
        assert_eq!(changes[1].change_type, ChangeType::Removed);
    }
}
