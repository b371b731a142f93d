//! Unified-diff hunk parsing.

use tracing::debug;

use crate::types::Hunk;

/// Line ranges carried by an `@@ -a,b +c,d @@` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HunkRange {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
}

/// Parses a hunk header line.
///
/// Only the `@@ -<start>[,<count>] +<start>[,<count>] @@` prefix is
/// examined; anything after the closing `@@` (a section heading) is
/// ignored. An omitted count means 1.
pub fn parse_header(line: &str) -> Option<HunkRange> {
    let rest = line.strip_prefix("@@ -")?;
    let (old_start, old_lines, rest) = parse_range(rest)?;
    let rest = rest.strip_prefix(" +")?;
    let (new_start, new_lines, rest) = parse_range(rest)?;
    rest.strip_prefix(" @@")?;
    Some(HunkRange { old_start, old_lines, new_start, new_lines })
}

/// Parses `<start>[,<count>]` and returns the remainder of the input.
fn parse_range(s: &str) -> Option<(u32, u32, &str)> {
    let (start, rest) = parse_number(s)?;
    match rest.strip_prefix(',') {
        Some(after_comma) => {
            let (count, rest) = parse_number(after_comma)?;
            Some((start, count, rest))
        }
        None => Some((start, 1, rest)),
    }
}

fn parse_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Splits one file's unified diff into hunks.
///
/// Lines before the first `@@` line (the `diff --git`/`---`/`+++` preamble)
/// belong to no hunk. A header that does not parse still opens a hunk, with
/// every range field set to zero.
pub fn parse_hunks(path: &str, diff_text: &str) -> Vec<Hunk> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut body: Vec<&str> = Vec::new();

    for line in diff_text.lines() {
        if line.starts_with("@@") {
            if let Some(open) = hunks.last_mut() {
                open.body = body.join("\n");
            }
            let range = parse_header(line).unwrap_or_else(|| {
                debug!(path, header = line, "unrecognized hunk header, recording zeroed ranges");
                HunkRange::default()
            });
            hunks.push(Hunk {
                path: path.to_owned(),
                hunk_index: hunks.len() as u32,
                old_start: range.old_start,
                old_lines: range.old_lines,
                new_start: range.new_start,
                new_lines: range.new_lines,
                header: line.to_owned(),
                body: String::new(),
            });
            body.clear();
            body.push(line);
        } else if !hunks.is_empty() {
            body.push(line);
        }
    }
    if let Some(open) = hunks.last_mut() {
        open.body = body.join("\n");
    }

    hunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_explicit_counts() {
        let r = parse_header("@@ -10,3 +12,5 @@").unwrap();
        assert_eq!(
            r,
            HunkRange { old_start: 10, old_lines: 3, new_start: 12, new_lines: 5 }
        );
    }

    #[test]
    fn omitted_counts_default_to_one() {
        let r = parse_header("@@ -1 +1 @@").unwrap();
        assert_eq!(r.old_lines, 1);
        assert_eq!(r.new_lines, 1);
    }

    #[test]
    fn section_heading_after_header_is_ignored() {
        let r = parse_header("@@ -7,6 +7,8 @@ func (s *Server) Run() error {").unwrap();
        assert_eq!((r.old_start, r.new_lines), (7, 8));
    }

    #[test]
    fn zero_count_for_empty_side() {
        let r = parse_header("@@ -0,0 +1,4 @@").unwrap();
        assert_eq!((r.old_start, r.old_lines, r.new_start, r.new_lines), (0, 0, 1, 4));
    }

    #[test]
    fn rejects_other_dialects() {
        assert!(parse_header("@@@ -1,2 -1,2 +1,3 @@@").is_none());
        assert!(parse_header("@@ -a,1 +1 @@").is_none());
        assert!(parse_header("@@ -1,2 +3,4").is_none());
    }

    #[test]
    fn splits_bodies_at_each_header() {
        let diff = "diff --git a/x.go b/x.go\n\
                    --- a/x.go\n\
                    +++ b/x.go\n\
                    @@ -1,2 +1,2 @@\n\
                    -old\n\
                    +new\n \
                    ctx\n\
                    @@ -20 +20,2 @@ func F() {\n\
                    +added\n";
        let hunks = parse_hunks("x.go", diff);
        assert_eq!(hunks.len(), 2);

        assert_eq!(hunks[0].hunk_index, 0);
        assert_eq!(hunks[0].header, "@@ -1,2 +1,2 @@");
        assert_eq!(hunks[0].body, "@@ -1,2 +1,2 @@\n-old\n+new\n ctx");

        assert_eq!(hunks[1].hunk_index, 1);
        assert_eq!((hunks[1].old_start, hunks[1].old_lines), (20, 1));
        assert_eq!((hunks[1].new_start, hunks[1].new_lines), (20, 2));
        assert_eq!(hunks[1].body, "@@ -20 +20,2 @@ func F() {\n+added");
        assert!(hunks.iter().all(|h| h.path == "x.go"));
    }

    #[test]
    fn malformed_header_opens_a_zeroed_hunk() {
        let hunks = parse_hunks("y.go", "@@ bogus @@\n+x\n@@ -3,1 +3,1 @@\n-a\n+b\n");
        assert_eq!(hunks.len(), 2);
        assert_eq!(
            (hunks[0].old_start, hunks[0].old_lines, hunks[0].new_start, hunks[0].new_lines),
            (0, 0, 0, 0)
        );
        assert_eq!(hunks[0].body, "@@ bogus @@\n+x");
        assert_eq!(hunks[1].old_start, 3);
    }

    #[test]
    fn no_headers_means_no_hunks() {
        assert!(parse_hunks("bin.dat", "Binary files a/bin.dat and b/bin.dat differ\n").is_empty());
        assert!(parse_hunks("empty.go", "").is_empty());
    }
}
