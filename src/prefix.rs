//! Longest shared directory prefix of a set of member names.

/// Longest `/`-aligned prefix shared by every name.
///
/// Never splits a segment: `abc/x` and `abd/y` share nothing. Empty and
/// `.` segments are ignored, so `dir/` and `./dir/a` share `dir`. The
/// result has no leading or trailing slash, and is empty for no input.
pub fn common_prefix<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names = names.into_iter();
    let Some(first) = names.next() else {
        return String::new();
    };

    let mut shared: Vec<String> = segments(first.as_ref()).map(str::to_owned).collect();
    for name in names {
        let matching = shared
            .iter()
            .zip(segments(name.as_ref()))
            .take_while(|(a, b)| a.as_str() == *b)
            .count();
        shared.truncate(matching);
        if shared.is_empty() {
            break;
        }
    }

    shared.join("/")
}

fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split('/').filter(|s| !s.is_empty() && *s != ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(common_prefix(Vec::<String>::new()), "");
    }

    #[test]
    fn shared_directory() {
        assert_eq!(common_prefix(["a/b/c.txt", "a/b/d.txt"]), "a/b");
        assert_eq!(common_prefix(["dir/", "dir/b.txt"]), "dir");
        assert_eq!(common_prefix(["./dir/", "dir/x"]), "dir");
    }

    #[test]
    fn segment_aligned() {
        assert_eq!(common_prefix(["abc/x", "abd/y"]), "");
        assert_eq!(common_prefix(["src/main.rs", "src2/lib.rs"]), "");
    }

    #[test]
    fn nothing_shared() {
        assert_eq!(common_prefix(["a.txt", "dir/", "dir/b.txt"]), "");
    }

    #[test]
    fn single_name_is_its_own_prefix() {
        assert_eq!(common_prefix(["only/file.txt"]), "only/file.txt");
    }
}
