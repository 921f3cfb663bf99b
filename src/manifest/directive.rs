//! Line classification for plain manifests.
use std::fmt;

/// Prefix of a line naming further manifests.
pub const INCLUDE_PREFIX: &str = "include: ";
/// Prefix of a line naming AUR packages.
pub const AUR_PREFIX: &str = "aur: ";
/// Prefix of a comment line.
pub const COMMENT_PREFIX: &str = "#";

/// One classified, non-blank manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `# text`: logged, otherwise ignored.
    Comment(String),
    /// `include: a b`: manifests to process at this point.
    Include(Vec<String>),
    /// `aur: pkg...`: packages for the AUR helper.
    AurPackages(Vec<String>),
    /// Any other line: packages for the system package manager.
    Packages(Vec<String>),
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

impl Directive {
    /// Classify a trimmed, non-blank line.
    ///
    /// Precedence is include, aur, comment, packages, so `aur: #foo` is an
    /// AUR line and `#include: x` is a comment. Classification cannot fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkg_install::manifest::Directive;
    ///
    /// assert_eq!(
    ///     Directive::classify("aur: yay-bin"),
    ///     Directive::AurPackages(vec!["yay-bin".to_string()])
    /// );
    /// ```
    #[must_use]
    pub fn classify(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix(INCLUDE_PREFIX) {
            Self::Include(words(rest))
        } else if let Some(rest) = line.strip_prefix(AUR_PREFIX) {
            Self::AurPackages(words(rest))
        } else if let Some(rest) = line.strip_prefix(COMMENT_PREFIX) {
            Self::Comment(rest.trim().to_string())
        } else {
            Self::Packages(words(line))
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(text) => write!(f, "comment: {text}"),
            Self::Include(names) => write!(f, "include: {}", names.join(" ")),
            Self::AurPackages(names) => write!(f, "aur: {}", names.join(" ")),
            Self::Packages(names) => write!(f, "packages: {}", names.join(" ")),
        }
    }
}

/// Parse manifest content into directives, top to bottom.
///
/// Lines are trimmed and blank lines dropped.
pub fn parse(content: &str) -> impl Iterator<Item = Directive> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Directive::classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn include_splits_names() {
        assert_eq!(
            Directive::classify("include: base  desktop"),
            Directive::Include(strings(&["base", "desktop"]))
        );
    }

    #[test]
    fn include_without_space_is_a_package_line() {
        assert_eq!(
            Directive::classify("include:base"),
            Directive::Packages(strings(&["include:base"]))
        );
    }

    #[test]
    fn aur_beats_comment() {
        assert_eq!(
            Directive::classify("aur: #odd"),
            Directive::AurPackages(strings(&["#odd"]))
        );
    }

    #[test]
    fn comment_keeps_trimmed_text() {
        assert_eq!(
            Directive::classify("#   editors  "),
            Directive::Comment("editors".to_string())
        );
        assert_eq!(
            Directive::classify("#include: base"),
            Directive::Comment("include: base".to_string())
        );
    }

    #[test]
    fn plain_line_splits_on_any_whitespace() {
        assert_eq!(
            Directive::classify("git\tvim  neovim"),
            Directive::Packages(strings(&["git", "vim", "neovim"]))
        );
    }

    #[test]
    fn empty_aur_list_is_allowed() {
        assert_eq!(Directive::classify("aur: "), Directive::AurPackages(vec![]));
    }

    #[test]
    fn parse_drops_blank_lines_and_trims() {
        let content = "\n  # base system\n\ninclude: core\n   git vim  \naur: yay\n\n";
        let rendered: Vec<String> = parse(content).map(|d| d.to_string()).collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        comment: base system
        include: core
        packages: git vim
        aur: yay
        ");
    }

    #[test]
    fn parse_comment_only_manifest_has_no_packages() {
        let content = "# nothing here\n\n   \n# still nothing\n";
        assert!(
            parse(content).all(|d| matches!(d, Directive::Comment(_))),
            "comment-only manifest should yield only comments"
        );
    }

    #[test]
    fn parse_handles_crlf() {
        let directives: Vec<_> = parse("git\r\naur: yay\r\n").collect();
        assert_eq!(
            directives,
            vec![
                Directive::Packages(strings(&["git"])),
                Directive::AurPackages(strings(&["yay"])),
            ]
        );
    }
}
