//! Package accumulation.

/// Packages collected over one run, in request order.
///
/// Duplicates are kept: the package managers ignore already-installed
/// targets, and a manifest included twice is processed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    /// Packages for the system package manager.
    pub primary: Vec<String>,
    /// Packages for the AUR helper.
    pub aur: Vec<String>,
}

impl PackageSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            primary: Vec::new(),
            aur: Vec::new(),
        }
    }

    /// Append primary packages.
    pub fn extend_primary(&mut self, names: impl IntoIterator<Item = String>) {
        self.primary.extend(names);
    }

    /// Append AUR packages.
    pub fn extend_aur(&mut self, names: impl IntoIterator<Item = String>) {
        self.aur.extend(names);
    }

    /// Whether both lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.aur.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_accumulate_independently() {
        let mut set = PackageSet::new();
        set.extend_aur(["qux".to_string()]);
        set.extend_primary(["foo", "bar", "baz"].map(String::from));
        assert_eq!(set.primary, ["foo", "bar", "baz"]);
        assert_eq!(set.aur, ["qux"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut set = PackageSet::new();
        set.extend_primary(["git".to_string()]);
        set.extend_primary(["git".to_string()]);
        assert_eq!(set.primary, ["git", "git"]);
    }

    #[test]
    fn new_set_is_empty() {
        assert!(PackageSet::new().is_empty());
        assert!(PackageSet::default().is_empty());
    }
}
