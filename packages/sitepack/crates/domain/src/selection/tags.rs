use std::collections::HashMap;

/// Ranked list of tag triples the interpreter can load, most preferred first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTags {
    tags: Vec<String>,
    rank: HashMap<String, usize>,
}

impl CompatibilityTags {
    pub fn new(tags: Vec<String>) -> Self {
        let mut rank = HashMap::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            // A repeated triple keeps its most preferred position.
            rank.entry(tag.clone()).or_insert(i);
        }
        Self { tags, rank }
    }

    /// Parse the newline-delimited tag file format. Blank lines are skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn rank(&self, triple: &str) -> Option<usize> {
        self.rank.get(triple).copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// The interpreter/ABI/platform tag sets encoded in a wheel file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTags<'a> {
    pub interpreters: Vec<&'a str>,
    pub abis: Vec<&'a str>,
    pub platforms: Vec<&'a str>,
}

impl<'a> WheelTags<'a> {
    /// `{dist}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.
    /// Returns `None` when the name has fewer than five `-` separated parts.
    pub fn from_filename(name: &'a str) -> Option<Self> {
        let base = name.strip_suffix(".whl").unwrap_or(name);
        let parts: Vec<&str> = base.split('-').collect();
        if parts.len() < 5 {
            return None;
        }

        let n = parts.len();
        Some(Self {
            interpreters: parts[n - 3].split('.').collect(),
            abis: parts[n - 2].split('.').collect(),
            platforms: parts[n - 1].split('.').collect(),
        })
    }

    /// Every `python-abi-platform` combination the wheel satisfies.
    pub fn triples(&self) -> impl Iterator<Item = String> + '_ {
        self.interpreters.iter().flat_map(move |py| {
            self.abis.iter().flat_map(move |abi| {
                self.platforms
                    .iter()
                    .map(move |plat| format!("{}-{}-{}", py, abi, plat))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_file() {
        let tags = CompatibilityTags::parse(
            "cp311-cp311-manylinux_2_39_x86_64\n\n  cp311-abi3-manylinux_2_39_x86_64  \npy3-none-any\n",
        );
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.rank("cp311-abi3-manylinux_2_39_x86_64"), Some(1));
        assert_eq!(tags.rank("py3-none-any"), Some(2));
        assert_eq!(tags.rank("cp310-cp310-win_amd64"), None);
    }

    #[test]
    fn test_duplicate_tag_keeps_first_rank() {
        let tags = CompatibilityTags::new(vec![
            "py3-none-any".to_string(),
            "cp311-cp311-linux_x86_64".to_string(),
            "py3-none-any".to_string(),
        ]);
        assert_eq!(tags.rank("py3-none-any"), Some(0));
    }

    #[test]
    fn test_compressed_tag_sets_expand() {
        let tags = WheelTags::from_filename("six-1.16.0-py2.py3-none-any.whl").unwrap();
        let triples: Vec<String> = tags.triples().collect();
        assert_eq!(triples, vec!["py2-none-any", "py3-none-any"]);

        let tags = WheelTags::from_filename(
            "numpy-2.1.0-cp311-cp311-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
        )
        .unwrap();
        assert_eq!(tags.triples().count(), 2);
    }

    #[test]
    fn test_build_tag_is_ignored() {
        let tags = WheelTags::from_filename("pkg-1.0-1build-cp311-abi3-linux_x86_64.whl").unwrap();
        assert_eq!(tags.interpreters, vec!["cp311"]);
        assert_eq!(tags.abis, vec!["abi3"]);
    }

    #[test]
    fn test_short_names_have_no_tags() {
        assert!(WheelTags::from_filename("pkg-1.0-py3-none.whl").is_none());
        assert!(WheelTags::from_filename("pkg.tar.gz").is_none());
    }
}
