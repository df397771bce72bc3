use std::{result::Result as StdResult, str::FromStr};

use strum::{Display, EnumString, EnumVariantNames};

/// Length of the abbreviated hash shown next to each commit.
pub const SHORT_HASH_LEN: usize = 8;

/// Determines the hyperlink style used for commit links. Defaults to
/// `LinkStyle::Github`
///
/// # Example
///
/// ```
/// # use doclog::LinkStyle;
/// let style: LinkStyle = "gitlab".parse().unwrap();
/// assert_eq!(style, LinkStyle::Gitlab);
/// ```
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display, EnumVariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum LinkStyle {
    #[default]
    Github,
    Gitlab,
    Stash,
    Cgit,
    Gitweb,
}

impl<'de> serde::de::Deserialize<'de> for LinkStyle {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The first eight characters of a commit hash, or all of it when shorter.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

impl LinkStyle {
    /// Gets a hyperlink url to a commit in the specified format. Without a
    /// repository there is nothing to link to and the short hash is returned.
    ///
    /// # Example
    /// ```
    /// # use doclog::LinkStyle;
    /// let link = LinkStyle::Github;
    /// let commit = link.commit_link("123abc891234567890abcdefabc4567898724", "https://github.com/facebook/fboss");
    ///
    /// assert_eq!("https://github.com/facebook/fboss/commit/123abc891234567890abcdefabc4567898724", commit);
    /// ```
    ///
    /// # Example
    /// Note that for `LinkStyle::Gitweb` the actual repository name has to be
    /// given as part of the parameter string of the URL:
    ///
    /// ```
    /// # use doclog::LinkStyle;
    /// let link = LinkStyle::Gitweb;
    /// let commit = link.commit_link("deadbeef", "http://example.com/gitweb/?p=foo.git");
    ///
    /// assert_eq!("http://example.com/gitweb/?p=foo.git;a=commit;h=deadbeef", commit);
    /// ```
    pub fn commit_link<S: AsRef<str>>(&self, hash: S, repo: S) -> String {
        let hash = hash.as_ref();
        match repo.as_ref().trim_end_matches('/') {
            "" => short_hash(hash).to_owned(),
            link => match *self {
                LinkStyle::Github | LinkStyle::Gitlab => format!("{link}/commit/{hash}"),
                LinkStyle::Stash => format!("{link}/commits/{hash}"),
                LinkStyle::Cgit => format!("{link}/commit/?id={hash}"),
                LinkStyle::Gitweb => format!("{link};a=commit;h={hash}"),
            },
        }
    }
}
