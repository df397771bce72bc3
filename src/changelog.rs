use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;

use crate::{
    config::RawCfg,
    dataset::{ChangelogAssembler, ChangelogDataset},
    error::{Error, Result},
    fmt::{ChangelogFormat, FormatWriter, JsonWriter, MarkdownWriter},
    git::{GitLog, HistoryExtractor, HistoryQuery, DEFAULT_MAX_BUFFER, DEFAULT_TIMEOUT},
    link_style::LinkStyle,
    monthmap::MonthlyGrouper,
    publish::{FsSite, Publisher, Route, Site},
    record::RecordParser,
    DEFAULT_CONFIG_FILE,
};

/// The base struct used to set options and run the changelog pipeline.
#[derive(Debug, Clone)]
pub struct Changelog {
    /// The git working tree to read history from (Defaults to the current
    /// directory)
    pub work_tree: PathBuf,
    /// The documentation directory commits are restricted to, relative to the
    /// working tree (Defaults to `docs`)
    pub docs_dir: PathBuf,
    /// The repository used for the base of commit hyper-links
    pub repo: Option<String>,
    /// The link style to use for commit hyper-links
    pub link_style: LinkStyle,
    /// The site base url the changelog page is mounted under (Defaults to `/`)
    pub base_url: String,
    /// Where data artifacts and the route manifest are written, relative to
    /// the working tree unless absolute
    pub out_dir: PathBuf,
    /// The largest `git log` output kept, in bytes (Defaults to 10 MiB)
    pub max_buffer: usize,
    /// How long `git log` may run (Defaults to 30 seconds)
    pub timeout: Duration,
    parser: RecordParser,
    /// The format rendered pages are written in (Defaults to JSON)
    pub out_format: ChangelogFormat,
}

impl Default for Changelog {
    fn default() -> Self {
        Changelog {
            work_tree: PathBuf::from("."),
            docs_dir: PathBuf::from("docs"),
            repo: None,
            link_style: LinkStyle::Github,
            base_url: "/".to_owned(),
            out_dir: PathBuf::from("build/changelog"),
            max_buffer: DEFAULT_MAX_BUFFER,
            timeout: DEFAULT_TIMEOUT,
            parser: RecordParser::default(),
            out_format: ChangelogFormat::Json,
        }
    }
}

/// The outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct Build {
    pub dataset: ChangelogDataset,
    /// Log lines discarded as malformed
    pub dropped: usize,
    /// Why history was missing or incomplete, if it was
    pub warning: Option<Error>,
}

impl Changelog {
    /// Creates a `Changelog` for the current working directory, reading
    /// `.changelog.toml` from it when present.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use doclog::Changelog;
    /// let changelog = Changelog::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        debug!("Creating default changelog with new()");
        let cwd = env::current_dir().map_err(|_| Error::CurrentDir)?;
        Changelog::with_dir(cwd)
    }

    /// Creates a `Changelog` for the working tree `dir`. A `.changelog.toml`
    /// in `dir` is applied if it exists; otherwise defaults are used.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use doclog::Changelog;
    /// let changelog = Changelog::with_dir("/myproject").unwrap();
    /// ```
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        debug!("Creating changelog with \n\tdir: {:?}", dir.as_ref());
        let changelog = Changelog {
            work_tree: dir.as_ref().to_path_buf(),
            ..Changelog::default()
        };
        let cfg_file = dir.as_ref().join(DEFAULT_CONFIG_FILE);
        if cfg_file.is_file() {
            changelog.try_config_file(&cfg_file)
        } else {
            debug!("No config file at {:?}, using defaults", cfg_file);
            Ok(changelog)
        }
    }

    /// Creates a `Changelog` from a TOML configuration file. The parent
    /// directory of the file is used as the working tree.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use doclog::Changelog;
    /// let changelog = Changelog::from_file("/myproject/changelog.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        debug!("Creating changelog with \n\tfile: {:?}", file.as_ref());
        let cfg_file = if file.as_ref().is_relative() {
            let cwd = env::current_dir().map_err(|_| Error::CurrentDir)?;
            cwd.join(file.as_ref())
        } else {
            file.as_ref().to_path_buf()
        };

        let mut dir = cfg_file.clone();
        dir.pop();
        let changelog = Changelog {
            work_tree: dir,
            ..Changelog::default()
        };
        changelog.try_config_file(&cfg_file)
    }

    fn try_config_file(mut self, cfg_file: &Path) -> Result<Self> {
        debug!("Trying to use config file: {:?}", cfg_file);
        let cfg = RawCfg::from_file(cfg_file)?.changelog;

        self.repo = cfg.repository.filter(|r| !r.is_empty());
        self.link_style = cfg.link_style;
        self.out_format = cfg.output_format;
        if let Some(dir) = cfg.docs_dir {
            self.docs_dir = dir;
        }
        if let Some(base) = cfg.base_url {
            self.base_url = base;
        }
        if let Some(max) = cfg.max_buffer {
            self.max_buffer = max;
        }
        if let Some(secs) = cfg.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(out) = cfg.out_dir {
            self.out_dir = out;
        }

        debug!("Returning changelog:\n{:?}", self);
        Ok(self)
    }

    /// Sets the repository used for the base of commit hyper-links
    ///
    /// **NOTE:** Leave off the trailing `.git`
    pub fn repository<S: Into<String>>(mut self, r: S) -> Changelog {
        self.repo = Some(r.into());
        self
    }

    pub fn link_style(mut self, l: LinkStyle) -> Changelog {
        self.link_style = l;
        self
    }

    /// Sets the `git` working tree (typically your project directory)
    pub fn work_tree<P: AsRef<Path>>(mut self, d: P) -> Changelog {
        self.work_tree = d.as_ref().to_path_buf();
        self
    }

    /// Restricts history to commits touching `d`
    pub fn docs_dir<P: AsRef<Path>>(mut self, d: P) -> Changelog {
        self.docs_dir = d.as_ref().to_path_buf();
        self
    }

    pub fn base_url<S: Into<String>>(mut self, b: S) -> Changelog {
        self.base_url = b.into();
        self
    }

    pub fn out_dir<P: AsRef<Path>>(mut self, d: P) -> Changelog {
        self.out_dir = d.as_ref().to_path_buf();
        self
    }

    pub fn max_buffer(mut self, bytes: usize) -> Changelog {
        self.max_buffer = bytes;
        self
    }

    pub fn timeout(mut self, t: Duration) -> Changelog {
        self.timeout = t;
        self
    }

    /// Sets the field delimiter requested from `git log`. It must be an ASCII
    /// control character other than a line break.
    ///
    /// # Example
    ///
    /// ```
    /// # use doclog::Changelog;
    /// assert!(Changelog::default().delimiter('\x1f').is_ok());
    /// assert!(Changelog::default().delimiter(';').is_err());
    /// ```
    pub fn delimiter(mut self, d: char) -> Result<Changelog> {
        self.parser = RecordParser::new(d)?;
        Ok(self)
    }

    /// The field delimiter between hash, date, subject and body
    pub fn field_delimiter(&self) -> char {
        self.parser.delimiter()
    }

    pub fn output_format(mut self, f: ChangelogFormat) -> Changelog {
        self.out_format = f;
        self
    }

    /// The directory artifacts are published to: `out_dir`, resolved against
    /// the working tree when relative.
    pub fn output_dir(&self) -> PathBuf {
        if self.out_dir.is_relative() {
            self.work_tree.join(&self.out_dir)
        } else {
            self.out_dir.clone()
        }
    }

    /// The `git log` query these options describe.
    pub fn git_log(&self) -> GitLog {
        GitLog {
            work_tree: self.work_tree.clone(),
            delimiter: self.parser.delimiter(),
            max_buffer: self.max_buffer,
            timeout: self.timeout,
        }
    }

    /// Builds the changelog from the working tree's git history. Never fails:
    /// any problem reading history leaves an empty (or partial) dataset and a
    /// warning.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use doclog::Changelog;
    /// let build = Changelog::new().unwrap().build();
    /// println!("{} months", build.dataset.len());
    /// ```
    pub fn build(&self) -> Build { self.build_with(self.git_log()) }

    /// Builds the changelog from any history source.
    ///
    /// # Example
    ///
    /// ```
    /// # use doclog::Changelog;
    /// let build = Changelog::default().build_with("abc\x002024-01-15\x00Fix typo\x00");
    /// assert_eq!(build.dataset.entries()[0].title, "January 2024");
    /// ```
    pub fn build_with<Q: HistoryQuery>(&self, query: Q) -> Build {
        let extraction = HistoryExtractor::new(query, &self.docs_dir).extract();
        let parsed = self.parser.parse(&extraction.raw);
        let dataset = ChangelogAssembler::assemble(MonthlyGrouper::group(parsed.records));

        Build {
            dataset,
            dropped: parsed.dropped,
            warning: extraction.warning,
        }
    }

    /// Builds the changelog and publishes it to `site`.
    pub fn publish<S: Site + ?Sized>(&self, site: &mut S) -> Result<Route> {
        let build = self.build();
        Publisher::new(self.base_url.as_str()).publish(&build.dataset, site)
    }

    /// Builds the changelog and publishes it into [`output_dir`](Self::output_dir),
    /// together with a route manifest.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use doclog::Changelog;
    /// let route = Changelog::new().unwrap().publish_to_dir().unwrap();
    /// assert_eq!(route.path, "/changelog");
    /// ```
    pub fn publish_to_dir(&self) -> Result<Route> {
        let mut site = FsSite::new(self.output_dir());
        let route = self.publish(&mut site)?;
        site.write_manifest()?;
        Ok(route)
    }

    /// Renders `dataset` as a page with a specified `FormatWriter` format
    pub fn write_page_with<W>(&self, writer: &mut W, dataset: &ChangelogDataset) -> Result<()>
    where
        W: FormatWriter,
    {
        writer.write_changelog(self, dataset)
    }

    /// Renders `dataset` into the file at `path` using the configured output
    /// format.
    pub fn write_page<P: AsRef<Path>>(&self, path: P, dataset: &ChangelogDataset) -> Result<()> {
        debug!("Writing changelog page to file: {:?}", path.as_ref());
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        match self.out_format {
            ChangelogFormat::Markdown => {
                self.write_page_with(&mut MarkdownWriter::new(&mut out), dataset)?;
            }
            ChangelogFormat::Json => {
                self.write_page_with(&mut JsonWriter::new(&mut out), dataset)?;
            }
        }
        out.flush().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{fmt::EMPTY_MESSAGE, git::RawLog};

    const LOG: &str = "h1\x00 2024-01-15 \x00 Fix routing bug \x00 \n\
                       h2\x00 2024-01-02 \x00 Update docs \x00 \n\
                       h3\x00 2023-12-20 \x00 Initial commit \x00 \n";

    struct NotARepo;

    impl HistoryQuery for NotARepo {
        fn run(&self, _scope: &Path) -> Result<RawLog> {
            Err(Error::NotARepository(PathBuf::from("/tmp/site")))
        }
    }

    #[test]
    fn builds_from_fixed_history() {
        let build = Changelog::default().build_with(LOG);
        assert!(build.warning.is_none());
        assert_eq!(build.dropped, 0);

        let ids: Vec<_> = build.dataset.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["git-2024-01", "git-2023-12"]);
        assert_eq!(build.dataset.entries()[0].commits.len(), 2);
    }

    #[test]
    fn counts_dropped_lines() {
        let raw = format!("{LOG}h4\x00 2024-02-01\n");
        let build = Changelog::default().build_with(raw);
        assert_eq!(build.dropped, 1);
        assert_eq!(build.dataset.commit_count(), 3);
    }

    #[test]
    fn not_a_repository_gives_empty_page() {
        let changelog = Changelog::default().output_format(ChangelogFormat::Markdown);
        let build = changelog.build_with(NotARepo);
        assert!(build.dataset.is_empty());
        assert!(matches!(build.warning, Some(Error::NotARepository(_))));

        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("changelog.md");
        changelog.write_page(&page, &build.dataset).unwrap();
        assert!(fs::read_to_string(page).unwrap().contains(EMPTY_MESSAGE));
    }

    #[test]
    fn build_is_deterministic() {
        let changelog = Changelog::default();
        let a = serde_json::to_string(&changelog.build_with(LOG).dataset).unwrap();
        let b = serde_json::to_string(&changelog.build_with(LOG).dataset).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn publish_outside_repository_still_writes_route() {
        let dir = tempfile::tempdir().unwrap();
        let changelog = Changelog::default()
            .work_tree(dir.path())
            .out_dir(dir.path().join("out"))
            .base_url("/docs");
        let route = changelog.publish_to_dir().unwrap();

        assert_eq!(route.path, "/docs/changelog");
        assert_eq!(fs::read_to_string(&route.data).unwrap(), "[]");
        assert!(dir.path().join("out").join("routes.json").is_file());
    }

    #[test]
    fn config_file_in_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[changelog]\nrepository = \"https://github.com/facebook/fboss\"\n\
             docs-dir = \"fboss-docs\"\nbase-url = \"/site/\"\ntimeout-secs = 3\n\
             out-dir = \"public\"\noutput-format = \"markdown\"\n",
        )
        .unwrap();

        let changelog = Changelog::with_dir(dir.path()).unwrap();
        assert_eq!(changelog.repo.as_deref(), Some("https://github.com/facebook/fboss"));
        assert_eq!(changelog.docs_dir, PathBuf::from("fboss-docs"));
        assert_eq!(changelog.base_url, "/site/");
        assert_eq!(changelog.timeout, Duration::from_secs(3));
        assert_eq!(changelog.out_dir, PathBuf::from("public"));
        assert_eq!(changelog.output_dir(), dir.path().join("public"));
        assert_eq!(changelog.out_format, ChangelogFormat::Markdown);
        assert_eq!(changelog.max_buffer, DEFAULT_MAX_BUFFER);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let changelog = Changelog::with_dir(dir.path()).unwrap();
        assert_eq!(changelog.work_tree, dir.path());
        assert_eq!(changelog.base_url, "/");
        assert!(changelog.repo.is_none());
        assert_eq!(changelog.output_dir(), dir.path().join("build/changelog"));
    }

    #[test]
    fn relative_out_dir_follows_work_tree() {
        let dir = tempfile::tempdir().unwrap();
        let changelog = Changelog::default().work_tree(dir.path()).out_dir("public");
        assert_eq!(changelog.output_dir(), dir.path().join("public"));

        changelog.publish_to_dir().unwrap();
        assert!(dir.path().join("public").join("changelog.json").is_file());
        assert!(dir.path().join("public").join("routes.json").is_file());

        let absolute = changelog.out_dir(dir.path().join("abs"));
        assert_eq!(absolute.output_dir(), dir.path().join("abs"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("doclog.toml");
        fs::write(&cfg, "[changelog]\nlink-style = 3\n").unwrap();
        assert!(matches!(Changelog::from_file(&cfg), Err(Error::ConfigParse(..))));
    }

    #[test]
    fn delimiter_flows_to_git_log() {
        let changelog = Changelog::default().delimiter('\x1f').unwrap();
        assert_eq!(changelog.git_log().format(), "%H%x1f%ad%x1f%s%x1f%b");

        let build = changelog.build_with("h1\x1f2024-03-03\x1fs\x1f\n");
        assert_eq!(build.dataset.commit_count(), 1);
    }

    #[test]
    fn rejected_delimiter_is_an_error() {
        assert!(matches!(
            Changelog::default().delimiter(';'),
            Err(Error::Delimiter(';'))
        ));
        assert!(matches!(
            Changelog::default().delimiter('\n'),
            Err(Error::Delimiter('\n'))
        ));
        assert_eq!(Changelog::default().field_delimiter(), '\0');
    }
}
